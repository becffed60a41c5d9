pub mod loader;
pub mod schema;

use bevy::prelude::*;
use schema::{ItemEntry, ItemList, StatisticList};
use crate::character::statistics::{StatisticError, StatisticRegistry};
use crate::core::states::AppState;

const ITEMS_PATH: &str = "data/core.items.ron";
const STATISTICS_PATH: &str = "data/core.stats.ron";

// --------------------------- 资源 ---------------------------
#[derive(Resource, Default)]
pub struct ItemAssets {
    handle: Option<Handle<ItemList>>,
}

impl ItemAssets {
    /// 按 id（忽略大小写）查找物品模板
    pub fn find(&self, lists: &Assets<ItemList>, id: &str) -> Option<ItemEntry> {
        self.list(lists)?
            .items
            .iter()
            .find(|e| e.id.eq_ignore_ascii_case(id))
            .cloned()
    }

    pub fn list<'a>(&self, lists: &'a Assets<ItemList>) -> Option<&'a ItemList> {
        self.handle.as_ref().and_then(|h| lists.get(h))
    }
}

#[derive(Resource, Default)]
pub struct StatisticAssets {
    handle: Option<Handle<StatisticList>>,
}

// --------------------------- 插件 ---------------------------
pub struct DataPlugin;
impl Plugin for DataPlugin {
    fn build(&self, app: &mut App) {
        app
            // 注册资产类型 & Loader
            .init_asset::<ItemList>()
            .init_asset::<StatisticList>()
            .register_asset_loader(loader::RonItemLoader::new(loader::ITEM_EXTENSIONS))
            .register_asset_loader(loader::RonStatisticLoader::new(
                loader::STATISTIC_EXTENSIONS,
            ))
            // 注册资源
            .init_resource::<ItemAssets>()
            .init_resource::<StatisticAssets>()
            // Loading 流程
            .add_systems(OnEnter(AppState::Loading), start_loading)
            .add_systems(
                Update,
                check_loaded.run_if(in_state(AppState::Loading)),
            );
    }
}

/// 把属性定义表登记进注册表；出错的条目跳过并返回错误
pub fn register_statistics(
    registry: &mut StatisticRegistry,
    list: &StatisticList,
) -> Vec<StatisticError> {
    let mut errors = Vec::new();
    for entry in &list.primary {
        if let Err(err) =
            registry.add_primary_statistic(&entry.name, &entry.view_name, &entry.description)
        {
            errors.push(err);
        }
    }
    // 派生属性只能引用主属性，所以放在主属性之后
    for entry in &list.secondary {
        if let Err(err) = registry.add_secondary_statistic(
            &entry.name,
            &entry.view_name,
            &entry.description,
            entry.formula.clone(),
        ) {
            errors.push(err);
        }
    }
    errors
}

// --------------------------- 系统 ---------------------------
fn start_loading(
    mut item_assets: ResMut<ItemAssets>,
    mut statistic_assets: ResMut<StatisticAssets>,
    asset_server: Res<AssetServer>,
) {
    item_assets.handle = Some(asset_server.load(ITEMS_PATH));
    statistic_assets.handle = Some(asset_server.load(STATISTICS_PATH));
}

fn check_loaded(
    mut next: ResMut<NextState<AppState>>,
    item_assets: Res<ItemAssets>,
    statistic_assets: Res<StatisticAssets>,
    item_lists: Res<Assets<ItemList>>,
    statistic_lists: Res<Assets<StatisticList>>,
    mut registry: ResMut<StatisticRegistry>,
) {
    let Some(items) = item_assets.list(&item_lists) else {
        return;
    };
    let Some(statistics) = statistic_assets
        .handle
        .as_ref()
        .and_then(|h| statistic_lists.get(h))
    else {
        return;
    };

    for err in register_statistics(&mut registry, statistics) {
        warn!("属性定义被跳过: {err}");
    }
    info!(
        "✔ Items loaded: {}, statistics: {} primary / {} secondary",
        items.items.len(),
        registry.primary_statistics().len(),
        registry.secondary_statistics().len()
    );
    next.set(AppState::InGame);
}
