pub mod components;
pub mod events;
pub mod formula;
pub mod statistics;
pub mod systems;

use crate::core::resources::GameConfig;
use crate::core::states::AppState;
use bevy::prelude::*;
use components::Player;
use events::*;
use statistics::{StatLimits, StatisticRegistry};
use systems::*;

pub struct CharacterPlugin;

impl Plugin for CharacterPlugin {
    fn build(&self, app: &mut App) {
        let limits = app
            .world()
            .get_resource::<GameConfig>()
            .map(StatLimits::from)
            .unwrap_or_default();

        app
            // 属性定义表，数据加载完成后填充
            .insert_resource(StatisticRegistry::new(limits))
            .add_event::<IncreaseStatistic>()
            .add_event::<DecreaseStatistic>()
            .add_event::<ShowStats>()
            // 在游戏开始时生成玩家
            .add_systems(OnEnter(AppState::InGame), spawn_player)
            // 游戏中的系统：先处理加减点，再重算派生属性
            .add_systems(
                Update,
                (
                    handle_increase_statistic,
                    handle_decrease_statistic,
                    step_statistics,
                    show_stats,
                )
                    .chain()
                    .run_if(in_state(AppState::InGame)),
            );
    }
}

/// 玩家实体（独占系统使用）
pub fn player_entity(world: &mut World) -> Option<Entity> {
    world
        .query_filtered::<Entity, With<Player>>()
        .iter(world)
        .next()
}
