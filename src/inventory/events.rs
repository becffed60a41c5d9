use bevy::prelude::*;

use super::container::ItemKey;

/// 按模板 id 生成物品放入玩家背包
#[derive(Event, Debug, Clone)]
pub struct GiveItemEvent {
    pub id: String,
    pub count: u32,
}

/// 拾取 / 放入：把物品放进容器，`slot` 为 None 时自动选格
#[derive(Event, Debug, Clone)]
pub struct PutItemEvent {
    pub container: Entity,
    pub item: Entity,
    pub slot: Option<usize>,
}

/// 丢弃 / 取出
#[derive(Event, Debug, Clone)]
pub struct TakeItemEvent {
    pub container: Entity,
    pub key: ItemKey,
}

#[derive(Event)]
pub struct ListInventoryEvent; // 让 CLI 请求打印背包
