use bevy::prelude::*;

/// 花属性点提升主属性；`entity` 为 None 表示玩家
#[derive(Event, Debug, Clone)]
pub struct IncreaseStatistic {
    pub entity: Option<Entity>,
    pub name: String,
}

/// 降低主属性返还属性点
#[derive(Event, Debug, Clone)]
pub struct DecreaseStatistic {
    pub entity: Option<Entity>,
    pub name: String,
}

/// 显示属性事件（用于命令行）
#[derive(Event, Debug, Clone)]
pub struct ShowStats {
    pub entity: Option<Entity>, // None 表示显示玩家属性
    pub as_json: bool,
}
