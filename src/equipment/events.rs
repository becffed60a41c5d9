use bevy::prelude::*;

#[derive(Event, Debug, Clone)]
pub struct EquipEvent {
    pub wearer: Entity,
    pub slot: String,
    /// 背包格子号
    pub index: usize,
}

#[derive(Event, Debug, Clone)]
pub struct UnequipEvent {
    pub wearer: Entity,
    pub slot: String,
}
