//! 装备引擎：把物品放进穿戴者的具名槽位，维护双向引用。

use bevy::prelude::*;
use thiserror::Error;

use super::components::{Equip, Equipable};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EquipError {
    #[error("entity {0} has no equipment slots")]
    MissingEquip(Entity),
    #[error("entity {0} is not equipable")]
    MissingEquipable(Entity),
    #[error("item is already equipped, unequip it first")]
    AlreadyEquipped,
    #[error("item cannot be equipped in slot `{0}`")]
    CannotBeEquippedInSlot(String),
    #[error("`{0}` is not a valid equipment slot")]
    SlotInvalid(String),
}

fn occupant(world: &World, wearer: Entity, slot: &str) -> Result<Option<Entity>, EquipError> {
    let record = world
        .get::<Equip>(wearer)
        .ok_or(EquipError::MissingEquip(wearer))?;
    if !record.is_valid_slot(slot) {
        return Err(EquipError::SlotInvalid(slot.to_string()));
    }
    Ok(record.slots.get(slot).copied().flatten())
}

fn clear_back_reference(world: &mut World, item: Entity) {
    if let Some(mut equipable) = world.get_mut::<Equipable>(item) {
        equipable.wearer = None;
        equipable.in_slot = None;
    }
}

/// 装备物品，返回被替换下来的原物品
pub fn equip(
    world: &mut World,
    wearer: Entity,
    item: Entity,
    slot: &str,
) -> Result<Option<Entity>, EquipError> {
    let equipable = world
        .get::<Equipable>(item)
        .ok_or(EquipError::MissingEquipable(item))?;
    if equipable.is_equipped() {
        return Err(EquipError::AlreadyEquipped);
    }
    if !equipable.possible_slots.contains(slot) {
        return Err(EquipError::CannotBeEquippedInSlot(slot.to_string()));
    }
    let previous = occupant(world, wearer, slot)?;

    if let Some(previous) = previous {
        clear_back_reference(world, previous);
    }
    if let Some(mut record) = world.get_mut::<Equip>(wearer) {
        record.slots.insert(slot.to_string(), Some(item));
    }
    if let Some(mut equipable) = world.get_mut::<Equipable>(item) {
        equipable.wearer = Some(wearer);
        equipable.in_slot = Some(slot.to_string());
    }
    debug!("{wearer} 在 {slot} 装备了 {item}");
    Ok(previous)
}

/// 槽位中的物品；没有穿戴者时返回 None
pub fn get_equipable(
    world: &World,
    wearer: Option<Entity>,
    slot: &str,
) -> Result<Option<Entity>, EquipError> {
    match wearer {
        Some(wearer) => occupant(world, wearer, slot),
        None => Ok(None),
    }
}

/// 清空槽位并返回原物品
pub fn take_equipable(
    world: &mut World,
    wearer: Entity,
    slot: &str,
) -> Result<Option<Entity>, EquipError> {
    let Some(item) = occupant(world, wearer, slot)? else {
        return Ok(None);
    };
    if let Some(mut record) = world.get_mut::<Equip>(wearer) {
        record.slots.insert(slot.to_string(), None);
    }
    clear_back_reference(world, item);
    debug!("{wearer} 卸下了 {slot} 的 {item}");
    Ok(Some(item))
}

/// 按物品自身的反向引用卸下装备，返回是否原本已装备
pub fn unequip(world: &mut World, item: Entity) -> Result<bool, EquipError> {
    let equipable = world
        .get::<Equipable>(item)
        .ok_or(EquipError::MissingEquipable(item))?;
    let (Some(wearer), Some(slot)) = (equipable.wearer, equipable.in_slot.clone()) else {
        return Ok(false);
    };
    take_equipable(world, wearer, &slot).map(|taken| taken.is_some())
}
