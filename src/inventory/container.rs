//! 容器引擎：格子分配、堆叠合并、放入 / 取出、体积统计。
//!
//! 所有操作都直接作用于 `World`，一次调用即一个完整的临界区。
//! 会失败的操作先在内存里算出完整方案，检查通过后才写组件，
//! 因此返回 `Err` 时容器状态保持不变。

use std::collections::BTreeSet;

use bevy::prelude::*;
use thiserror::Error;

use super::components::{Containable, Container};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ContainerError {
    #[error("entity {0} is not a container")]
    MissingContainer(Entity),
    #[error("entity {0} is not a containable item")]
    MissingItem(Entity),
    #[error("bulk limit exceeded: {attempted} > {max}")]
    BulkLimit { attempted: f32, max: f32 },
    #[error("no free slot left in container")]
    NoFreeSlot,
    #[error("slot {slot} is outside a container of {max_slots} slots")]
    InvalidSlot { slot: usize, max_slots: usize },
    #[error("cannot merge `{incoming}` into a stack of `{stack}`")]
    TypeMismatch { incoming: String, stack: String },
}

/// 按格子号或按物品类型定位容器里的物品
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKey {
    Slot(usize),
    Type(String),
}

impl From<usize> for ItemKey {
    fn from(slot: usize) -> Self {
        ItemKey::Slot(slot)
    }
}

impl From<&str> for ItemKey {
    fn from(item_type: &str) -> Self {
        ItemKey::Type(item_type.to_string())
    }
}

impl From<String> for ItemKey {
    fn from(item_type: String) -> Self {
        ItemKey::Type(item_type)
    }
}

// --------------------------- 查询 ---------------------------

/// 容器里的所有物品，按格子号排序
fn contents(world: &mut World, container: Entity) -> Vec<(Entity, Containable)> {
    let mut query = world.query::<(Entity, &Containable)>();
    let mut items: Vec<_> = query
        .iter(world)
        .filter(|(_, item)| item.container == Some(container))
        .map(|(entity, item)| (entity, item.clone()))
        .collect();
    items.sort_by_key(|(_, item)| item.slot);
    items
}

fn container_record(world: &World, container: Entity) -> Result<Container, ContainerError> {
    world
        .get::<Container>(container)
        .cloned()
        .ok_or(ContainerError::MissingContainer(container))
}

fn item_record(world: &World, item: Entity) -> Result<Containable, ContainerError> {
    world
        .get::<Containable>(item)
        .cloned()
        .ok_or(ContainerError::MissingItem(item))
}

fn occupied_slots<'a>(items: impl IntoIterator<Item = &'a (Entity, Containable)>) -> BTreeSet<usize> {
    items.into_iter().filter_map(|(_, item)| item.slot).collect()
}

/// 固定容量时候选为 `[0, max_slots)`；
/// 动态容量时候选为 `[0, 最大已用格 + 2)`，始终留出一个空位
fn lowest_free_slot(record: &Container, occupied: &BTreeSet<usize>) -> Result<usize, ContainerError> {
    let candidates = if record.is_dynamic() {
        occupied.last().map_or(1, |highest| highest + 2)
    } else {
        record.max_slots
    };
    (0..candidates)
        .find(|slot| !occupied.contains(slot))
        .ok_or(ContainerError::NoFreeSlot)
}

fn check_bulk(attempted: f32, record: &Container) -> Result<(), ContainerError> {
    if attempted > record.max_bulk {
        return Err(ContainerError::BulkLimit {
            attempted,
            max: record.max_bulk,
        });
    }
    Ok(())
}

/// 容器中的物品，可按类型过滤
pub fn get_items(world: &mut World, container: Entity, item_type: Option<&str>) -> Vec<Entity> {
    contents(world, container)
        .into_iter()
        .filter(|(_, item)| item_type.is_none_or(|t| item.item_type == t))
        .map(|(entity, _)| entity)
        .collect()
}

pub fn get_free_slot(world: &mut World, container: Entity) -> Result<usize, ContainerError> {
    let record = container_record(world, container)?;
    let items = contents(world, container);
    lowest_free_slot(&record, &occupied_slots(&items))
}

pub fn get_total_bulk(world: &mut World, container: Entity) -> f32 {
    contents(world, container)
        .iter()
        .map(|(_, item)| item.stack_bulk())
        .sum()
}

/// 注意：重量按物品记录累加，不乘以堆叠数量
pub fn get_total_weight(world: &mut World, container: Entity) -> f32 {
    contents(world, container)
        .iter()
        .map(|(_, item)| item.weight)
        .sum()
}

pub fn get_item(world: &mut World, container: Entity, key: impl Into<ItemKey>) -> Option<Entity> {
    let key = key.into();
    contents(world, container)
        .into_iter()
        .find(|(_, item)| match &key {
            ItemKey::Slot(slot) => item.slot == Some(*slot),
            ItemKey::Type(item_type) => item.item_type == *item_type,
        })
        .map(|(entity, _)| entity)
}

// --------------------------- 修改 ---------------------------

/// 清除物品的容器引用；动态容器随后把剩余物品从 0 开始重新紧凑编号
fn detach(world: &mut World, container: Entity, item: Entity) {
    if let Some(mut record) = world.get_mut::<Containable>(item) {
        record.container = None;
        record.slot = None;
    }

    let dynamic = world
        .get::<Container>(container)
        .is_some_and(Container::is_dynamic);
    if !dynamic {
        return;
    }
    for (index, (entity, previous)) in contents(world, container).into_iter().enumerate() {
        if previous.slot != Some(index) {
            if let Some(mut record) = world.get_mut::<Containable>(entity) {
                record.slot = Some(index);
            }
        }
    }
}

/// 移出物品，返回是否找到了目标
pub fn remove_item(world: &mut World, container: Entity, key: impl Into<ItemKey>) -> bool {
    take_item(world, container, key).is_some()
}

pub fn take_item(world: &mut World, container: Entity, key: impl Into<ItemKey>) -> Option<Entity> {
    let item = get_item(world, container, key)?;
    detach(world, container, item);
    Some(item)
}

fn add_to_stack(world: &mut World, item: Entity, amount: u32) {
    if let Some(mut record) = world.get_mut::<Containable>(item) {
        record.current_stack += amount;
    }
}

/// 把 `source` 的堆叠尽可能多地转移到 `dest`，返回转移的数量。
///
/// 两者类型必须相同。数量受限于 `dest` 的堆叠上限；`dest` 在容器中时，
/// 还受限于容器剩余体积（按每单位净增体积向下取整）。
/// 被掏空的 `source` 会离开所在容器并被销毁，与 `put_item` 一致。
pub fn merge_stack(world: &mut World, source: Entity, dest: Entity) -> Result<u32, ContainerError> {
    let src = item_record(world, source)?;
    let dst = item_record(world, dest)?;
    if src.item_type != dst.item_type {
        return Err(ContainerError::TypeMismatch {
            incoming: src.item_type,
            stack: dst.item_type,
        });
    }

    let mut amount = src.current_stack.min(dst.stack_room());
    if let Some(container) = dst.container {
        // 同一容器内转移时，source 让出的体积抵掉一部分
        let released = if src.container == Some(container) { src.bulk } else { 0.0 };
        let added = dst.bulk - released;
        if added > 0.0 {
            let record = container_record(world, container)?;
            let free = record.max_bulk - get_total_bulk(world, container);
            let allowed = (free / added).floor().max(0.0) as u32;
            amount = amount.min(allowed);
        }
    }
    if amount == 0 {
        return Ok(0);
    }

    if let Some(mut record) = world.get_mut::<Containable>(source) {
        record.current_stack -= amount;
    }
    add_to_stack(world, dest, amount);
    debug!("合并堆叠 {source} -> {dest}: {amount}");

    if amount == src.current_stack {
        if let Some(prior) = src.container {
            detach(world, prior, source);
        }
        world.despawn(source);
    }
    Ok(amount)
}

/// 放入物品，返回被挤出格子的原物品。
///
/// 顺序：
/// 1. 未指定格子且堆叠未满时，先并入容器内同类型的堆叠；
/// 2. 仍有剩余时确定目标格（指定的格子或最小空格）；
/// 3. 目标格已有同类型未满堆叠则并入，否则挤出原物品；
/// 4. 动态容器在没有挤出物品时，移出旧容器后重新计算空格；
/// 5. 体积超限时返回 `BulkLimit`，不做任何修改；
/// 6. 提交：离开旧容器并写入新的容器 / 格子。
///
/// 整堆都被合并的物品会被销毁。只部分并入目标格时，剩余数量留在原物品上，
/// 物品保持原位。
pub fn put_item(
    world: &mut World,
    container: Entity,
    item: Entity,
    slot: Option<usize>,
) -> Result<Option<Entity>, ContainerError> {
    let record = container_record(world, container)?;
    let incoming = item_record(world, item)?;
    if let Some(slot) = slot {
        if !record.is_dynamic() && slot >= record.max_slots {
            return Err(ContainerError::InvalidSlot {
                slot,
                max_slots: record.max_slots,
            });
        }
    }

    let others: Vec<_> = contents(world, container)
        .into_iter()
        .filter(|(entity, _)| *entity != item)
        .collect();
    let mut total: f32 = others.iter().map(|(_, other)| other.stack_bulk()).sum();
    let mut remaining = incoming.current_stack;
    let mut merges: Vec<(Entity, u32)> = Vec::new();

    if slot.is_none() && !incoming.is_stack_full() {
        for (entity, other) in others.iter().filter(|(_, o)| o.item_type == incoming.item_type) {
            if remaining == 0 {
                break;
            }
            let amount = remaining.min(other.stack_room());
            if amount == 0 {
                continue;
            }
            // 并入的单位按目标堆叠的体积计
            total += other.bulk * amount as f32;
            check_bulk(total, &record)?;
            merges.push((*entity, amount));
            remaining -= amount;
        }
    }

    if remaining == 0 {
        commit_merges(world, item, &merges, 0);
        if let Some(prior) = incoming.container {
            detach(world, prior, item);
        }
        world.despawn(item);
        debug!("物品 {item} 已全部并入容器 {container}");
        return Ok(None);
    }

    let target = match slot {
        Some(slot) => slot,
        None => lowest_free_slot(&record, &occupied_slots(&others))?,
    };

    let mut displaced = None;
    if let Some((occupant, existing)) = others.iter().find(|(_, o)| o.slot == Some(target)) {
        if existing.item_type == incoming.item_type && !existing.is_stack_full() {
            let amount = remaining.min(existing.stack_room());
            total += existing.bulk * amount as f32;
            check_bulk(total, &record)?;
            merges.push((*occupant, amount));
            remaining -= amount;

            commit_merges(world, item, &merges, remaining);
            if remaining == 0 {
                if let Some(prior) = incoming.container {
                    detach(world, prior, item);
                }
                world.despawn(item);
            }
            return Ok(None);
        }
        total -= existing.stack_bulk();
        displaced = Some(*occupant);
    }

    check_bulk(total + incoming.bulk * remaining as f32, &record)?;

    // 以下开始修改状态，所有检查均已通过
    commit_merges(world, item, &merges, remaining);
    if let Some(prior) = incoming.container {
        detach(world, prior, item);
    }

    let target = match displaced {
        Some(occupant) => match world.get_mut::<Containable>(occupant) {
            Some(mut record) => {
                let slot = record.slot.unwrap_or(target);
                record.container = None;
                record.slot = None;
                slot
            }
            None => target,
        },
        None if record.is_dynamic() => {
            let occupied = occupied_slots(&contents(world, container));
            (0..=occupied.len())
                .find(|slot| !occupied.contains(slot))
                .unwrap_or(occupied.len())
        }
        None => target,
    };

    if let Some(mut placed) = world.get_mut::<Containable>(item) {
        placed.container = Some(container);
        placed.slot = Some(target);
    }
    debug!("物品 {item} 放入容器 {container} 的 {target} 号格");
    Ok(displaced)
}

fn commit_merges(world: &mut World, item: Entity, merges: &[(Entity, u32)], remaining: u32) {
    for &(target, amount) in merges {
        add_to_stack(world, target, amount);
    }
    if let Some(mut record) = world.get_mut::<Containable>(item) {
        record.current_stack = remaining;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_container(world: &mut World, max_bulk: f32, max_slots: usize) -> Entity {
        world.spawn(Container::new(max_bulk, max_slots)).id()
    }

    fn spawn_item(world: &mut World, item_type: &str, bulk: f32, stack: u32, max: u32) -> Entity {
        world
            .spawn(Containable::new(item_type, bulk, 1.0).with_stack(stack, max))
            .id()
    }

    fn slot_of(world: &World, item: Entity) -> Option<usize> {
        world.get::<Containable>(item).and_then(|i| i.slot)
    }

    fn stack_of(world: &World, item: Entity) -> u32 {
        world.get::<Containable>(item).map_or(0, |i| i.current_stack)
    }

    #[test]
    fn bulk_limit_rejects_and_leaves_container_untouched() {
        let mut world = World::new();
        let chest = spawn_container(&mut world, 15.0, 0);
        let a = spawn_item(&mut world, "rock", 4.0, 1, 1);
        let b = spawn_item(&mut world, "log", 4.0, 1, 1);
        let c = spawn_item(&mut world, "anvil", 8.0, 1, 1);

        assert_eq!(put_item(&mut world, chest, a, None), Ok(None));
        assert_eq!(slot_of(&world, a), Some(0));
        assert_eq!(put_item(&mut world, chest, b, None), Ok(None));
        assert_eq!(slot_of(&world, b), Some(1));

        let err = put_item(&mut world, chest, c, None).unwrap_err();
        assert_eq!(
            err,
            ContainerError::BulkLimit {
                attempted: 16.0,
                max: 15.0
            }
        );
        assert_eq!(get_items(&mut world, chest, None), vec![a, b]);
        assert_eq!(get_total_bulk(&mut world, chest), 8.0);
        assert_eq!(world.get::<Containable>(c).unwrap().container, None);
    }

    #[test]
    fn fixed_container_runs_out_of_slots() {
        let mut world = World::new();
        let bag = spawn_container(&mut world, 100.0, 3);
        for kind in ["a", "b", "c"] {
            let item = spawn_item(&mut world, kind, 1.0, 1, 1);
            put_item(&mut world, bag, item, None).unwrap();
        }

        assert_eq!(get_free_slot(&mut world, bag), Err(ContainerError::NoFreeSlot));
        let extra = spawn_item(&mut world, "d", 1.0, 1, 1);
        assert_eq!(
            put_item(&mut world, bag, extra, None),
            Err(ContainerError::NoFreeSlot)
        );
    }

    #[test]
    fn dynamic_free_slot_fills_gaps_then_grows() {
        let mut world = World::new();
        let bag = spawn_container(&mut world, 100.0, 0);
        assert_eq!(get_free_slot(&mut world, bag), Ok(0));

        for slot in [0, 1, 3] {
            let mut record = Containable::new("junk", 1.0, 1.0);
            record.container = Some(bag);
            record.slot = Some(slot);
            world.spawn(record);
        }
        assert_eq!(get_free_slot(&mut world, bag), Ok(2));

        let mut record = Containable::new("junk", 1.0, 1.0);
        record.container = Some(bag);
        record.slot = Some(2);
        world.spawn(record);
        assert_eq!(get_free_slot(&mut world, bag), Ok(4));
    }

    #[test]
    fn auto_put_merges_into_existing_stacks_first() {
        let mut world = World::new();
        let bag = spawn_container(&mut world, 100.0, 0);
        let first = spawn_item(&mut world, "potion", 1.0, 3, 5);
        put_item(&mut world, bag, first, None).unwrap();

        let second = spawn_item(&mut world, "potion", 1.0, 4, 5);
        assert_eq!(put_item(&mut world, bag, second, None), Ok(None));

        assert_eq!(stack_of(&world, first), 5);
        assert_eq!(stack_of(&world, second), 2);
        assert_eq!(slot_of(&world, second), Some(1));
        assert_eq!(get_total_bulk(&mut world, bag), 7.0);
    }

    #[test]
    fn fully_absorbed_stack_is_despawned() {
        let mut world = World::new();
        let bag = spawn_container(&mut world, 100.0, 0);
        let first = spawn_item(&mut world, "arrow", 0.1, 10, 50);
        put_item(&mut world, bag, first, None).unwrap();

        let second = spawn_item(&mut world, "arrow", 0.1, 20, 50);
        assert_eq!(put_item(&mut world, bag, second, None), Ok(None));

        assert_eq!(stack_of(&world, first), 30);
        assert!(world.get::<Containable>(second).is_none());
        assert_eq!(get_items(&mut world, bag, Some("arrow")), vec![first]);
    }

    #[test]
    fn merge_over_bulk_limit_fails_without_mutation() {
        let mut world = World::new();
        let bag = spawn_container(&mut world, 5.0, 0);
        let first = spawn_item(&mut world, "ore", 1.0, 4, 10);
        put_item(&mut world, bag, first, None).unwrap();

        let second = spawn_item(&mut world, "ore", 1.0, 3, 10);
        assert_eq!(
            put_item(&mut world, bag, second, None),
            Err(ContainerError::BulkLimit {
                attempted: 7.0,
                max: 5.0
            })
        );
        assert_eq!(stack_of(&world, first), 4);
        assert_eq!(stack_of(&world, second), 3);
    }

    #[test]
    fn merge_stack_is_bounded_by_room_and_bulk() {
        let mut world = World::new();
        let bag = spawn_container(&mut world, 15.0, 0);
        let dest = spawn_item(&mut world, "ore", 4.0, 2, 10);
        put_item(&mut world, bag, dest, None).unwrap();

        // 剩余体积 7，每个 4 => 只能转移 1 个
        let source = spawn_item(&mut world, "ore", 4.0, 5, 10);
        assert_eq!(merge_stack(&mut world, source, dest), Ok(1));
        assert_eq!(stack_of(&world, dest), 3);
        assert_eq!(stack_of(&world, source), 4);
        assert!(get_total_bulk(&mut world, bag) <= 15.0);

        let loose_a = spawn_item(&mut world, "gem", 0.0, 3, 4);
        let loose_b = spawn_item(&mut world, "gem", 0.0, 3, 4);
        assert_eq!(merge_stack(&mut world, loose_a, loose_b), Ok(1));
        assert_eq!(stack_of(&world, loose_b), 4);
    }

    #[test]
    fn merged_units_are_charged_at_the_stack_bulk() {
        let mut world = World::new();
        let bag = spawn_container(&mut world, 10.0, 0);
        let heavy = spawn_item(&mut world, "coin", 3.0, 2, 5);
        put_item(&mut world, bag, heavy, None).unwrap();

        // 三枚并入后按 3.0 计：6 + 9 = 15
        let light = spawn_item(&mut world, "coin", 1.0, 3, 5);
        assert_eq!(
            put_item(&mut world, bag, light, None),
            Err(ContainerError::BulkLimit {
                attempted: 15.0,
                max: 10.0
            })
        );
        assert_eq!(stack_of(&world, heavy), 2);
        assert_eq!(stack_of(&world, light), 3);
        assert_eq!(get_total_bulk(&mut world, bag), 6.0);

        let single = spawn_item(&mut world, "coin", 1.0, 1, 5);
        assert_eq!(put_item(&mut world, bag, single, None), Ok(None));
        assert_eq!(stack_of(&world, heavy), 3);
        assert!(world.get::<Containable>(single).is_none());
        assert_eq!(get_total_bulk(&mut world, bag), 9.0);
    }

    #[test]
    fn explicit_slot_merge_is_charged_at_the_occupant_bulk() {
        let mut world = World::new();
        let bag = spawn_container(&mut world, 10.0, 4);
        let heavy = spawn_item(&mut world, "coin", 3.0, 2, 5);
        put_item(&mut world, bag, heavy, Some(0)).unwrap();

        let light = spawn_item(&mut world, "coin", 1.0, 2, 5);
        assert_eq!(
            put_item(&mut world, bag, light, Some(0)),
            Err(ContainerError::BulkLimit {
                attempted: 12.0,
                max: 10.0
            })
        );
        assert_eq!(stack_of(&world, heavy), 2);
        assert!(get_total_bulk(&mut world, bag) <= 10.0);
    }

    #[test]
    fn merge_stack_inside_one_container_counts_the_bulk_difference() {
        let mut world = World::new();
        let bag = spawn_container(&mut world, 10.0, 0);
        let light = spawn_item(&mut world, "coin", 1.0, 4, 10);
        let heavy = spawn_item(&mut world, "coin", 3.0, 1, 10);
        put_item(&mut world, bag, light, None).unwrap();
        put_item(&mut world, bag, heavy, Some(1)).unwrap();
        assert_eq!(get_total_bulk(&mut world, bag), 7.0);

        // 每单位净增 2，剩余 3 => 只能转移 1 个
        assert_eq!(merge_stack(&mut world, light, heavy), Ok(1));
        assert_eq!(stack_of(&world, light), 3);
        assert_eq!(stack_of(&world, heavy), 2);
        assert_eq!(get_total_bulk(&mut world, bag), 9.0);
    }

    #[test]
    fn merge_stack_rejects_other_types() {
        let mut world = World::new();
        let ore = spawn_item(&mut world, "ore", 1.0, 2, 10);
        let gem = spawn_item(&mut world, "gem", 1.0, 2, 10);
        assert_eq!(
            merge_stack(&mut world, ore, gem),
            Err(ContainerError::TypeMismatch {
                incoming: "ore".into(),
                stack: "gem".into()
            })
        );
        assert_eq!(stack_of(&world, ore), 2);
        assert_eq!(stack_of(&world, gem), 2);
    }

    #[test]
    fn drained_source_frees_its_slot() {
        let mut world = World::new();
        let bag = spawn_container(&mut world, 100.0, 3);
        let source = spawn_item(&mut world, "ore", 1.0, 2, 10);
        let dest = spawn_item(&mut world, "ore", 1.0, 3, 10);
        put_item(&mut world, bag, source, Some(0)).unwrap();
        put_item(&mut world, bag, dest, Some(1)).unwrap();

        assert_eq!(merge_stack(&mut world, source, dest), Ok(2));
        assert_eq!(stack_of(&world, dest), 5);
        assert!(world.get::<Containable>(source).is_none());
        assert_eq!(get_items(&mut world, bag, None), vec![dest]);
        assert_eq!(get_free_slot(&mut world, bag), Ok(0));
    }

    #[test]
    fn explicit_slot_partial_merge_leaves_remainder_in_place() {
        let mut world = World::new();
        let chest = spawn_container(&mut world, 100.0, 0);
        let bag = spawn_container(&mut world, 100.0, 4);
        let existing = spawn_item(&mut world, "ore", 1.0, 3, 5);
        put_item(&mut world, bag, existing, Some(1)).unwrap();
        let incoming = spawn_item(&mut world, "ore", 1.0, 4, 5);
        put_item(&mut world, chest, incoming, None).unwrap();

        assert_eq!(put_item(&mut world, bag, incoming, Some(1)), Ok(None));

        assert_eq!(stack_of(&world, existing), 5);
        assert_eq!(stack_of(&world, incoming), 2);
        let record = world.get::<Containable>(incoming).unwrap();
        assert_eq!(record.container, Some(chest));
        assert_eq!(record.slot, Some(0));
        assert_eq!(get_items(&mut world, bag, None), vec![existing]);
        assert_eq!(get_total_bulk(&mut world, bag), 5.0);
    }

    #[test]
    fn explicit_slot_full_merge_despawns_incoming() {
        let mut world = World::new();
        let chest = spawn_container(&mut world, 100.0, 0);
        let bag = spawn_container(&mut world, 100.0, 4);
        let existing = spawn_item(&mut world, "ore", 1.0, 3, 5);
        put_item(&mut world, bag, existing, Some(1)).unwrap();
        let incoming = spawn_item(&mut world, "ore", 1.0, 2, 5);
        let rope = spawn_item(&mut world, "rope", 1.0, 1, 1);
        put_item(&mut world, chest, incoming, None).unwrap();
        put_item(&mut world, chest, rope, None).unwrap();

        assert_eq!(put_item(&mut world, bag, incoming, Some(1)), Ok(None));

        assert_eq!(stack_of(&world, existing), 5);
        assert!(world.get::<Containable>(incoming).is_none());
        assert_eq!(get_items(&mut world, chest, None), vec![rope]);
        assert_eq!(slot_of(&world, rope), Some(0));
    }

    #[test]
    fn explicit_slot_merge_over_bulk_limit_changes_nothing() {
        let mut world = World::new();
        let bag = spawn_container(&mut world, 5.0, 2);
        let existing = spawn_item(&mut world, "ore", 1.0, 3, 10);
        put_item(&mut world, bag, existing, Some(0)).unwrap();
        let incoming = spawn_item(&mut world, "ore", 1.0, 4, 10);

        assert_eq!(
            put_item(&mut world, bag, incoming, Some(0)),
            Err(ContainerError::BulkLimit {
                attempted: 7.0,
                max: 5.0
            })
        );
        assert_eq!(stack_of(&world, existing), 3);
        assert_eq!(stack_of(&world, incoming), 4);
        assert_eq!(world.get::<Containable>(incoming).unwrap().container, None);
        assert_eq!(get_total_bulk(&mut world, bag), 3.0);
    }

    #[test]
    fn explicit_slot_displaces_occupant() {
        let mut world = World::new();
        let bag = spawn_container(&mut world, 100.0, 4);
        let sword = spawn_item(&mut world, "sword", 3.0, 1, 1);
        put_item(&mut world, bag, sword, Some(2)).unwrap();

        let shield = spawn_item(&mut world, "shield", 5.0, 1, 1);
        assert_eq!(put_item(&mut world, bag, shield, Some(2)), Ok(Some(sword)));

        let sword_record = world.get::<Containable>(sword).unwrap();
        assert_eq!(sword_record.container, None);
        assert_eq!(sword_record.slot, None);
        assert_eq!(slot_of(&world, shield), Some(2));
        assert_eq!(get_total_bulk(&mut world, bag), 5.0);
    }

    #[test]
    fn displacement_checks_bulk_without_the_occupant() {
        let mut world = World::new();
        let bag = spawn_container(&mut world, 10.0, 2);
        let light = spawn_item(&mut world, "feather", 2.0, 1, 1);
        let other = spawn_item(&mut world, "stone", 4.0, 1, 1);
        put_item(&mut world, bag, light, Some(0)).unwrap();
        put_item(&mut world, bag, other, Some(1)).unwrap();

        let heavy = spawn_item(&mut world, "boulder", 6.0, 1, 1);
        assert_eq!(put_item(&mut world, bag, heavy, Some(0)), Ok(Some(light)));

        let huge = spawn_item(&mut world, "statue", 7.0, 1, 1);
        assert_eq!(
            put_item(&mut world, bag, huge, Some(0)),
            Err(ContainerError::BulkLimit {
                attempted: 11.0,
                max: 10.0
            })
        );
        assert_eq!(slot_of(&world, heavy), Some(0));
    }

    #[test]
    fn explicit_slot_outside_fixed_capacity_is_rejected() {
        let mut world = World::new();
        let bag = spawn_container(&mut world, 100.0, 2);
        let item = spawn_item(&mut world, "key", 0.1, 1, 1);
        assert_eq!(
            put_item(&mut world, bag, item, Some(5)),
            Err(ContainerError::InvalidSlot {
                slot: 5,
                max_slots: 2
            })
        );
    }

    #[test]
    fn removing_from_dynamic_container_compacts_slots() {
        let mut world = World::new();
        let bag = spawn_container(&mut world, 100.0, 0);
        let items: Vec<_> = ["a", "b", "c", "d"]
            .into_iter()
            .map(|kind| {
                let item = spawn_item(&mut world, kind, 1.0, 1, 1);
                put_item(&mut world, bag, item, None).unwrap();
                item
            })
            .collect();

        assert!(remove_item(&mut world, bag, 1usize));
        assert_eq!(slot_of(&world, items[1]), None);
        assert_eq!(slot_of(&world, items[0]), Some(0));
        assert_eq!(slot_of(&world, items[2]), Some(1));
        assert_eq!(slot_of(&world, items[3]), Some(2));
        assert!(!remove_item(&mut world, bag, 7usize));
    }

    #[test]
    fn removing_from_fixed_container_keeps_slots() {
        let mut world = World::new();
        let bag = spawn_container(&mut world, 100.0, 5);
        let a = spawn_item(&mut world, "a", 1.0, 1, 1);
        let b = spawn_item(&mut world, "b", 1.0, 1, 1);
        put_item(&mut world, bag, a, Some(0)).unwrap();
        put_item(&mut world, bag, b, Some(3)).unwrap();

        assert_eq!(take_item(&mut world, bag, "a"), Some(a));
        assert_eq!(slot_of(&world, b), Some(3));
    }

    #[test]
    fn take_then_put_restores_slot() {
        let mut world = World::new();
        let bag = spawn_container(&mut world, 50.0, 6);
        let lamp = spawn_item(&mut world, "lamp", 2.5, 1, 1);
        let rope = spawn_item(&mut world, "rope", 1.5, 1, 1);
        put_item(&mut world, bag, lamp, Some(4)).unwrap();
        put_item(&mut world, bag, rope, None).unwrap();
        let bulk_before = get_total_bulk(&mut world, bag);

        let taken = take_item(&mut world, bag, 4usize).unwrap();
        assert_eq!(taken, lamp);
        put_item(&mut world, bag, taken, Some(4)).unwrap();

        assert_eq!(get_item(&mut world, bag, 4usize), Some(lamp));
        assert_eq!(get_total_bulk(&mut world, bag), bulk_before);
    }

    #[test]
    fn moving_between_containers_clears_prior_container() {
        let mut world = World::new();
        let chest = spawn_container(&mut world, 100.0, 0);
        let pack = spawn_container(&mut world, 100.0, 0);
        let a = spawn_item(&mut world, "a", 1.0, 1, 1);
        let b = spawn_item(&mut world, "b", 1.0, 1, 1);
        put_item(&mut world, chest, a, None).unwrap();
        put_item(&mut world, chest, b, None).unwrap();

        put_item(&mut world, pack, a, None).unwrap();

        assert_eq!(get_items(&mut world, chest, None), vec![b]);
        assert_eq!(slot_of(&world, b), Some(0));
        assert_eq!(get_items(&mut world, pack, None), vec![a]);
    }

    #[test]
    fn weight_is_not_scaled_by_stack() {
        let mut world = World::new();
        let bag = spawn_container(&mut world, 100.0, 0);
        let coins = world
            .spawn(Containable::new("coin", 0.0, 0.5).with_stack(10, 100))
            .id();
        let axe = world.spawn(Containable::new("axe", 3.0, 4.0)).id();
        put_item(&mut world, bag, coins, None).unwrap();
        put_item(&mut world, bag, axe, None).unwrap();

        assert_eq!(get_total_weight(&mut world, bag), 4.5);
    }

    #[test]
    fn lookup_by_type_returns_first_by_slot() {
        let mut world = World::new();
        let bag = spawn_container(&mut world, 100.0, 5);
        let late = spawn_item(&mut world, "torch", 1.0, 1, 1);
        let early = spawn_item(&mut world, "torch", 1.0, 1, 1);
        put_item(&mut world, bag, late, Some(3)).unwrap();
        put_item(&mut world, bag, early, Some(1)).unwrap();

        assert_eq!(get_item(&mut world, bag, "torch"), Some(early));
        assert_eq!(get_item(&mut world, bag, "sword"), None);
        assert_eq!(get_items(&mut world, bag, Some("torch")), vec![early, late]);
    }

    #[test]
    fn slots_stay_unique() {
        let mut world = World::new();
        let bag = spawn_container(&mut world, 100.0, 0);
        for kind in ["a", "b", "c", "d", "e"] {
            let item = spawn_item(&mut world, kind, 1.0, 1, 1);
            put_item(&mut world, bag, item, None).unwrap();
        }
        remove_item(&mut world, bag, "c");
        let item = spawn_item(&mut world, "f", 1.0, 1, 1);
        put_item(&mut world, bag, item, None).unwrap();

        let slots: Vec<_> = get_items(&mut world, bag, None)
            .into_iter()
            .filter_map(|e| slot_of(&world, e))
            .collect();
        let unique: BTreeSet<_> = slots.iter().copied().collect();
        assert_eq!(slots.len(), unique.len());
        assert_eq!(slots, vec![0, 1, 2, 3, 4]);
    }
}
