use super::components::{Containable, Container};
use super::container;
use super::events::*;
use crate::character::player_entity;
use crate::core::events::{drain_events, send_log};
use crate::data::{ItemAssets, schema::{ItemEntry, ItemList}};
use crate::equipment::components::Equipable;
use bevy::prelude::*;

/// 按模板生成一堆物品实体，可装备的模板会带上 `Equipable`
pub fn spawn_item(world: &mut World, entry: &ItemEntry, count: u32) -> Entity {
    let containable = Containable::new(entry.item_type(), entry.bulk, entry.weight)
        .with_stack(count, entry.max_stack);
    let mut item = world.spawn((Name::new(entry.name.clone()), containable));
    if !entry.slots.is_empty() {
        item.insert(Equipable::new(entry.slots.iter().cloned()));
    }
    item.id()
}

fn display_name(world: &World, entity: Entity) -> String {
    world
        .get::<Name>(entity)
        .map_or_else(|| format!("{entity}"), |name| name.as_str().to_string())
}

/// 处理"give"：按模板生成物品并放进玩家背包，超过堆叠上限时拆成多堆
pub fn give_item(world: &mut World) {
    for ev in drain_events::<GiveItemEvent>(world) {
        let entry = world
            .get_resource::<ItemAssets>()
            .zip(world.get_resource::<Assets<ItemList>>())
            .and_then(|(assets, lists)| assets.find(lists, &ev.id));
        let Some(entry) = entry else {
            warn!("不存在物品 ID {}", ev.id);
            send_log(world, format!("不存在物品 ID {}", ev.id));
            continue;
        };
        let Some(player) = player_entity(world) else {
            warn!("没有玩家实体，忽略 give {}", ev.id);
            continue;
        };

        let mut remaining = ev.count;
        while remaining > 0 {
            let count = remaining.min(entry.max_stack.max(1));
            let item = spawn_item(world, &entry, count);
            match container::put_item(world, player, item, None) {
                Ok(_) => remaining -= count,
                Err(err) => {
                    world.despawn(item);
                    send_log(world, format!("背包放不下 {}：{err}", entry.name));
                    break;
                }
            }
        }

        let given = ev.count - remaining;
        if given > 0 {
            info!("获得 {} ×{}", entry.name, given);
            send_log(world, format!("获得 {} ×{}", entry.name, given));
        }
    }
}

pub fn put_item_requests(world: &mut World) {
    for ev in drain_events::<PutItemEvent>(world) {
        let name = display_name(world, ev.item);
        match container::put_item(world, ev.container, ev.item, ev.slot) {
            Ok(Some(displaced)) => {
                let displaced = display_name(world, displaced);
                send_log(world, format!("放入 {name}，挤出了 {displaced}"));
            }
            Ok(None) => send_log(world, format!("放入 {name}")),
            Err(err) => {
                warn!("放入 {name} 失败: {err}");
                send_log(world, format!("无法放入 {name}：{err}"));
            }
        }
    }
}

pub fn take_item_requests(world: &mut World) {
    for ev in drain_events::<TakeItemEvent>(world) {
        match container::take_item(world, ev.container, ev.key.clone()) {
            Some(item) => {
                let name = display_name(world, item);
                send_log(world, format!("取出 {name}"));
            }
            None => send_log(world, format!("容器里没有 {:?}", ev.key)),
        }
    }
}

/// 打印背包内容
pub fn print_inventory(world: &mut World) {
    if drain_events::<ListInventoryEvent>(world).is_empty() {
        return;
    }
    let Some(player) = player_entity(world) else {
        return;
    };

    let mut lines = Vec::new();
    for item in container::get_items(world, player, None) {
        if let Some(record) = world.get::<Containable>(item) {
            lines.push(format!(
                "[{}] {} ×{}/{} (type={}, bulk={})",
                record.slot.unwrap_or_default(),
                display_name(world, item),
                record.current_stack,
                record.max_stack,
                record.item_type,
                record.stack_bulk(),
            ));
        }
    }
    if lines.is_empty() {
        lines.push("  (empty)".to_string());
    }

    let bulk = container::get_total_bulk(world, player);
    let weight = container::get_total_weight(world, player);
    let max_bulk = world.get::<Container>(player).map_or(0.0, |c| c.max_bulk);
    lines.push(format!("体积 {bulk}/{max_bulk}，重量 {weight}"));
    send_log(world, lines.join("\n"));
}
