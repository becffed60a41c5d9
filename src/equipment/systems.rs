use super::equip::{self, EquipError};
use super::events::*;
use crate::core::events::{drain_events, send_log};
use crate::inventory::{components::Container, container};
use anyhow::Context;
use bevy::prelude::*;

fn display_name(world: &World, entity: Entity) -> String {
    world
        .get::<Name>(entity)
        .map_or_else(|| format!("{entity}"), |name| name.as_str().to_string())
}

/// 换装失败后恢复原状：旧装备回到槽位，新物品回到原来的背包格
fn restore_swap(
    world: &mut World,
    ev: &EquipEvent,
    item: Entity,
    old: Entity,
) -> anyhow::Result<()> {
    equip::take_equipable(world, ev.wearer, &ev.slot).context("无法取下新装备")?;
    equip::equip(world, ev.wearer, old, &ev.slot).context("无法重新装备原物品")?;
    // 动态背包取出时已重新编号，只有固定格子的背包能回到原格
    let fixed = world
        .get::<Container>(ev.wearer)
        .is_some_and(|c| !c.is_dynamic());
    container::put_item(world, ev.wearer, item, fixed.then_some(ev.index))
        .context("无法把物品放回背包")?;
    Ok(())
}

/// 从背包取出物品装备上，替换下来的旧装备放回背包
pub fn equip_item(world: &mut World) {
    for ev in drain_events::<EquipEvent>(world) {
        let Some(item) = container::get_item(world, ev.wearer, ev.index) else {
            send_log(world, "该背包格为空");
            continue;
        };
        let name = display_name(world, item);

        let displaced = match equip::equip(world, ev.wearer, item, &ev.slot) {
            Ok(displaced) => displaced,
            Err(err) => {
                send_log(world, format!("无法装备 {name}：{err}"));
                continue;
            }
        };
        container::take_item(world, ev.wearer, ev.index);

        if let Some(old) = displaced {
            if let Err(err) = container::put_item(world, ev.wearer, old, None) {
                // 旧装备放不回背包：恢复原状
                warn!("装备 {name} 失败: {err}");
                match restore_swap(world, &ev, item, old) {
                    Ok(()) => send_log(world, "背包已满，无法卸下原装备"),
                    Err(err) => {
                        warn!("恢复装备失败: {err:#}");
                        send_log(world, format!("恢复装备失败：{err:#}"));
                    }
                }
                continue;
            }
        }
        send_log(world, format!("已装备 {}: {name}", ev.slot));
    }
}

/// 卸下装备放回背包
pub fn unequip_item(world: &mut World) {
    for ev in drain_events::<UnequipEvent>(world) {
        let item = match equip::take_equipable(world, ev.wearer, &ev.slot) {
            Ok(Some(item)) => item,
            Ok(None) => {
                send_log(world, format!("{} 槽位为空", ev.slot));
                continue;
            }
            Err(err @ EquipError::SlotInvalid(_)) => {
                send_log(world, format!("未知装备槽: {err}"));
                continue;
            }
            Err(err) => {
                send_log(world, format!("无法卸下：{err}"));
                continue;
            }
        };
        let name = display_name(world, item);

        if let Err(err) = container::put_item(world, ev.wearer, item, None) {
            warn!("卸下 {name} 失败: {err}");
            match equip::equip(world, ev.wearer, item, &ev.slot) {
                Ok(_) => send_log(world, "背包已满，无法卸下装备"),
                Err(err) => {
                    warn!("重新装备 {name} 失败: {err}");
                    send_log(world, format!("无法重新装备 {name}：{err}"));
                }
            }
            continue;
        }
        send_log(world, format!("已卸下 {}: {name}", ev.slot));
    }
}
