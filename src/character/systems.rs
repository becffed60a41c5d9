use super::{components::*, events::*, statistics::StatisticRegistry};
use crate::core::events::LogEvent;
use crate::core::resources::GameConfig;
use crate::equipment::components::Equip;
use crate::inventory::components::Container;
use bevy::prelude::*;

/// None 表示玩家
fn resolve_target(entity: Option<Entity>, players: &Query<Entity, With<Player>>) -> Option<Entity> {
    entity.or_else(|| players.single().ok())
}

/// 每帧用主属性重算所有角色的派生属性
pub fn step_statistics(
    time: Res<Time>,
    registry: Res<StatisticRegistry>,
    mut characters: Query<&mut CharacterStatistics>,
) {
    registry.step(
        time.delta_secs(),
        characters.iter_mut().map(Mut::into_inner),
    );
}

/// 处理加点事件
pub fn handle_increase_statistic(
    mut ev_increase: EventReader<IncreaseStatistic>,
    mut ev_log: EventWriter<LogEvent>,
    registry: Res<StatisticRegistry>,
    players: Query<Entity, With<Player>>,
    mut characters: Query<&mut CharacterStatistics>,
) {
    for ev in ev_increase.read() {
        let Some(mut stats) = resolve_target(ev.entity, &players)
            .and_then(|entity| characters.get_mut(entity).ok())
        else {
            ev_log.write(LogEvent("未找到角色属性".to_string()));
            continue;
        };

        let cost = registry.get_statistic_increase_cost(&stats, &ev.name);
        if registry.increase_statistic(&mut stats, &ev.name) {
            ev_log.write(LogEvent(format!(
                "{} +1（消耗 {} 点，剩余 {} 点）",
                ev.name,
                cost.unwrap_or_default(),
                stats.stat_points
            )));
        } else {
            ev_log.write(LogEvent(format!("无法提升 {}", ev.name)));
        }
    }
}

/// 处理减点事件
pub fn handle_decrease_statistic(
    mut ev_decrease: EventReader<DecreaseStatistic>,
    mut ev_log: EventWriter<LogEvent>,
    registry: Res<StatisticRegistry>,
    players: Query<Entity, With<Player>>,
    mut characters: Query<&mut CharacterStatistics>,
) {
    for ev in ev_decrease.read() {
        let Some(mut stats) = resolve_target(ev.entity, &players)
            .and_then(|entity| characters.get_mut(entity).ok())
        else {
            ev_log.write(LogEvent("未找到角色属性".to_string()));
            continue;
        };

        let gain = registry.get_statistic_decrease_gain(&stats, &ev.name);
        if registry.decrease_statistic(&mut stats, &ev.name) {
            ev_log.write(LogEvent(format!(
                "{} -1（返还 {} 点，剩余 {} 点）",
                ev.name,
                gain.unwrap_or_default(),
                stats.stat_points
            )));
        } else {
            ev_log.write(LogEvent(format!("无法降低 {}", ev.name)));
        }
    }
}

/// 显示属性信息
pub fn show_stats(
    mut ev_show_stats: EventReader<ShowStats>,
    mut ev_log: EventWriter<LogEvent>,
    registry: Res<StatisticRegistry>,
    players: Query<Entity, With<Player>>,
    stats_query: Query<&CharacterStatistics>,
) {
    for ev in ev_show_stats.read() {
        let Some(stats) = resolve_target(ev.entity, &players)
            .and_then(|entity| stats_query.get(entity).ok())
        else {
            ev_log.write(LogEvent("未找到角色属性".to_string()));
            continue;
        };

        if ev.as_json {
            match serde_json::to_string_pretty(stats) {
                Ok(json) => ev_log.write(LogEvent(json)),
                Err(err) => ev_log.write(LogEvent(format!("无法序列化属性: {err}"))),
            };
            continue;
        }

        let mut lines = vec!["=== 角色属性 ===".to_string()];
        for stat in registry.primary_statistics() {
            let value = registry
                .get_statistic_value(Some(stats), &stat.name)
                .unwrap_or_default();
            let cost = registry
                .get_statistic_increase_cost(stats, &stat.name)
                .unwrap_or_default();
            lines.push(format!(
                "{:<6} {:<16} {:>6} (+1 需 {} 点)",
                stat.name, stat.view_name, value, cost
            ));
        }
        lines.push("---".to_string());
        for stat in registry.secondary_statistics() {
            let value = registry
                .get_statistic_value(Some(stats), &stat.name)
                .unwrap_or_default();
            lines.push(format!("{:<6} {:<16} {:>6.1}", stat.name, stat.view_name, value));
        }
        lines.push(format!("属性点: {}", stats.stat_points));
        lines.push("================".to_string());
        ev_log.write(LogEvent(lines.join("\n")));
    }
}

/// 初始化玩家实体：属性、背包、装备栏
pub fn spawn_player(
    mut commands: Commands,
    config: Res<GameConfig>,
    registry: Res<StatisticRegistry>,
) {
    let mut stats = CharacterStatistics::new(config.starting_stat_points);
    let default_value = registry.limits().default_value;
    for stat in registry.primary_statistics() {
        stats.primary_stats.insert(stat.name.clone(), default_value);
    }
    registry.recompute(&mut stats);

    commands.spawn((
        Player,
        Name::new("Player"),
        stats,
        Container::new(config.backpack_max_bulk, config.backpack_max_slots),
        Equip::with_slots(config.equip_slots.iter().cloned()),
    ));
}
