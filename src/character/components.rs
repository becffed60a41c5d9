use std::collections::BTreeMap;

use bevy::prelude::*;
use serde::Serialize;

/// 角色属性组件
#[derive(Component, Debug, Clone, Default, PartialEq, Serialize)]
pub struct CharacterStatistics {
    /// 主属性，可直接用属性点调整
    pub primary_stats: BTreeMap<String, f32>,
    /// 派生属性，每帧由公式重新计算，帧与帧之间不作为权威数据
    pub secondary_stats: BTreeMap<String, f32>,
    /// 可用属性点
    pub stat_points: i32,
}

impl CharacterStatistics {
    pub fn new(stat_points: i32) -> Self {
        Self {
            stat_points,
            ..default()
        }
    }

    pub fn with_primary(mut self, name: impl Into<String>, value: f32) -> Self {
        self.primary_stats.insert(name.into(), value);
        self
    }
}

/// 玩家标记组件
#[derive(Component)]
pub struct Player;
