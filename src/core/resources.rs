use std::path::Path;

use anyhow::Context;
use bevy::prelude::*;
use serde::Deserialize;

/// 全局配置（启动时从 TOML 读取一次）
#[derive(Resource, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// 属性点消耗表的中位数
    pub default_stat_value: f32,
    pub min_stat_value: f32,
    pub max_stat_value: f32,
    /// 新角色的初始属性点
    pub starting_stat_points: i32,
    pub backpack_max_bulk: f32,
    /// 0 表示动态格子数
    pub backpack_max_slots: usize,
    pub equip_slots: Vec<String>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            default_stat_value: 50.0,
            min_stat_value: 0.0,
            max_stat_value: 100.0,
            starting_stat_points: 20,
            backpack_max_bulk: 60.0,
            backpack_max_slots: 0,
            equip_slots: ["head", "body", "l_arm", "r_arm", "legs", "feet"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl GameConfig {
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("无法解析配置")
    }

    /// 文件不存在时返回默认配置；存在但无法解析时报错
    pub fn load_or_default(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件 {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("配置文件 {} 格式错误", path.display()))
    }
}
