//! 属性定义表与属性引擎：主属性 / 派生属性注册、属性点花费表、每帧派生属性重算。

use std::collections::BTreeMap;

use bevy::prelude::*;
use thiserror::Error;

use super::components::CharacterStatistics;
use super::formula::{Formula, FormulaError, FormulaSource};
use crate::core::resources::GameConfig;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatisticError {
    #[error("entity has no statistics component")]
    NoStatisticComponent,
    #[error("no statistic named `{0}`")]
    NoSuchStatistic(String),
    #[error("statistic `{0}` is already registered")]
    AlreadyRegistered(String),
    #[error("formula of `{name}` is invalid: {error}")]
    InvalidFormula {
        name: String,
        #[source]
        error: FormulaError,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryStatistic {
    pub name: String,
    pub view_name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SecondaryStatistic {
    pub name: String,
    pub view_name: String,
    pub description: String,
    formula: Formula,
}

/// 属性点花费表的参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatLimits {
    pub default_value: f32,
    pub min_value: f32,
    pub max_value: f32,
}

impl Default for StatLimits {
    fn default() -> Self {
        Self {
            default_value: 50.0,
            min_value: 0.0,
            max_value: 100.0,
        }
    }
}

impl From<&GameConfig> for StatLimits {
    fn from(config: &GameConfig) -> Self {
        Self {
            default_value: config.default_stat_value,
            min_value: config.min_stat_value,
            max_value: config.max_stat_value,
        }
    }
}

/// 偏离中位数越远，每点花费越高：(偏移上限, 花费)
const COST_TABLE: [(f32, i32); 9] = [
    (22.0, 1),
    (29.0, 2),
    (32.0, 3),
    (35.0, 4),
    (36.0, 5),
    (38.0, 6),
    (39.0, 7),
    (40.0, 8),
    (41.0, 9),
];
const MAX_COST: i32 = 10;

/// `offset` 为调整后的值与中位数之差
pub fn cost_for_offset(offset: f32) -> i32 {
    let offset = offset.abs();
    COST_TABLE
        .iter()
        .find(|(limit, _)| offset < *limit)
        .map_or(MAX_COST, |(_, cost)| *cost)
}

/// 属性定义表（启动时填充，之后只读）
#[derive(Resource, Debug, Clone, Default)]
pub struct StatisticRegistry {
    limits: StatLimits,
    primary: Vec<PrimaryStatistic>,
    secondary: Vec<SecondaryStatistic>,
}

impl StatisticRegistry {
    pub fn new(limits: StatLimits) -> Self {
        Self {
            limits,
            ..default()
        }
    }

    pub fn limits(&self) -> StatLimits {
        self.limits
    }

    pub fn primary_statistics(&self) -> &[PrimaryStatistic] {
        &self.primary
    }

    pub fn secondary_statistics(&self) -> &[SecondaryStatistic] {
        &self.secondary
    }

    pub fn is_primary(&self, name: &str) -> bool {
        self.primary.iter().any(|s| s.name == name)
    }

    pub fn is_secondary(&self, name: &str) -> bool {
        self.secondary.iter().any(|s| s.name == name)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.is_primary(name) || self.is_secondary(name)
    }

    /// 界面显示用名称
    pub fn view_name(&self, name: &str) -> Option<&str> {
        self.primary
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.view_name.as_str())
            .or_else(|| {
                self.secondary
                    .iter()
                    .find(|s| s.name == name)
                    .map(|s| s.view_name.as_str())
            })
    }

    fn ensure_unregistered(&self, name: &str) -> Result<(), StatisticError> {
        if self.is_registered(name) {
            return Err(StatisticError::AlreadyRegistered(name.to_string()));
        }
        Ok(())
    }

    pub fn add_primary_statistic(
        &mut self,
        name: impl Into<String>,
        view_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<(), StatisticError> {
        let name = name.into();
        self.ensure_unregistered(&name)?;
        debug!("注册主属性 {name}");
        self.primary.push(PrimaryStatistic {
            name,
            view_name: view_name.into(),
            description: description.into(),
        });
        Ok(())
    }

    /// 公式在注册时编译并校验：只能引用已注册的主属性
    pub fn add_secondary_statistic(
        &mut self,
        name: impl Into<String>,
        view_name: impl Into<String>,
        description: impl Into<String>,
        formula: impl Into<FormulaSource>,
    ) -> Result<(), StatisticError> {
        let name = name.into();
        self.ensure_unregistered(&name)?;

        let compiled = Formula::compile(&formula.into())
            .and_then(|f| f.validate(|var| self.is_primary(var)).map(|_| f))
            .map_err(|error| StatisticError::InvalidFormula {
                name: name.clone(),
                error,
            })?;

        debug!("注册派生属性 {name}");
        self.secondary.push(SecondaryStatistic {
            name,
            view_name: view_name.into(),
            description: description.into(),
            formula: compiled,
        });
        Ok(())
    }

    /// 已注册但角色没有记录的属性返回 0；未注册的名字报错
    pub fn get_statistic_value(
        &self,
        stats: Option<&CharacterStatistics>,
        name: &str,
    ) -> Result<f32, StatisticError> {
        let stats = stats.ok_or(StatisticError::NoStatisticComponent)?;
        let table = if self.is_primary(name) {
            &stats.primary_stats
        } else if self.is_secondary(name) {
            &stats.secondary_stats
        } else {
            return Err(StatisticError::NoSuchStatistic(name.to_string()));
        };
        Ok(table.get(name).copied().unwrap_or(0.0))
    }

    pub fn get_statistic_points(
        &self,
        stats: Option<&CharacterStatistics>,
    ) -> Result<i32, StatisticError> {
        stats
            .map(|s| s.stat_points)
            .ok_or(StatisticError::NoStatisticComponent)
    }

    pub fn get_statistic_increase_cost(
        &self,
        stats: &CharacterStatistics,
        name: &str,
    ) -> Result<i32, StatisticError> {
        let value = self.get_statistic_value(Some(stats), name)?;
        Ok(cost_for_offset(value + 1.0 - self.limits.default_value))
    }

    pub fn get_statistic_decrease_gain(
        &self,
        stats: &CharacterStatistics,
        name: &str,
    ) -> Result<i32, StatisticError> {
        let value = self.get_statistic_value(Some(stats), name)?;
        Ok(cost_for_offset(value - 1.0 - self.limits.default_value))
    }

    pub fn can_increase_statistic(&self, stats: &CharacterStatistics, name: &str) -> bool {
        if !self.is_primary(name) {
            return false;
        }
        let value = stats.primary_stats.get(name).copied().unwrap_or(0.0);
        value < self.limits.max_value
            && self
                .get_statistic_increase_cost(stats, name)
                .is_ok_and(|cost| stats.stat_points >= cost)
    }

    pub fn can_decrease_statistic(&self, stats: &CharacterStatistics, name: &str) -> bool {
        self.is_primary(name)
            && stats.primary_stats.get(name).copied().unwrap_or(0.0) > self.limits.min_value
    }

    /// 条件不满足时什么也不做，返回 false
    pub fn increase_statistic(&self, stats: &mut CharacterStatistics, name: &str) -> bool {
        if !self.can_increase_statistic(stats, name) {
            return false;
        }
        let Ok(cost) = self.get_statistic_increase_cost(stats, name) else {
            return false;
        };
        stats.stat_points -= cost;
        *stats.primary_stats.entry(name.to_string()).or_default() += 1.0;
        true
    }

    /// 条件不满足时什么也不做，返回 false
    pub fn decrease_statistic(&self, stats: &mut CharacterStatistics, name: &str) -> bool {
        if !self.can_decrease_statistic(stats, name) {
            return false;
        }
        let Ok(gain) = self.get_statistic_decrease_gain(stats, name) else {
            return false;
        };
        stats.stat_points += gain;
        *stats.primary_stats.entry(name.to_string()).or_default() -= 1.0;
        true
    }

    /// 用当前主属性重新计算全部派生属性，旧值整体丢弃
    pub fn recompute(&self, stats: &mut CharacterStatistics) {
        let primary = &stats.primary_stats;
        let secondary: BTreeMap<String, f32> = self
            .secondary
            .iter()
            .map(|stat| {
                let value = stat
                    .formula
                    .evaluate(|var| primary.get(var).copied().unwrap_or(0.0));
                (stat.name.clone(), value)
            })
            .collect();
        stats.secondary_stats = secondary;
    }

    /// 每帧调用一次；`time_delta` 目前的公式模型用不到
    pub fn step<'a>(
        &self,
        _time_delta: f32,
        characters: impl IntoIterator<Item = &'a mut CharacterStatistics>,
    ) {
        for stats in characters {
            self.recompute(stats);
        }
    }
}
