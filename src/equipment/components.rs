use std::collections::{BTreeMap, BTreeSet};

use bevy::prelude::*;

/// 穿戴者的装备栏：固定的槽位名 -> 槽内物品
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct Equip {
    pub slots: BTreeMap<String, Option<Entity>>,
}

impl Equip {
    pub fn with_slots<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            slots: names.into_iter().map(|name| (name.into(), None)).collect(),
        }
    }

    pub fn is_valid_slot(&self, slot: &str) -> bool {
        self.slots.contains_key(slot)
    }
}

/// 可装备物品
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct Equipable {
    pub possible_slots: BTreeSet<String>,
    /// 与 `in_slot` 同时为 Some 或同时为 None
    pub wearer: Option<Entity>,
    pub in_slot: Option<String>,
}

impl Equipable {
    pub fn new<S: Into<String>>(slots: impl IntoIterator<Item = S>) -> Self {
        Self {
            possible_slots: slots.into_iter().map(Into::into).collect(),
            wearer: None,
            in_slot: None,
        }
    }

    pub fn is_equipped(&self) -> bool {
        self.wearer.is_some()
    }
}
