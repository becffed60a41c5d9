use bevy::asset::Asset;
use bevy::reflect::TypePath;
use serde::Deserialize;

use crate::character::formula::FormulaSource;

/// 物品模板（静态表条目）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemEntry {
    pub id: String,
    pub name: String,
    /// 缺省时使用 id 作为堆叠类型
    #[serde(default)]
    pub item_type: Option<String>,
    #[serde(default)]
    pub bulk: f32,
    #[serde(default)]
    pub weight: f32,
    #[serde(default = "one")]
    pub max_stack: u32,
    /// 可装备的槽位，空表示不可装备
    #[serde(default)]
    pub slots: Vec<String>,
}

fn one() -> u32 {
    1
}

impl ItemEntry {
    pub fn item_type(&self) -> &str {
        self.item_type.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Asset, TypePath, Deserialize, Debug)]
pub struct ItemList {
    pub items: Vec<ItemEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrimaryEntry {
    pub name: String,
    pub view_name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecondaryEntry {
    pub name: String,
    pub view_name: String,
    #[serde(default)]
    pub description: String,
    pub formula: FormulaSource,
}

/// 属性定义表
#[derive(Asset, TypePath, Deserialize, Debug)]
pub struct StatisticList {
    #[serde(default)]
    pub primary: Vec<PrimaryEntry>,
    #[serde(default)]
    pub secondary: Vec<SecondaryEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::asset::ron;

    #[test]
    fn item_entry_defaults() {
        let list: ItemList = ron::de::from_str(
            r#"(items: [
                (id: "potion", name: "Potion", bulk: 1.0, max_stack: 5),
                (id: "helm", name: "Helm", item_type: Some("armor"), slots: ["head"]),
            ])"#,
        )
        .unwrap();

        assert_eq!(list.items[0].item_type(), "potion");
        assert_eq!(list.items[0].max_stack, 5);
        assert_eq!(list.items[1].item_type(), "armor");
        assert_eq!(list.items[1].max_stack, 1);
        assert_eq!(list.items[1].slots, vec!["head"]);
    }

    #[test]
    fn statistic_list_accepts_weights_and_expressions() {
        let list: StatisticList = ron::de::from_str(
            r#"(
                primary: [(name: "ST", view_name: "Strength")],
                secondary: [
                    (name: "LC", view_name: "Lift", formula: {"ST": 0.7}),
                    (name: "HP", view_name: "Health", formula: "ST * 2 + 10"),
                ],
            )"#,
        )
        .unwrap();

        assert_eq!(list.primary.len(), 1);
        assert!(matches!(list.secondary[0].formula, FormulaSource::Weights(_)));
        assert!(matches!(list.secondary[1].formula, FormulaSource::Expression(_)));
    }
}
