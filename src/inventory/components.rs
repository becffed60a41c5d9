use bevy::prelude::*;

/// 可被放入容器的物品（挂在物品实体上）
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Containable {
    /// 单个单位占用的体积
    pub bulk: f32,
    /// 单个单位的重量
    pub weight: f32,
    /// 堆叠兼容性 / 按类型查找用的键
    pub item_type: String,
    pub current_stack: u32,
    pub max_stack: u32,
    /// 所在容器；与 `slot` 同时为 Some 或同时为 None
    pub container: Option<Entity>,
    pub slot: Option<usize>,
}

impl Containable {
    pub fn new(item_type: impl Into<String>, bulk: f32, weight: f32) -> Self {
        Self {
            bulk,
            weight,
            item_type: item_type.into(),
            current_stack: 1,
            max_stack: 1,
            container: None,
            slot: None,
        }
    }

    pub fn with_stack(mut self, current: u32, max: u32) -> Self {
        self.max_stack = max.max(1);
        self.current_stack = current.min(self.max_stack);
        self
    }

    pub fn is_stack_full(&self) -> bool {
        self.current_stack >= self.max_stack
    }

    /// 堆叠剩余空间
    pub fn stack_room(&self) -> u32 {
        self.max_stack.saturating_sub(self.current_stack)
    }

    /// 整堆占用的体积
    pub fn stack_bulk(&self) -> f32 {
        self.bulk * self.current_stack as f32
    }
}

/// 容器（背包、箱子等）
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Container {
    pub max_bulk: f32,
    /// 0 表示格子数不限，随内容动态增长
    pub max_slots: usize,
}

impl Container {
    pub fn new(max_bulk: f32, max_slots: usize) -> Self {
        Self { max_bulk, max_slots }
    }

    pub fn is_dynamic(&self) -> bool {
        self.max_slots == 0
    }
}
