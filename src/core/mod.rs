use bevy::prelude::*;

pub mod events;
pub mod resources;
pub mod states;

/// 核心插件：注册全局资源 / 事件 / 状态
pub struct CorePlugin {
    /// 配置文件路径，不存在时使用默认值
    pub config_path: String,
}

impl Default for CorePlugin {
    fn default() -> Self {
        Self {
            config_path: "config.toml".into(),
        }
    }
}

impl Plugin for CorePlugin {
    fn build(&self, app: &mut App) {
        use states::AppState;

        let config = match resources::GameConfig::load_or_default(&self.config_path) {
            Ok(config) => config,
            Err(err) => {
                warn!("配置读取失败，使用默认值: {err:#}");
                resources::GameConfig::default()
            }
        };

        app.init_state::<AppState>()
            .add_event::<events::LogEvent>()
            .insert_resource(config)
            .add_systems(Update, events::forward_log_event);
    }
}
