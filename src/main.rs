use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;

use bevy_rpg::character::CharacterPlugin;
use bevy_rpg::core::{CorePlugin, states::AppState};
use bevy_rpg::data::DataPlugin;
use bevy_rpg::equipment::EquipmentPlugin;
use bevy_rpg::interface::debug_cli::DebugCliPlugin;
use bevy_rpg::inventory::InventoryPlugin;

fn main() {
    App::new()
        // 无窗口，固定 60 帧跑主循环
        .add_plugins(
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
                1.0 / 60.0,
            ))),
        )
        .add_plugins((AssetPlugin::default(), LogPlugin::default(), StatesPlugin))
        // CorePlugin 先注册，后面的插件会读取配置
        .add_plugins(CorePlugin::default())
        .add_plugins((DataPlugin, InventoryPlugin, EquipmentPlugin, CharacterPlugin))
        .add_plugins(DebugCliPlugin)
        .add_systems(Startup, |mut next: ResMut<NextState<AppState>>| {
            next.set(AppState::Loading);
        })
        .run();
}
