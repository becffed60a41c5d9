pub mod components;
pub mod equip;
pub mod events;
mod systems;

use crate::core::states::AppState;
use bevy::prelude::*;
use events::*;
use systems::*;

pub struct EquipmentPlugin;
impl Plugin for EquipmentPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<EquipEvent>()
            .add_event::<UnequipEvent>()
            .add_systems(
                Update,
                (equip_item, unequip_item)
                    .chain()
                    .run_if(in_state(AppState::InGame)),
            );
    }
}
