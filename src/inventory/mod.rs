pub mod components;
pub mod container;
pub mod events;
mod systems;

use bevy::prelude::*;
use crate::core::states::AppState;
use events::*;
use systems::*;

pub use systems::spawn_item;

pub struct InventoryPlugin;
impl Plugin for InventoryPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<GiveItemEvent>()
            .add_event::<PutItemEvent>()
            .add_event::<TakeItemEvent>()
            .add_event::<ListInventoryEvent>()
            .add_systems(
                Update,
                (give_item, put_item_requests, take_item_requests, print_inventory)
                    .chain()
                    .run_if(in_state(AppState::InGame)),
            );
    }
}
