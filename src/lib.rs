pub mod character;
pub mod core;
pub mod data;
pub mod equipment;
pub mod interface;
pub mod inventory;
