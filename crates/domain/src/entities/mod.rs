//! Entities - identity-bearing game-state records.

mod character;
mod character_link;
mod game_map;
mod inventory;
mod status_log;
mod user;
mod wallet;

pub use character::{Character, Equipment, EquipmentSlot};
pub use character_link::CharacterLink;
pub use game_map::GameMap;
pub use inventory::{Inventory, ItemStack};
pub use status_log::{StatusEntry, StatusLog, StatusType};
pub use user::User;
pub use wallet::Wallet;
