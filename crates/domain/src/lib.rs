//! Farmstead Domain - game-state types shared by the engine and the wire protocol.
//!
//! Everything here is pure: no I/O, no clocks, no randomness. Time is passed in
//! as `DateTime<Utc>` and randomness as closures, so the engine can drive the
//! same code with real or fixed sources.

extern crate self as farmstead_domain;

pub mod entities;
pub mod error;
pub mod ids;
pub mod value_objects;

pub use entities::{
    Character, CharacterLink, Equipment, EquipmentSlot, GameMap, Inventory, ItemStack, StatusEntry,
    StatusLog, StatusType, User, Wallet,
};

pub use error::DomainError;

pub use ids::{
    CharacterId, CharacterLinkId, InventoryId, MapId, StatusLogId, UserId, WalletId,
};

pub use value_objects::{
    generate_farmer_name, CharacterName, ConditionalTileUpdate, CropState, CropType, GameRules,
    MapNickname, Tile, TileAction, TileChange, TileCoord, TilePrecondition, TileProperties,
    TileType,
};
