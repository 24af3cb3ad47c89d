//! Value objects - immutable, validated-by-construction types.

mod crop;
mod game_rules;
mod names;
mod tile;
mod tile_ops;

pub use crop::{CropState, CropType};
pub use game_rules::GameRules;
pub use names::{generate_farmer_name, CharacterName, MapNickname};
pub use tile::{Tile, TileCoord, TileProperties, TileType};
pub use tile_ops::{ConditionalTileUpdate, TileAction, TileChange, TilePrecondition};
