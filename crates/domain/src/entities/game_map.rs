//! Game map document - a grid of tiles belonging to one character

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::value_objects::{MapNickname, Tile, TileCoord, TileType};
use crate::{CharacterId, MapId};

/// A character's farm map.
///
/// Tile layout is produced once by [`GameMap::generate`] and afterwards only
/// mutated tile by tile through conditional updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameMap {
    pub id: MapId,
    pub character_id: CharacterId,
    pub nickname: MapNickname,
    pub max_width: u32,
    pub max_height: u32,
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
    pub tiles: BTreeMap<TileCoord, Tile>,
}

impl GameMap {
    /// Build the initial layout.
    ///
    /// The outer ring is leasable grass, the interior dirt with rubble wherever
    /// `rubble` answers true, and the centre tile is water.
    pub fn generate(
        character_id: CharacterId,
        nickname: MapNickname,
        width: u32,
        height: u32,
        now: DateTime<Utc>,
        mut rubble: impl FnMut() -> bool,
    ) -> Self {
        let centre = TileCoord::new(width / 2, height / 2);
        let mut tiles = BTreeMap::new();
        for y in 0..height {
            for x in 0..width {
                let coord = TileCoord::new(x, y);
                let border = x == 0 || y == 0 || x + 1 == width || y + 1 == height;
                let tile = if border {
                    Tile::new(TileType::Grass).leasable()
                } else if coord == centre {
                    Tile::new(TileType::Water)
                } else if rubble() {
                    Tile::new(TileType::Rubble)
                } else {
                    Tile::new(TileType::Dirt)
                };
                tiles.insert(coord, tile);
            }
        }
        Self {
            id: MapId::new(),
            character_id,
            nickname,
            max_width: width,
            max_height: height,
            is_favorite: false,
            created_at: now,
            tiles,
        }
    }

    pub fn contains(&self, coord: TileCoord) -> bool {
        coord.x < self.max_width && coord.y < self.max_height
    }

    pub fn tile(&self, coord: TileCoord) -> Option<&Tile> {
        self.tiles.get(&coord)
    }

    /// Tiles keyed by their `"x,y"` wire key.
    pub fn tiles_by_key(&self) -> BTreeMap<String, Tile> {
        self.tiles
            .iter()
            .map(|(coord, tile)| (coord.key(), tile.clone()))
            .collect()
    }

    /// Current state of the given coordinates, keyed by `"x,y"`. Missing tiles are skipped.
    pub fn tiles_at(&self, coords: &[TileCoord]) -> BTreeMap<String, Tile> {
        coords
            .iter()
            .filter_map(|c| self.tiles.get(c).map(|t| (c.key(), t.clone())))
            .collect()
    }
}
