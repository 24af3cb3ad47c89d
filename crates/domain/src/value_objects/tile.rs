//! Map tiles and coordinates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::crop::CropState;
use crate::error::DomainError;

/// A tile position on a map grid.
///
/// Tiles are keyed by `"x,y"` inside a map document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Storage/wire key for this coordinate.
    pub fn key(&self) -> String {
        format!("{},{}", self.x, self.y)
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

impl FromStr for TileCoord {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| DomainError::parse(format!("Invalid tile key: {}", s)))?;
        let x = x
            .trim()
            .parse()
            .map_err(|_| DomainError::parse(format!("Invalid tile x: {}", s)))?;
        let y = y
            .trim()
            .parse()
            .map_err(|_| DomainError::parse(format!("Invalid tile y: {}", s)))?;
        Ok(Self { x, y })
    }
}

/// Ground type of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileType {
    Grass,
    Dirt,
    Rubble,
    Water,
}

impl TileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TileType::Grass => "grass",
            TileType::Dirt => "dirt",
            TileType::Rubble => "rubble",
            TileType::Water => "water",
        }
    }
}

/// Leasing/rent state of a tile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileProperties {
    /// Tile is available to be leased.
    pub leasable: bool,
    /// Set once leased; rent is owed when this passes.
    #[serde(default)]
    pub next_rent_due: Option<DateTime<Utc>>,
}

/// A single map tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tile {
    pub tile_type: TileType,
    #[serde(default)]
    pub crop: Option<CropState>,
    #[serde(default)]
    pub properties: TileProperties,
}

impl Tile {
    pub fn new(tile_type: TileType) -> Self {
        Self {
            tile_type,
            crop: None,
            properties: TileProperties::default(),
        }
    }

    pub fn leasable(mut self) -> Self {
        self.properties.leasable = true;
        self
    }

    pub fn with_crop(mut self, crop: CropState) -> Self {
        self.crop = Some(crop);
        self
    }

    pub fn with_rent_due(mut self, due: DateTime<Utc>) -> Self {
        self.properties.leasable = false;
        self.properties.next_rent_due = Some(due);
        self
    }
}
