//! Crop types and growing-crop state

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// Crops a farmer can plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropType {
    Carrot,
    Wheat,
    Potato,
    Pumpkin,
}

impl CropType {
    pub const ALL: [CropType; 4] = [
        CropType::Carrot,
        CropType::Wheat,
        CropType::Potato,
        CropType::Pumpkin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CropType::Carrot => "carrot",
            CropType::Wheat => "wheat",
            CropType::Potato => "potato",
            CropType::Pumpkin => "pumpkin",
        }
    }

    /// Time from planting until the crop can be harvested.
    pub fn growth_time(&self) -> Duration {
        match self {
            CropType::Carrot => Duration::seconds(60),
            CropType::Wheat => Duration::seconds(120),
            CropType::Potato => Duration::seconds(180),
            CropType::Pumpkin => Duration::seconds(300),
        }
    }

    /// Inventory item type/name pair for this crop's seeds.
    pub fn seed_item(&self) -> (&'static str, &'static str) {
        ("seed", self.as_str())
    }

    /// Inventory item type/name pair for the harvested produce.
    pub fn produce_item(&self) -> (&'static str, &'static str) {
        ("crop", self.as_str())
    }
}

impl fmt::Display for CropType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CropType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "carrot" => Ok(CropType::Carrot),
            "wheat" => Ok(CropType::Wheat),
            "potato" => Ok(CropType::Potato),
            "pumpkin" => Ok(CropType::Pumpkin),
            other => Err(DomainError::parse(format!("Unknown crop type: {}", other))),
        }
    }
}

/// A crop growing on a tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropState {
    pub crop_type: CropType,
    pub planted_at: DateTime<Utc>,
    pub ready_at: DateTime<Utc>,
}

impl CropState {
    pub fn planted(crop_type: CropType, now: DateTime<Utc>) -> Self {
        Self {
            crop_type,
            planted_at: now,
            ready_at: now + crop_type.growth_time(),
        }
    }

    pub fn is_ready(&self, now: DateTime<Utc>) -> bool {
        self.ready_at <= now
    }
}
