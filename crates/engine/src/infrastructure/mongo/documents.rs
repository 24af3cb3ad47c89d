//! BSON document shapes for each collection and their domain conversions.
//!
//! Ids are stored as uuid strings and timestamps as BSON datetimes, so
//! range filters such as `readyAt <= now` run natively in the store.

use std::collections::BTreeMap;

use bson::DateTime as BsonDateTime;
use chrono::{DateTime, Utc};
use farmstead_domain::{
    Character, CharacterId, CharacterName, CropState, CropType, Equipment, GameMap, Inventory,
    InventoryId, ItemStack, MapId, MapNickname, StatusEntry, StatusLog, StatusLogId, StatusType,
    Tile, TileCoord, TileProperties, TileType, UserId, Wallet, WalletId,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::infrastructure::ports::RepoError;

pub const CHARACTERS: &str = "characters";
pub const INVENTORIES: &str = "inventories";
pub const WALLETS: &str = "wallets";
pub const STATUS_LOGS: &str = "status_logs";
pub const MAPS: &str = "maps";

pub(super) fn bson_time(at: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_chrono(at)
}

fn parse_id(field: &str, value: &str) -> Result<Uuid, RepoError> {
    Uuid::parse_str(value).map_err(|e| RepoError::serialization(format!("{field}: {e}")))
}

fn to_i64(field: &str, value: u64) -> Result<i64, RepoError> {
    i64::try_from(value).map_err(|_| RepoError::serialization(format!("{field} out of range")))
}

fn to_u64(field: &str, value: i64) -> Result<u64, RepoError> {
    u64::try_from(value).map_err(|_| RepoError::serialization(format!("{field} is negative")))
}

// =============================================================================
// Characters
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterDoc {
    #[serde(rename = "_id")]
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub level: i64,
    pub experience: i64,
    #[serde(default)]
    pub skills: BTreeMap<String, i64>,
    #[serde(default)]
    pub equipment: Equipment,
    #[serde(default)]
    pub is_favorite: bool,
    pub created_at: BsonDateTime,
}

impl CharacterDoc {
    pub fn from_domain(c: &Character) -> Result<Self, RepoError> {
        Ok(Self {
            id: c.id.to_string(),
            owner_id: c.owner_id.to_string(),
            name: c.name.to_string(),
            level: i64::from(c.level),
            experience: to_i64("experience", c.experience)?,
            skills: c
                .skills
                .iter()
                .map(|(crop, level)| (crop.as_str().to_string(), i64::from(*level)))
                .collect(),
            equipment: c.equipment.clone(),
            is_favorite: c.is_favorite,
            created_at: bson_time(c.created_at),
        })
    }

    pub fn into_domain(self) -> Result<Character, RepoError> {
        let mut skills = BTreeMap::new();
        for (crop, level) in self.skills {
            let crop: CropType = crop
                .parse()
                .map_err(|e| RepoError::serialization(format!("skills: {e}")))?;
            let level = u32::try_from(level)
                .map_err(|_| RepoError::serialization("skill level out of range"))?;
            skills.insert(crop, level);
        }
        Ok(Character {
            id: CharacterId::from_uuid(parse_id("characters._id", &self.id)?),
            owner_id: UserId::from_uuid(parse_id("characters.ownerId", &self.owner_id)?),
            name: CharacterName::new(self.name)
                .map_err(|e| RepoError::serialization(format!("characters.name: {e}")))?,
            level: u32::try_from(self.level)
                .map_err(|_| RepoError::serialization("characters.level out of range"))?,
            experience: to_u64("characters.experience", self.experience)?,
            skills,
            equipment: self.equipment,
            is_favorite: self.is_favorite,
            created_at: self.created_at.to_chrono(),
        })
    }
}

// =============================================================================
// Inventories
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStackDoc {
    pub item_type: String,
    pub item_name: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryDoc {
    #[serde(rename = "_id")]
    pub id: String,
    pub character_id: String,
    #[serde(default)]
    pub items: Vec<ItemStackDoc>,
}

impl InventoryDoc {
    pub fn from_domain(inv: &Inventory) -> Self {
        Self {
            id: inv.id.to_string(),
            character_id: inv.character_id.to_string(),
            items: inv
                .items()
                .iter()
                .map(|s| ItemStackDoc {
                    item_type: s.item_type.clone(),
                    item_name: s.item_name.clone(),
                    quantity: i64::from(s.quantity),
                })
                .collect(),
        }
    }

    pub fn into_domain(self) -> Result<Inventory, RepoError> {
        let items = self
            .items
            .into_iter()
            .map(|s| {
                let quantity = u32::try_from(s.quantity)
                    .map_err(|_| RepoError::serialization("inventory quantity out of range"))?;
                Ok(ItemStack::new(s.item_type, s.item_name, quantity))
            })
            .collect::<Result<Vec<_>, RepoError>>()?;
        Inventory::from_parts(
            InventoryId::from_uuid(parse_id("inventories._id", &self.id)?),
            CharacterId::from_uuid(parse_id("inventories.characterId", &self.character_id)?),
            items,
        )
        .map_err(|e| RepoError::serialization(e.to_string()))
    }
}

// =============================================================================
// Wallets
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletDoc {
    #[serde(rename = "_id")]
    pub id: String,
    pub character_id: String,
    pub coins: i64,
}

impl WalletDoc {
    pub fn from_domain(w: &Wallet) -> Result<Self, RepoError> {
        Ok(Self {
            id: w.id.to_string(),
            character_id: w.character_id.to_string(),
            coins: to_i64("coins", w.coins)?,
        })
    }

    pub fn into_domain(self) -> Result<Wallet, RepoError> {
        Ok(Wallet {
            id: WalletId::from_uuid(parse_id("wallets._id", &self.id)?),
            character_id: CharacterId::from_uuid(parse_id(
                "wallets.characterId",
                &self.character_id,
            )?),
            coins: to_u64("wallets.coins", self.coins)?,
        })
    }
}

// =============================================================================
// Status logs
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEntryDoc {
    pub timestamp: BsonDateTime,
    pub status_type: StatusType,
    pub details: String,
}

impl From<&StatusEntry> for StatusEntryDoc {
    fn from(e: &StatusEntry) -> Self {
        Self {
            timestamp: bson_time(e.timestamp),
            status_type: e.status_type,
            details: e.details.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusLogDoc {
    #[serde(rename = "_id")]
    pub id: String,
    pub character_id: String,
    #[serde(default)]
    pub entries: Vec<StatusEntryDoc>,
}

impl StatusLogDoc {
    pub fn from_domain(log: &StatusLog) -> Self {
        Self {
            id: log.id.to_string(),
            character_id: log.character_id.to_string(),
            entries: log.entries.iter().map(StatusEntryDoc::from).collect(),
        }
    }

    pub fn into_domain(self) -> Result<StatusLog, RepoError> {
        Ok(StatusLog {
            id: StatusLogId::from_uuid(parse_id("status_logs._id", &self.id)?),
            character_id: CharacterId::from_uuid(parse_id(
                "status_logs.characterId",
                &self.character_id,
            )?),
            entries: self
                .entries
                .into_iter()
                .map(|e| StatusEntry {
                    timestamp: e.timestamp.to_chrono(),
                    status_type: e.status_type,
                    details: e.details,
                })
                .collect(),
        })
    }
}

// =============================================================================
// Maps
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropDoc {
    pub crop_type: CropType,
    pub planted_at: BsonDateTime,
    pub ready_at: BsonDateTime,
}

impl From<&CropState> for CropDoc {
    fn from(c: &CropState) -> Self {
        Self {
            crop_type: c.crop_type,
            planted_at: bson_time(c.planted_at),
            ready_at: bson_time(c.ready_at),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TilePropertiesDoc {
    pub leasable: bool,
    #[serde(default)]
    pub next_rent_due: Option<BsonDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileDoc {
    pub tile_type: TileType,
    #[serde(default)]
    pub crop: Option<CropDoc>,
    #[serde(default)]
    pub properties: TilePropertiesDoc,
}

impl From<&Tile> for TileDoc {
    fn from(t: &Tile) -> Self {
        Self {
            tile_type: t.tile_type,
            crop: t.crop.as_ref().map(CropDoc::from),
            properties: TilePropertiesDoc {
                leasable: t.properties.leasable,
                next_rent_due: t.properties.next_rent_due.map(bson_time),
            },
        }
    }
}

impl From<TileDoc> for Tile {
    fn from(t: TileDoc) -> Self {
        Tile {
            tile_type: t.tile_type,
            crop: t.crop.map(|c| CropState {
                crop_type: c.crop_type,
                planted_at: c.planted_at.to_chrono(),
                ready_at: c.ready_at.to_chrono(),
            }),
            properties: TileProperties {
                leasable: t.properties.leasable,
                next_rent_due: t.properties.next_rent_due.map(|d| d.to_chrono()),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapDoc {
    #[serde(rename = "_id")]
    pub id: String,
    pub character_id: String,
    pub nickname: String,
    pub max_width: i64,
    pub max_height: i64,
    #[serde(default)]
    pub is_favorite: bool,
    pub created_at: BsonDateTime,
    /// Keyed by `"x,y"`.
    #[serde(default)]
    pub tiles: BTreeMap<String, TileDoc>,
}

impl MapDoc {
    pub fn from_domain(map: &GameMap) -> Self {
        Self {
            id: map.id.to_string(),
            character_id: map.character_id.to_string(),
            nickname: map.nickname.to_string(),
            max_width: i64::from(map.max_width),
            max_height: i64::from(map.max_height),
            is_favorite: map.is_favorite,
            created_at: bson_time(map.created_at),
            tiles: map
                .tiles
                .iter()
                .map(|(coord, tile)| (coord.key(), TileDoc::from(tile)))
                .collect(),
        }
    }

    pub fn into_domain(self) -> Result<GameMap, RepoError> {
        let mut tiles = BTreeMap::new();
        for (key, tile) in self.tiles {
            let coord: TileCoord = key
                .parse()
                .map_err(|e| RepoError::serialization(format!("maps.tiles: {e}")))?;
            tiles.insert(coord, Tile::from(tile));
        }
        let dimension = |field: &str, v: i64| {
            u32::try_from(v).map_err(|_| RepoError::serialization(format!("{field} out of range")))
        };
        Ok(GameMap {
            id: MapId::from_uuid(parse_id("maps._id", &self.id)?),
            character_id: CharacterId::from_uuid(parse_id("maps.characterId", &self.character_id)?),
            nickname: MapNickname::new(self.nickname)
                .map_err(|e| RepoError::serialization(format!("maps.nickname: {e}")))?,
            max_width: dimension("maps.maxWidth", self.max_width)?,
            max_height: dimension("maps.maxHeight", self.max_height)?,
            is_favorite: self.is_favorite,
            created_at: self.created_at.to_chrono(),
            tiles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        // Millisecond precision, as stored by BSON.
        Utc.timestamp_millis_opt(1_700_000_000_123).unwrap()
    }

    #[test]
    fn map_document_keys_tiles_by_coordinate() {
        let name = CharacterName::new("Bo").unwrap();
        let map = GameMap::generate(
            CharacterId::new(),
            MapNickname::for_character(&name),
            3,
            3,
            now(),
            || false,
        );
        let doc = MapDoc::from_domain(&map);
        assert!(doc.tiles.contains_key("1,1"));

        let bson_doc = bson::to_document(&doc).unwrap();
        let tiles = bson_doc.get_document("tiles").unwrap();
        let centre = tiles.get_document("1,1").unwrap();
        assert_eq!(centre.get_str("tileType").unwrap(), "water");

        let back: MapDoc = bson::from_document(bson_doc).unwrap();
        assert_eq!(back.into_domain().unwrap(), map);
    }

    #[test]
    fn character_document_keeps_sparse_skills() {
        let mut character =
            Character::new(UserId::new(), CharacterName::new("Bo").unwrap(), now());
        character.skills.insert(CropType::Potato, 3);
        let doc = CharacterDoc::from_domain(&character).unwrap();
        assert_eq!(doc.skills.get("potato"), Some(&3));
        assert_eq!(doc.into_domain().unwrap(), character);
    }

    #[test]
    fn negative_coins_are_rejected() {
        let doc = WalletDoc {
            id: WalletId::new().to_string(),
            character_id: CharacterId::new().to_string(),
            coins: -1,
        };
        assert!(doc.into_domain().is_err());
    }
}
