//! Socket message types for engine <-> client communication
//!
//! Every frame is a JSON text message of the form `{ "event": <name>, "data": <payload> }`.
//!
//! ## Versioning Policy
//!
//! - New events can be added at the end (forward compatible)
//! - Renaming an event is a breaking change
//! - Unknown client events deserialize to `Unknown`

use std::collections::BTreeMap;

use farmstead_domain::{CropType, Tile, TileAction, TileCoord};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::responses::ErrorCode;

/// Tiles keyed by their `"x,y"` coordinate key.
pub type TileMap = BTreeMap<String, Tile>;

// =============================================================================
// Client Messages (Client → Engine)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Bind this connection to a map and receive its tiles
    #[serde(rename = "client:request_initial_map")]
    RequestInitialMap { map_id: Uuid },

    #[serde(rename = "client:plant_crop")]
    PlantCrop {
        tiles: Vec<TileCoord>,
        crop_type: CropType,
    },

    #[serde(rename = "client:harvest_crop")]
    HarvestCrop { tiles: Vec<TileCoord> },

    #[serde(rename = "client:clear_rubble")]
    ClearRubble { tiles: Vec<TileCoord> },

    #[serde(rename = "client:speed_grow")]
    SpeedGrow { tiles: Vec<TileCoord> },

    #[serde(rename = "client:lease_tile")]
    LeaseTile { tiles: Vec<TileCoord> },

    /// Pay rent on the given tiles, or on every tile of the map when absent
    #[serde(rename = "client:pay_rent")]
    PayRent {
        #[serde(default)]
        tiles: Option<Vec<TileCoord>>,
    },

    #[serde(rename = "requestAllMapData")]
    RequestAllMapData,

    #[serde(rename = "game:start")]
    GameStart,

    /// Unknown event for forward compatibility
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    /// The tile action carried by this message and its coordinate batch.
    ///
    /// `None` for non-action events. A `None` batch means "the whole map".
    pub fn tile_action(&self) -> Option<(TileAction, Option<Vec<TileCoord>>)> {
        match self {
            ClientMessage::PlantCrop { tiles, crop_type } => Some((
                TileAction::PlantCrop {
                    crop_type: *crop_type,
                },
                Some(tiles.clone()),
            )),
            ClientMessage::HarvestCrop { tiles } => {
                Some((TileAction::HarvestCrop, Some(tiles.clone())))
            }
            ClientMessage::ClearRubble { tiles } => {
                Some((TileAction::ClearRubble, Some(tiles.clone())))
            }
            ClientMessage::SpeedGrow { tiles } => Some((TileAction::SpeedGrow, Some(tiles.clone()))),
            ClientMessage::LeaseTile { tiles } => Some((TileAction::LeaseTile, Some(tiles.clone()))),
            ClientMessage::PayRent { tiles } => Some((TileAction::PayRent, tiles.clone())),
            ClientMessage::RequestInitialMap { .. }
            | ClientMessage::RequestAllMapData
            | ClientMessage::GameStart
            | ClientMessage::Unknown => None,
        }
    }
}

// =============================================================================
// Server Messages (Engine → Client)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Sent to the requester only, after binding to a map
    #[serde(rename = "initialMapData")]
    InitialMapData { tiles: TileMap, map_nickname: String },

    #[serde(rename = "allMapData")]
    AllMapData { tiles: TileMap },

    /// Room broadcast with the current state of every tile a batch modified
    #[serde(rename = "tilesUpdated")]
    TilesUpdated { action: String, tiles: TileMap },

    /// Batch summary for the requester
    #[serde(rename = "actionResult")]
    ActionResult {
        action: String,
        updated_tile_count: u64,
        total_cost: u64,
        charged_cost: u64,
    },

    #[serde(rename = "error")]
    Error { code: ErrorCode, message: String },

    #[serde(rename = "game:start-ack")]
    GameStartAck,
}

impl ServerMessage {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            code,
            message: message.into(),
        }
    }
}
