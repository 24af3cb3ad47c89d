//! Response DTOs and error classification codes

use chrono::{DateTime, Utc};
use farmstead_domain::{Character, ItemStack, StatusEntry};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Error Codes
// =============================================================================

/// Error classification codes, shared by HTTP bodies and socket `error` frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // === Client Errors (4xx) ===
    /// Request was malformed or invalid
    BadRequest,
    /// Requested resource not found
    NotFound,
    /// Operation conflicts with current state (e.g. duplicate character name)
    Conflict,
    /// Request data failed validation
    ValidationError,
    /// Not enough coins or items for the action
    InsufficientResource,

    // === Server Errors (5xx) ===
    /// One store committed while another did not; needs manual repair
    Inconsistency,
    /// Internal server error
    InternalError,

    /// Unknown variant for forward compatibility
    #[serde(other)]
    Unknown,
}

/// Body of every HTTP error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

// =============================================================================
// Characters
// =============================================================================

/// One row of the caller's character list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterSummary {
    pub character_id: Uuid,
    pub name: String,
    pub level: u32,
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Character> for CharacterSummary {
    fn from(character: &Character) -> Self {
        Self {
            character_id: character.id.to_uuid(),
            name: character.name.to_string(),
            level: character.level,
            is_favorite: character.is_favorite,
            created_at: character.created_at,
        }
    }
}

/// Full character view assembled from the link row and its four documents
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterProfileResponse {
    pub character: Character,
    pub inventory_id: Uuid,
    pub items: Vec<ItemStack>,
    pub wallet_id: Uuid,
    pub coins: u64,
    pub status_log_id: Uuid,
    pub recent_status: Vec<StatusEntry>,
}

// =============================================================================
// Maps & wallets
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapSummary {
    pub map_id: Uuid,
    pub character_id: Uuid,
    pub nickname: String,
    pub max_width: u32,
    pub max_height: u32,
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletResponse {
    pub wallet_id: Uuid,
    pub coins: u64,
}
