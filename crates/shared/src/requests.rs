//! HTTP request bodies

use serde::{Deserialize, Serialize};

/// `POST /api/characters`. Without a name one is generated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCharacterRequest {
    #[serde(default)]
    pub character_name: Option<String>,
}

/// `PUT /api/characters/{id}/favorite` and `PUT /api/maps/{id}/favorite`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetFavoriteRequest {
    pub is_favorite: bool,
}

/// `POST /api/characters/{id}/maps`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMapRequest {
    #[serde(default)]
    pub nickname: Option<String>,
}

/// `PUT /api/maps/{id}/nickname`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameMapRequest {
    pub nickname: String,
}

/// `POST /api/wallets/{id}/transactions`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub cost: u64,
}
