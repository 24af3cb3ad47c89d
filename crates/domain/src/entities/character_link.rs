//! Character link - ownership row tying a user to a character's documents

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CharacterId, CharacterLinkId, InventoryId, StatusLogId, UserId, WalletId};

/// One row per character in the link store.
///
/// A link exists iff the character, inventory, wallet and status-log documents
/// it references all exist and belong to `character_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterLink {
    pub id: CharacterLinkId,
    pub user_id: UserId,
    pub character_id: CharacterId,
    pub inventory_id: InventoryId,
    pub wallet_id: WalletId,
    pub status_log_id: StatusLogId,
    pub created_at: DateTime<Utc>,
}

impl CharacterLink {
    pub fn new(
        user_id: UserId,
        character_id: CharacterId,
        inventory_id: InventoryId,
        wallet_id: WalletId,
        status_log_id: StatusLogId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CharacterLinkId::new(),
            user_id,
            character_id,
            inventory_id,
            wallet_id,
            status_log_id,
            created_at: now,
        }
    }
}
