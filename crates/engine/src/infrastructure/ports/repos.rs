//! Repository port traits for database access.

use async_trait::async_trait;
use farmstead_domain::*;

use super::error::RepoError;
use super::types::BulkTileResult;

// =============================================================================
// Link Store (relational)
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn get(&self, id: UserId) -> Result<Option<User>, RepoError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
    /// Registration lives elsewhere; used for seeding and tests.
    async fn create(&self, user: &User) -> Result<(), RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CharacterLinkRepo: Send + Sync {
    /// Insert a link row. Zero rows affected is an error.
    async fn insert(&self, link: &CharacterLink) -> Result<(), RepoError>;
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<CharacterLink>, RepoError>;
    async fn get_by_character(
        &self,
        character_id: CharacterId,
    ) -> Result<Option<CharacterLink>, RepoError>;
    async fn get_by_wallet(&self, wallet_id: WalletId) -> Result<Option<CharacterLink>, RepoError>;
    /// Delete the link owned by `user_id` inside a transaction and return it.
    ///
    /// `None` means no row matched; nothing was changed.
    async fn remove_owned(
        &self,
        character_id: CharacterId,
        user_id: UserId,
    ) -> Result<Option<CharacterLink>, RepoError>;
}

// =============================================================================
// Document Store (one port per collection)
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CharacterRepo: Send + Sync {
    async fn get(&self, id: CharacterId) -> Result<Option<Character>, RepoError>;
    async fn get_many(&self, ids: Vec<CharacterId>) -> Result<Vec<Character>, RepoError>;
    async fn insert(&self, character: &Character) -> Result<(), RepoError>;
    /// Returns whether a document was deleted.
    async fn delete(&self, id: CharacterId) -> Result<bool, RepoError>;
    /// Returns whether the document was found.
    async fn set_favorite(&self, id: CharacterId, is_favorite: bool) -> Result<bool, RepoError>;
    /// Clear the favorite flag on every character of `owner_id` except `keep`.
    async fn unset_favorite_except(
        &self,
        owner_id: UserId,
        keep: CharacterId,
    ) -> Result<u64, RepoError>;
    /// Atomically add experience and recompute the level. Returns the updated character.
    async fn add_experience(&self, id: CharacterId, amount: u64) -> Result<Character, RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventoryRepo: Send + Sync {
    async fn get(&self, id: InventoryId) -> Result<Option<Inventory>, RepoError>;
    async fn insert(&self, inventory: &Inventory) -> Result<(), RepoError>;
    async fn delete(&self, id: InventoryId) -> Result<bool, RepoError>;
    /// Increment the matching stack in place, or append a new stack.
    async fn add_item(
        &self,
        id: InventoryId,
        item_type: &str,
        item_name: &str,
        quantity: u32,
    ) -> Result<(), RepoError>;
    /// Conditional decrement guarded by `quantity >= n`. Drained stacks stay at zero.
    async fn deduct_item(
        &self,
        id: InventoryId,
        item_type: &str,
        item_name: &str,
        quantity: u32,
    ) -> Result<(), RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletRepo: Send + Sync {
    async fn get(&self, id: WalletId) -> Result<Option<Wallet>, RepoError>;
    async fn insert(&self, wallet: &Wallet) -> Result<(), RepoError>;
    async fn delete(&self, id: WalletId) -> Result<bool, RepoError>;
    /// Conditional decrement; fails with `InsufficientResource` instead of clamping.
    /// Returns the new balance.
    async fn debit(&self, id: WalletId, cost: u64) -> Result<u64, RepoError>;
    /// Returns the new balance.
    async fn credit(&self, id: WalletId, amount: u64) -> Result<u64, RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatusLogRepo: Send + Sync {
    async fn get(&self, id: StatusLogId) -> Result<Option<StatusLog>, RepoError>;
    async fn insert(&self, log: &StatusLog) -> Result<(), RepoError>;
    async fn delete(&self, id: StatusLogId) -> Result<bool, RepoError>;
    async fn append(&self, id: StatusLogId, entry: &StatusEntry) -> Result<(), RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MapRepo: Send + Sync {
    async fn get(&self, id: MapId) -> Result<Option<GameMap>, RepoError>;
    async fn list_for_character(&self, character_id: CharacterId)
        -> Result<Vec<GameMap>, RepoError>;
    async fn insert(&self, map: &GameMap) -> Result<(), RepoError>;
    /// Returns the number of maps deleted.
    async fn delete_for_character(&self, character_id: CharacterId) -> Result<u64, RepoError>;
    async fn set_favorite(&self, id: MapId, is_favorite: bool) -> Result<bool, RepoError>;
    async fn unset_favorite_except(
        &self,
        character_id: CharacterId,
        keep: MapId,
    ) -> Result<u64, RepoError>;
    async fn rename(&self, id: MapId, nickname: &MapNickname) -> Result<bool, RepoError>;
    /// Apply every update as one unordered bulk write against the map document.
    ///
    /// Each update re-checks its precondition in the write filter, so a tile
    /// that changed since it was scanned is skipped rather than overwritten.
    async fn bulk_update_tiles(
        &self,
        id: MapId,
        updates: Vec<ConditionalTileUpdate>,
    ) -> Result<BulkTileResult, RepoError>;
}
