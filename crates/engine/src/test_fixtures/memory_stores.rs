//! In-memory store fakes.
//!
//! Each fake applies its conditional writes under one lock, which gives the
//! same per-document atomicity as the real stores.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use farmstead_domain::*;

use crate::infrastructure::ports::{
    BulkTileResult, CharacterLinkRepo, CharacterRepo, InventoryRepo, MapRepo, RepoError,
    StatusLogRepo, UserRepo, WalletRepo,
};
use crate::use_cases::lifecycle::CharacterDocuments;

// =============================================================================
// Link store
// =============================================================================

#[derive(Default)]
pub struct MemoryUserRepo {
    users: Mutex<HashMap<UserId, User>>,
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn get(&self, id: UserId) -> Result<Option<User>, RepoError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create(&self, user: &User) -> Result<(), RepoError> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.username == user.username) {
            return Err(RepoError::constraint("username taken"));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryLinkRepo {
    links: Mutex<Vec<CharacterLink>>,
}

#[async_trait]
impl CharacterLinkRepo for MemoryLinkRepo {
    async fn insert(&self, link: &CharacterLink) -> Result<(), RepoError> {
        let mut links = self.links.lock().unwrap();
        if links.iter().any(|l| l.character_id == link.character_id) {
            return Err(RepoError::constraint("character_id must be unique"));
        }
        links.push(link.clone());
        Ok(())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<CharacterLink>, RepoError> {
        Ok(self
            .links
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_by_character(
        &self,
        character_id: CharacterId,
    ) -> Result<Option<CharacterLink>, RepoError> {
        Ok(self
            .links
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.character_id == character_id)
            .cloned())
    }

    async fn get_by_wallet(&self, wallet_id: WalletId) -> Result<Option<CharacterLink>, RepoError> {
        Ok(self
            .links
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.wallet_id == wallet_id)
            .cloned())
    }

    async fn remove_owned(
        &self,
        character_id: CharacterId,
        user_id: UserId,
    ) -> Result<Option<CharacterLink>, RepoError> {
        let mut links = self.links.lock().unwrap();
        let position = links
            .iter()
            .position(|l| l.character_id == character_id && l.user_id == user_id);
        Ok(position.map(|i| links.remove(i)))
    }
}

// =============================================================================
// Document store
// =============================================================================

#[derive(Default)]
pub struct MemoryCharacterRepo {
    characters: Mutex<HashMap<CharacterId, Character>>,
}

impl MemoryCharacterRepo {
    pub fn favorites_of(&self, owner_id: UserId) -> Vec<CharacterId> {
        self.characters
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.owner_id == owner_id && c.is_favorite)
            .map(|c| c.id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.characters.lock().unwrap().len()
    }
}

#[async_trait]
impl CharacterRepo for MemoryCharacterRepo {
    async fn get(&self, id: CharacterId) -> Result<Option<Character>, RepoError> {
        Ok(self.characters.lock().unwrap().get(&id).cloned())
    }

    async fn get_many(&self, ids: Vec<CharacterId>) -> Result<Vec<Character>, RepoError> {
        let characters = self.characters.lock().unwrap();
        Ok(ids.iter().filter_map(|id| characters.get(id).cloned()).collect())
    }

    async fn insert(&self, character: &Character) -> Result<(), RepoError> {
        self.characters
            .lock()
            .unwrap()
            .insert(character.id, character.clone());
        Ok(())
    }

    async fn delete(&self, id: CharacterId) -> Result<bool, RepoError> {
        Ok(self.characters.lock().unwrap().remove(&id).is_some())
    }

    async fn set_favorite(&self, id: CharacterId, is_favorite: bool) -> Result<bool, RepoError> {
        Ok(match self.characters.lock().unwrap().get_mut(&id) {
            Some(c) => {
                c.is_favorite = is_favorite;
                true
            }
            None => false,
        })
    }

    async fn unset_favorite_except(
        &self,
        owner_id: UserId,
        keep: CharacterId,
    ) -> Result<u64, RepoError> {
        let mut cleared = 0;
        for c in self.characters.lock().unwrap().values_mut() {
            if c.owner_id == owner_id && c.id != keep && c.is_favorite {
                c.is_favorite = false;
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    async fn add_experience(&self, id: CharacterId, amount: u64) -> Result<Character, RepoError> {
        let mut characters = self.characters.lock().unwrap();
        let character = characters
            .get_mut(&id)
            .ok_or_else(|| RepoError::not_found("Character", id))?;
        character.gain_experience(amount);
        Ok(character.clone())
    }
}

#[derive(Default)]
pub struct MemoryInventoryRepo {
    inventories: Mutex<HashMap<InventoryId, Inventory>>,
}

#[async_trait]
impl InventoryRepo for MemoryInventoryRepo {
    async fn get(&self, id: InventoryId) -> Result<Option<Inventory>, RepoError> {
        Ok(self.inventories.lock().unwrap().get(&id).cloned())
    }

    async fn insert(&self, inventory: &Inventory) -> Result<(), RepoError> {
        self.inventories
            .lock()
            .unwrap()
            .insert(inventory.id, inventory.clone());
        Ok(())
    }

    async fn delete(&self, id: InventoryId) -> Result<bool, RepoError> {
        Ok(self.inventories.lock().unwrap().remove(&id).is_some())
    }

    async fn add_item(
        &self,
        id: InventoryId,
        item_type: &str,
        item_name: &str,
        quantity: u32,
    ) -> Result<(), RepoError> {
        let mut inventories = self.inventories.lock().unwrap();
        let inventory = inventories
            .get_mut(&id)
            .ok_or_else(|| RepoError::not_found("Inventory", id))?;
        inventory.add(item_type, item_name, quantity);
        Ok(())
    }

    async fn deduct_item(
        &self,
        id: InventoryId,
        item_type: &str,
        item_name: &str,
        quantity: u32,
    ) -> Result<(), RepoError> {
        let mut inventories = self.inventories.lock().unwrap();
        let inventory = inventories
            .get_mut(&id)
            .ok_or_else(|| RepoError::not_found("Inventory", id))?;
        let available = inventory.quantity_of(item_type, item_name);
        inventory.deduct(item_type, item_name, quantity).map_err(|_| {
            RepoError::insufficient(
                format!("{item_type}/{item_name}"),
                u64::from(quantity),
                u64::from(available),
            )
        })
    }
}

#[derive(Default)]
pub struct MemoryWalletRepo {
    wallets: Mutex<HashMap<WalletId, Wallet>>,
    fail_deletes: AtomicBool,
}

impl MemoryWalletRepo {
    pub fn balance(&self, id: WalletId) -> Option<u64> {
        self.wallets.lock().unwrap().get(&id).map(|w| w.coins)
    }

    /// Make every later `delete` fail as if the document store were down.
    pub fn fail_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl WalletRepo for MemoryWalletRepo {
    async fn get(&self, id: WalletId) -> Result<Option<Wallet>, RepoError> {
        Ok(self.wallets.lock().unwrap().get(&id).cloned())
    }

    async fn insert(&self, wallet: &Wallet) -> Result<(), RepoError> {
        self.wallets
            .lock()
            .unwrap()
            .insert(wallet.id, wallet.clone());
        Ok(())
    }

    async fn delete(&self, id: WalletId) -> Result<bool, RepoError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(RepoError::database("wallets.delete", "connection reset"));
        }
        Ok(self.wallets.lock().unwrap().remove(&id).is_some())
    }

    async fn debit(&self, id: WalletId, cost: u64) -> Result<u64, RepoError> {
        let mut wallets = self.wallets.lock().unwrap();
        let wallet = wallets
            .get_mut(&id)
            .ok_or_else(|| RepoError::not_found("Wallet", id))?;
        let available = wallet.coins;
        wallet
            .debit(cost)
            .map_err(|_| RepoError::insufficient("coins", cost, available))?;
        Ok(wallet.coins)
    }

    async fn credit(&self, id: WalletId, amount: u64) -> Result<u64, RepoError> {
        let mut wallets = self.wallets.lock().unwrap();
        let wallet = wallets
            .get_mut(&id)
            .ok_or_else(|| RepoError::not_found("Wallet", id))?;
        wallet.credit(amount);
        Ok(wallet.coins)
    }
}

#[derive(Default)]
pub struct MemoryStatusLogRepo {
    logs: Mutex<HashMap<StatusLogId, StatusLog>>,
}

#[async_trait]
impl StatusLogRepo for MemoryStatusLogRepo {
    async fn get(&self, id: StatusLogId) -> Result<Option<StatusLog>, RepoError> {
        Ok(self.logs.lock().unwrap().get(&id).cloned())
    }

    async fn insert(&self, log: &StatusLog) -> Result<(), RepoError> {
        self.logs.lock().unwrap().insert(log.id, log.clone());
        Ok(())
    }

    async fn delete(&self, id: StatusLogId) -> Result<bool, RepoError> {
        Ok(self.logs.lock().unwrap().remove(&id).is_some())
    }

    async fn append(&self, id: StatusLogId, entry: &StatusEntry) -> Result<(), RepoError> {
        let mut logs = self.logs.lock().unwrap();
        let log = logs
            .get_mut(&id)
            .ok_or_else(|| RepoError::not_found("StatusLog", id))?;
        log.append(entry.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryMapRepo {
    maps: Mutex<HashMap<MapId, GameMap>>,
}

impl MemoryMapRepo {
    /// Change a stored tile directly, as another writer would.
    pub fn edit_tile(&self, map_id: MapId, coord: TileCoord, edit: impl FnOnce(&mut Tile)) {
        let mut maps = self.maps.lock().unwrap();
        if let Some(tile) = maps.get_mut(&map_id).and_then(|m| m.tiles.get_mut(&coord)) {
            edit(tile);
        }
    }

    pub fn tile(&self, map_id: MapId, coord: TileCoord) -> Option<Tile> {
        self.maps
            .lock()
            .unwrap()
            .get(&map_id)
            .and_then(|m| m.tile(coord).cloned())
    }
}

#[async_trait]
impl MapRepo for MemoryMapRepo {
    async fn get(&self, id: MapId) -> Result<Option<GameMap>, RepoError> {
        Ok(self.maps.lock().unwrap().get(&id).cloned())
    }

    async fn list_for_character(
        &self,
        character_id: CharacterId,
    ) -> Result<Vec<GameMap>, RepoError> {
        let mut maps: Vec<GameMap> = self
            .maps
            .lock()
            .unwrap()
            .values()
            .filter(|m| m.character_id == character_id)
            .cloned()
            .collect();
        maps.sort_by_key(|m| m.created_at);
        Ok(maps)
    }

    async fn insert(&self, map: &GameMap) -> Result<(), RepoError> {
        self.maps.lock().unwrap().insert(map.id, map.clone());
        Ok(())
    }

    async fn delete_for_character(&self, character_id: CharacterId) -> Result<u64, RepoError> {
        let mut maps = self.maps.lock().unwrap();
        let before = maps.len();
        maps.retain(|_, m| m.character_id != character_id);
        Ok((before - maps.len()) as u64)
    }

    async fn set_favorite(&self, id: MapId, is_favorite: bool) -> Result<bool, RepoError> {
        Ok(match self.maps.lock().unwrap().get_mut(&id) {
            Some(m) => {
                m.is_favorite = is_favorite;
                true
            }
            None => false,
        })
    }

    async fn unset_favorite_except(
        &self,
        character_id: CharacterId,
        keep: MapId,
    ) -> Result<u64, RepoError> {
        let mut cleared = 0;
        for m in self.maps.lock().unwrap().values_mut() {
            if m.character_id == character_id && m.id != keep && m.is_favorite {
                m.is_favorite = false;
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    async fn rename(&self, id: MapId, nickname: &MapNickname) -> Result<bool, RepoError> {
        Ok(match self.maps.lock().unwrap().get_mut(&id) {
            Some(m) => {
                m.nickname = nickname.clone();
                true
            }
            None => false,
        })
    }

    async fn bulk_update_tiles(
        &self,
        id: MapId,
        updates: Vec<ConditionalTileUpdate>,
    ) -> Result<BulkTileResult, RepoError> {
        let mut maps = self.maps.lock().unwrap();
        let Some(map) = maps.get_mut(&id) else {
            return Ok(BulkTileResult::default());
        };
        let mut applied: Vec<TileCoord> = updates
            .iter()
            .filter(|u| {
                map.tiles
                    .get_mut(&u.coord)
                    .is_some_and(|tile| u.apply_to(tile))
            })
            .map(|u| u.coord)
            .collect();
        applied.sort();
        Ok(BulkTileResult {
            modified_count: applied.len() as u64,
            applied,
        })
    }
}

// =============================================================================
// Bundle
// =============================================================================

/// One fake of every store, sharing state across use cases.
#[derive(Default, Clone)]
pub struct MemoryStores {
    pub users: Arc<MemoryUserRepo>,
    pub links: Arc<MemoryLinkRepo>,
    pub characters: Arc<MemoryCharacterRepo>,
    pub inventories: Arc<MemoryInventoryRepo>,
    pub wallets: Arc<MemoryWalletRepo>,
    pub status_logs: Arc<MemoryStatusLogRepo>,
    pub maps: Arc<MemoryMapRepo>,
}

impl MemoryStores {
    pub fn documents(&self) -> CharacterDocuments {
        CharacterDocuments {
            characters: self.characters.clone(),
            inventories: self.inventories.clone(),
            wallets: self.wallets.clone(),
            status_logs: self.status_logs.clone(),
            maps: self.maps.clone(),
        }
    }
}
