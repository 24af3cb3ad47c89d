//! Character lifecycle use cases.
//!
//! A character spans both stores: one relational link row plus four
//! documents. Creation and removal run as sagas across the two; neither store
//! can roll the other back, so partial failures are compensated where possible
//! and reported as inconsistencies where not.

mod create_character;
mod error;
mod favorite;
mod profile;
mod remove_character;

use std::sync::Arc;

pub use create_character::{CreateCharacter, CreatedCharacter};
pub use error::LifecycleError;
pub use favorite::SetCharacterFavorite;
pub use profile::{CharacterProfile, CharacterProfiles};
pub use remove_character::RemoveCharacter;

use crate::infrastructure::ports::{
    CharacterRepo, InventoryRepo, MapRepo, StatusLogRepo, WalletRepo,
};

/// Handles to every document collection a character owns.
#[derive(Clone)]
pub struct CharacterDocuments {
    pub characters: Arc<dyn CharacterRepo>,
    pub inventories: Arc<dyn InventoryRepo>,
    pub wallets: Arc<dyn WalletRepo>,
    pub status_logs: Arc<dyn StatusLogRepo>,
    pub maps: Arc<dyn MapRepo>,
}

/// Container for character lifecycle use cases.
pub struct LifecycleUseCases {
    pub create: Arc<CreateCharacter>,
    pub remove: Arc<RemoveCharacter>,
    pub favorite: Arc<SetCharacterFavorite>,
    pub profiles: Arc<CharacterProfiles>,
}

impl LifecycleUseCases {
    pub fn new(
        create: Arc<CreateCharacter>,
        remove: Arc<RemoveCharacter>,
        favorite: Arc<SetCharacterFavorite>,
        profiles: Arc<CharacterProfiles>,
    ) -> Self {
        Self {
            create,
            remove,
            favorite,
            profiles,
        }
    }
}
