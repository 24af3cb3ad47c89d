//! Application state and composition.

use std::sync::Arc;

use farmstead_domain::GameRules;

use crate::infrastructure::{
    mongo::MongoStore,
    ports::{
        CharacterLinkRepo, CharacterRepo, ClockPort, InventoryRepo, MapRepo, RandomPort,
        StatusLogRepo, UserRepo, WalletRepo,
    },
    sqlite::SqliteLinkStore,
};
use crate::use_cases::{
    self,
    economy::{InventoryOps, WalletOps},
    lifecycle::{
        CharacterDocuments, CharacterProfiles, CreateCharacter, RemoveCharacter,
        SetCharacterFavorite,
    },
};

/// Main application state.
///
/// Holds all repository ports and use cases.
/// Passed to HTTP/WebSocket handlers via Axum state.
pub struct App {
    pub repositories: Repositories,
    pub use_cases: UseCases,
    pub rules: Arc<GameRules>,
}

/// Port handles for both stores.
///
/// The link store holds users and character links; everything else lives in
/// the document store.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepo>,
    pub links: Arc<dyn CharacterLinkRepo>,
    pub characters: Arc<dyn CharacterRepo>,
    pub inventories: Arc<dyn InventoryRepo>,
    pub wallets: Arc<dyn WalletRepo>,
    pub status_logs: Arc<dyn StatusLogRepo>,
    pub maps: Arc<dyn MapRepo>,
}

impl Repositories {
    pub fn from_stores(link_store: &SqliteLinkStore, document_store: &MongoStore) -> Self {
        Self {
            users: link_store.users(),
            links: link_store.character_links(),
            characters: document_store.characters(),
            inventories: document_store.inventories(),
            wallets: document_store.wallets(),
            status_logs: document_store.status_logs(),
            maps: document_store.maps(),
        }
    }

    fn documents(&self) -> CharacterDocuments {
        CharacterDocuments {
            characters: self.characters.clone(),
            inventories: self.inventories.clone(),
            wallets: self.wallets.clone(),
            status_logs: self.status_logs.clone(),
            maps: self.maps.clone(),
        }
    }
}

/// Container for all use cases.
pub struct UseCases {
    pub lifecycle: use_cases::LifecycleUseCases,
    pub maps: Arc<use_cases::MapOps>,
    pub tiles: Arc<use_cases::MapTileEngine>,
    pub farm: Arc<use_cases::FarmActions>,
    pub economy: use_cases::EconomyUseCases,
    pub status: Arc<use_cases::StatusOps>,
}

impl App {
    pub fn new(
        repositories: Repositories,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
        rules: GameRules,
    ) -> Self {
        let rules = Arc::new(rules);
        let documents = repositories.documents();

        let lifecycle = use_cases::LifecycleUseCases::new(
            Arc::new(CreateCharacter::new(
                repositories.users.clone(),
                repositories.links.clone(),
                documents.clone(),
                clock.clone(),
                random.clone(),
                rules.clone(),
            )),
            Arc::new(RemoveCharacter::new(
                repositories.links.clone(),
                documents.clone(),
            )),
            Arc::new(SetCharacterFavorite::new(
                repositories.links.clone(),
                repositories.characters.clone(),
            )),
            Arc::new(CharacterProfiles::new(
                repositories.links.clone(),
                documents.clone(),
            )),
        );

        let maps = Arc::new(use_cases::MapOps::new(
            repositories.maps.clone(),
            repositories.links.clone(),
            repositories.characters.clone(),
            clock.clone(),
            random,
            rules.clone(),
        ));

        let status = Arc::new(use_cases::StatusOps::new(
            repositories.status_logs.clone(),
            repositories.links.clone(),
            clock.clone(),
        ));

        let tiles = Arc::new(use_cases::MapTileEngine::new(
            repositories.maps.clone(),
            clock,
            rules.clone(),
        ));

        let farm = Arc::new(use_cases::FarmActions::new(
            tiles.clone(),
            repositories.links.clone(),
            documents,
            status.clone(),
        ));

        let economy = use_cases::EconomyUseCases::new(
            Arc::new(WalletOps::new(
                repositories.wallets.clone(),
                repositories.links.clone(),
            )),
            Arc::new(InventoryOps::new(repositories.inventories.clone())),
        );

        Self {
            repositories,
            use_cases: UseCases {
                lifecycle,
                maps,
                tiles,
                farm,
                economy,
                status,
            },
            rules,
        }
    }
}
