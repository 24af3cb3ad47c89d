//! Create character saga.
//!
//! Writes four documents, then the link row. Each successful document write is
//! recorded so a later failure can delete exactly what was created.

use std::sync::Arc;

use farmstead_domain::{
    generate_farmer_name, Character, CharacterId, CharacterLink, CharacterName, DomainError,
    GameRules, Inventory, InventoryId, StatusLog, StatusLogId, UserId, Wallet, WalletId,
};
use futures_util::future::{join_all, BoxFuture, FutureExt};

use super::{CharacterDocuments, LifecycleError};
use crate::infrastructure::ports::{
    CharacterLinkRepo, ClockPort, RandomPort, RepoError, UserRepo,
};
use crate::use_cases::error::{InconsistencyReport, DOCUMENT_STORE, LINK_STORE};

/// The full entity graph of a freshly created character.
#[derive(Debug, Clone)]
pub struct CreatedCharacter {
    pub link: CharacterLink,
    pub character: Character,
    pub inventory: Inventory,
    pub wallet: Wallet,
    pub status_log: StatusLog,
}

/// Documents written so far, in creation order.
#[derive(Debug, Default)]
struct CreatedArtifacts {
    character: Option<CharacterId>,
    wallet: Option<WalletId>,
    inventory: Option<InventoryId>,
    status_log: Option<StatusLogId>,
}

pub struct CreateCharacter {
    users: Arc<dyn UserRepo>,
    links: Arc<dyn CharacterLinkRepo>,
    documents: CharacterDocuments,
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
    rules: Arc<GameRules>,
}

impl CreateCharacter {
    pub fn new(
        users: Arc<dyn UserRepo>,
        links: Arc<dyn CharacterLinkRepo>,
        documents: CharacterDocuments,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
        rules: Arc<GameRules>,
    ) -> Self {
        Self {
            users,
            links,
            documents,
            clock,
            random,
            rules,
        }
    }

    /// Create a character for `owner_username`.
    ///
    /// Succeeds only when the link row and all four documents exist. On
    /// failure every document already written is deleted again; if one of
    /// those deletes fails too the error is an inconsistency naming it.
    pub async fn execute(
        &self,
        owner_username: &str,
        requested_name: Option<String>,
    ) -> Result<CreatedCharacter, LifecycleError> {
        let username = owner_username.trim();
        if username.is_empty() {
            return Err(DomainError::validation("Owner username cannot be empty").into());
        }

        let owner = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| LifecycleError::OwnerNotFound(username.to_string()))?;

        let existing = self.existing_names(owner.id).await?;
        let name = match requested_name {
            Some(requested) => {
                let name = CharacterName::new(requested)?;
                if existing.iter().any(|n| name.collides_with(n)) {
                    return Err(LifecycleError::DuplicateName(name.as_str().to_string()));
                }
                name
            }
            None => self.generate_name(&existing)?,
        };

        let now = self.clock.now();
        let character = Character::new(owner.id, name, now);
        let wallet = Wallet::new(character.id, self.rules.starting_coins);
        let mut inventory = Inventory::new(character.id);
        let (item_type, item_name, quantity) = &self.rules.starting_item;
        inventory.add(item_type, item_name, *quantity);
        let status_log = StatusLog::new(character.id, now);
        let link = CharacterLink::new(
            owner.id,
            character.id,
            inventory.id,
            wallet.id,
            status_log.id,
            now,
        );

        let created = CreatedCharacter {
            link,
            character,
            inventory,
            wallet,
            status_log,
        };

        let mut ledger = CreatedArtifacts::default();
        if let Err(cause) = self.write_graph(&created, &mut ledger).await {
            return Err(self.compensate(ledger, cause).await);
        }

        tracing::info!(
            user_id = %owner.id,
            character_id = %created.character.id,
            name = %created.character.name,
            "Character created"
        );
        Ok(created)
    }

    async fn existing_names(&self, owner_id: UserId) -> Result<Vec<String>, RepoError> {
        let ids: Vec<CharacterId> = self
            .links
            .list_for_user(owner_id)
            .await?
            .into_iter()
            .map(|link| link.character_id)
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .documents
            .characters
            .get_many(ids)
            .await?
            .into_iter()
            .map(|c| c.name.as_str().to_string())
            .collect())
    }

    fn generate_name(&self, existing: &[String]) -> Result<CharacterName, LifecycleError> {
        for _ in 0..self.rules.name_generation_attempts {
            let candidate = generate_farmer_name(|len| self.pick(len));
            if !existing.iter().any(|n| candidate.collides_with(n)) {
                return Ok(candidate);
            }
        }
        let fallback = format!("Farmer-{}", self.clock.now().timestamp_millis());
        tracing::debug!(name = %fallback, "Generated names collided, using fallback");
        Ok(CharacterName::new(fallback)?)
    }

    fn pick(&self, len: usize) -> usize {
        let max = i32::try_from(len.saturating_sub(1)).unwrap_or(i32::MAX);
        usize::try_from(self.random.gen_range(0, max)).unwrap_or(0)
    }

    async fn write_graph(
        &self,
        created: &CreatedCharacter,
        ledger: &mut CreatedArtifacts,
    ) -> Result<(), RepoError> {
        self.documents.characters.insert(&created.character).await?;
        ledger.character = Some(created.character.id);

        self.documents.wallets.insert(&created.wallet).await?;
        ledger.wallet = Some(created.wallet.id);

        self.documents.inventories.insert(&created.inventory).await?;
        ledger.inventory = Some(created.inventory.id);

        self.documents.status_logs.insert(&created.status_log).await?;
        ledger.status_log = Some(created.status_log.id);

        self.links.insert(&created.link).await
    }

    /// Delete every recorded document concurrently.
    async fn compensate(&self, ledger: CreatedArtifacts, cause: RepoError) -> LifecycleError {
        type Undo = BoxFuture<'static, (String, Result<bool, RepoError>)>;
        let mut undo: Vec<Undo> = Vec::new();

        if let Some(id) = ledger.character {
            let repo = self.documents.characters.clone();
            undo.push(async move { (format!("characters/{id}"), repo.delete(id).await) }.boxed());
        }
        if let Some(id) = ledger.wallet {
            let repo = self.documents.wallets.clone();
            undo.push(async move { (format!("wallets/{id}"), repo.delete(id).await) }.boxed());
        }
        if let Some(id) = ledger.inventory {
            let repo = self.documents.inventories.clone();
            undo.push(
                async move { (format!("inventories/{id}"), repo.delete(id).await) }.boxed(),
            );
        }
        if let Some(id) = ledger.status_log {
            let repo = self.documents.status_logs.clone();
            undo.push(
                async move { (format!("status_logs/{id}"), repo.delete(id).await) }.boxed(),
            );
        }

        let orphaned: Vec<String> = join_all(undo)
            .await
            .into_iter()
            .filter_map(|(record, result)| match result {
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(record = %record, error = %e, "Compensating delete failed");
                    Some(record)
                }
            })
            .collect();

        if orphaned.is_empty() {
            tracing::warn!(error = %cause, "Character creation rolled back");
            return LifecycleError::Repo(cause);
        }

        LifecycleError::Inconsistency(
            InconsistencyReport::new(
                "create_character",
                DOCUMENT_STORE,
                LINK_STORE,
                orphaned,
                cause.to_string(),
            )
            .logged(),
        )
    }
}
