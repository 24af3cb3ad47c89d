//! Remove character saga.
//!
//! The link row is deleted first, inside a relational transaction; once that
//! commits the character is gone for its owner. The documents are then
//! deleted by an explicit fan-out. Nothing undoes the relational delete.

use std::sync::Arc;

use farmstead_domain::{CharacterId, CharacterLink, UserId};
use futures_util::future::{join, join4};

use super::{CharacterDocuments, LifecycleError};
use crate::infrastructure::ports::{CharacterLinkRepo, RepoError};
use crate::use_cases::error::{InconsistencyReport, DOCUMENT_STORE, LINK_STORE};

pub struct RemoveCharacter {
    links: Arc<dyn CharacterLinkRepo>,
    documents: CharacterDocuments,
}

impl RemoveCharacter {
    pub fn new(links: Arc<dyn CharacterLinkRepo>, documents: CharacterDocuments) -> Self {
        Self { links, documents }
    }

    pub async fn execute(
        &self,
        user_id: UserId,
        character_id: CharacterId,
    ) -> Result<(), LifecycleError> {
        let link = self
            .links
            .remove_owned(character_id, user_id)
            .await?
            .ok_or(LifecycleError::CharacterNotFound(character_id))?;

        let leftovers = self.delete_documents(&link).await;
        if !leftovers.is_empty() {
            let detail = leftovers
                .iter()
                .map(|(_, e)| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            let records = leftovers.into_iter().map(|(record, _)| record).collect();
            return Err(LifecycleError::Inconsistency(
                InconsistencyReport::new(
                    "remove_character",
                    LINK_STORE,
                    DOCUMENT_STORE,
                    records,
                    detail,
                )
                .logged(),
            ));
        }

        tracing::info!(
            user_id = %user_id,
            character_id = %character_id,
            "Character removed"
        );
        Ok(())
    }

    /// Delete every document of the character concurrently. Returns the
    /// records whose delete failed.
    async fn delete_documents(&self, link: &CharacterLink) -> Vec<(String, RepoError)> {
        let docs = &self.documents;
        let (owned, maps) = join(
            join4(
                docs.characters.delete(link.character_id),
                docs.inventories.delete(link.inventory_id),
                docs.wallets.delete(link.wallet_id),
                docs.status_logs.delete(link.status_log_id),
            ),
            docs.maps.delete_for_character(link.character_id),
        )
        .await;
        let (character, inventory, wallet, status_log) = owned;

        let mut failed = Vec::new();
        let mut check = |record: String, result: Result<bool, RepoError>| match result {
            Ok(false) => {
                tracing::debug!(record = %record, "Document already absent");
            }
            Ok(true) => {}
            Err(e) => failed.push((record, e)),
        };
        check(format!("characters/{}", link.character_id), character);
        check(format!("inventories/{}", link.inventory_id), inventory);
        check(format!("wallets/{}", link.wallet_id), wallet);
        check(format!("status_logs/{}", link.status_log_id), status_log);
        check(
            format!("maps/characterId={}", link.character_id),
            maps.map(|n| n > 0),
        );
        failed
    }
}
