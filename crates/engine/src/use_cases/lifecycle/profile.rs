//! Character reads resolved through the owner's links.
//!
//! A link whose documents are missing is reported as an inconsistency, never
//! as not found: the link store says the character exists.

use std::collections::HashMap;
use std::sync::Arc;

use farmstead_domain::{
    Character, CharacterId, CharacterLink, Inventory, StatusLog, UserId, Wallet,
};
use futures_util::future::join4;

use super::{CharacterDocuments, LifecycleError};
use crate::infrastructure::ports::CharacterLinkRepo;
use crate::use_cases::error::{InconsistencyReport, DOCUMENT_STORE, LINK_STORE};

/// A character with every document it owns.
#[derive(Debug, Clone)]
pub struct CharacterProfile {
    pub link: CharacterLink,
    pub character: Character,
    pub inventory: Inventory,
    pub wallet: Wallet,
    pub status_log: StatusLog,
}

pub struct CharacterProfiles {
    links: Arc<dyn CharacterLinkRepo>,
    documents: CharacterDocuments,
}

fn dangling(operation: &'static str, records: Vec<String>) -> LifecycleError {
    LifecycleError::Inconsistency(
        InconsistencyReport::new(
            operation,
            LINK_STORE,
            DOCUMENT_STORE,
            records,
            "link exists but documents are missing",
        )
        .logged(),
    )
}

impl CharacterProfiles {
    pub fn new(links: Arc<dyn CharacterLinkRepo>, documents: CharacterDocuments) -> Self {
        Self { links, documents }
    }

    /// The owner's characters, in link creation order.
    pub async fn list_characters(&self, user_id: UserId) -> Result<Vec<Character>, LifecycleError> {
        let links = self.links.list_for_user(user_id).await?;
        if links.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<CharacterId> = links.iter().map(|l| l.character_id).collect();
        let mut by_id: HashMap<CharacterId, Character> = self
            .documents
            .characters
            .get_many(ids)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let mut characters = Vec::with_capacity(links.len());
        let mut missing = Vec::new();
        for link in &links {
            match by_id.remove(&link.character_id) {
                Some(character) => characters.push(character),
                None => missing.push(format!("characters/{}", link.character_id)),
            }
        }
        if !missing.is_empty() {
            return Err(dangling("list_characters", missing));
        }
        Ok(characters)
    }

    pub async fn get_profile(
        &self,
        user_id: UserId,
        character_id: CharacterId,
    ) -> Result<CharacterProfile, LifecycleError> {
        let link = self
            .links
            .get_by_character(character_id)
            .await?
            .filter(|link| link.user_id == user_id)
            .ok_or(LifecycleError::CharacterNotFound(character_id))?;

        let docs = &self.documents;
        let (character, inventory, wallet, status_log) = join4(
            docs.characters.get(link.character_id),
            docs.inventories.get(link.inventory_id),
            docs.wallets.get(link.wallet_id),
            docs.status_logs.get(link.status_log_id),
        )
        .await;

        match (character?, inventory?, wallet?, status_log?) {
            (Some(character), Some(inventory), Some(wallet), Some(status_log)) => {
                Ok(CharacterProfile {
                    link,
                    character,
                    inventory,
                    wallet,
                    status_log,
                })
            }
            (character, inventory, wallet, status_log) => {
                let mut missing = Vec::new();
                if character.is_none() {
                    missing.push(format!("characters/{}", link.character_id));
                }
                if inventory.is_none() {
                    missing.push(format!("inventories/{}", link.inventory_id));
                }
                if wallet.is_none() {
                    missing.push(format!("wallets/{}", link.wallet_id));
                }
                if status_log.is_none() {
                    missing.push(format!("status_logs/{}", link.status_log_id));
                }
                Err(dangling("get_character_profile", missing))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockCharacterLinkRepo;
    use crate::use_cases::lifecycle::test_support::DocumentMocks;
    use chrono::Utc;
    use farmstead_domain::CharacterName;

    fn character(user_id: UserId, name: &str) -> Character {
        Character::new(user_id, CharacterName::new(name).unwrap(), Utc::now())
    }

    fn link_for(character: &Character) -> CharacterLink {
        let inventory = Inventory::new(character.id);
        let wallet = Wallet::new(character.id, 100);
        let log = StatusLog::new(character.id, Utc::now());
        CharacterLink::new(
            character.owner_id,
            character.id,
            inventory.id,
            wallet.id,
            log.id,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn list_preserves_link_order() {
        let user_id = UserId::new();
        let first = character(user_id, "Ada");
        let second = character(user_id, "Bea");
        let links_out = vec![link_for(&first), link_for(&second)];

        let mut links = MockCharacterLinkRepo::new();
        links
            .expect_list_for_user()
            .returning(move |_| Ok(links_out.clone()));
        let mut docs = DocumentMocks::default();
        let (a, b) = (first.clone(), second.clone());
        docs.characters
            .expect_get_many()
            .returning(move |_| Ok(vec![b.clone(), a.clone()]));

        let uc = CharacterProfiles::new(Arc::new(links), docs.build());
        let listed = uc.list_characters(user_id).await.unwrap();
        assert_eq!(listed, vec![first, second]);
    }

    #[tokio::test]
    async fn list_with_missing_document_is_inconsistent() {
        let user_id = UserId::new();
        let present = character(user_id, "Ada");
        let absent = character(user_id, "Bea");
        let links_out = vec![link_for(&present), link_for(&absent)];

        let mut links = MockCharacterLinkRepo::new();
        links
            .expect_list_for_user()
            .returning(move |_| Ok(links_out.clone()));
        let mut docs = DocumentMocks::default();
        docs.characters
            .expect_get_many()
            .returning(move |_| Ok(vec![present.clone()]));

        let uc = CharacterProfiles::new(Arc::new(links), docs.build());
        match uc.list_characters(user_id).await {
            Err(LifecycleError::Inconsistency(report)) => {
                assert_eq!(report.records, vec![format!("characters/{}", absent.id)]);
            }
            other => panic!("expected inconsistency, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn profile_missing_wallet_is_inconsistent_not_not_found() {
        let user_id = UserId::new();
        let farmer = character(user_id, "Ada");
        let link = link_for(&farmer);
        let link_out = link.clone();

        let mut links = MockCharacterLinkRepo::new();
        links
            .expect_get_by_character()
            .returning(move |_| Ok(Some(link_out.clone())));
        let mut docs = DocumentMocks::default();
        let c = farmer.clone();
        docs.characters.expect_get().returning(move |_| Ok(Some(c.clone())));
        let character_id = farmer.id;
        docs.inventories
            .expect_get()
            .returning(move |_| Ok(Some(Inventory::new(character_id))));
        docs.wallets.expect_get().returning(|_| Ok(None));
        docs.status_logs
            .expect_get()
            .returning(move |_| Ok(Some(StatusLog::new(character_id, Utc::now()))));

        let uc = CharacterProfiles::new(Arc::new(links), docs.build());
        let err = uc.get_profile(user_id, farmer.id).await.unwrap_err();
        match err {
            LifecycleError::Inconsistency(report) => {
                assert_eq!(report.records, vec![format!("wallets/{}", link.wallet_id)]);
            }
            other => panic!("expected inconsistency, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn profile_of_foreign_character_is_not_found() {
        let farmer = character(UserId::new(), "Ada");
        let link = link_for(&farmer);
        let mut links = MockCharacterLinkRepo::new();
        links
            .expect_get_by_character()
            .returning(move |_| Ok(Some(link.clone())));

        let uc = CharacterProfiles::new(Arc::new(links), DocumentMocks::default().build());
        let result = uc.get_profile(UserId::new(), farmer.id).await;
        assert!(matches!(result, Err(LifecycleError::CharacterNotFound(_))));
    }
}
