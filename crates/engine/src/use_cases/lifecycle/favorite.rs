//! Character favorite toggle.

use std::sync::Arc;

use farmstead_domain::{CharacterId, UserId};

use super::LifecycleError;
use crate::infrastructure::ports::{CharacterLinkRepo, CharacterRepo};
use crate::use_cases::error::{InconsistencyReport, DOCUMENT_STORE, LINK_STORE};

/// Marks one character as the owner's favorite.
///
/// Two independent writes: clear the flag on the owner's other characters,
/// then set it on the target. A crash in between leaves no favorite at all,
/// which the next toggle repairs.
pub struct SetCharacterFavorite {
    links: Arc<dyn CharacterLinkRepo>,
    characters: Arc<dyn CharacterRepo>,
}

impl SetCharacterFavorite {
    pub fn new(links: Arc<dyn CharacterLinkRepo>, characters: Arc<dyn CharacterRepo>) -> Self {
        Self { links, characters }
    }

    pub async fn execute(
        &self,
        user_id: UserId,
        character_id: CharacterId,
        is_favorite: bool,
    ) -> Result<(), LifecycleError> {
        self.links
            .get_by_character(character_id)
            .await?
            .filter(|link| link.user_id == user_id)
            .ok_or(LifecycleError::CharacterNotFound(character_id))?;

        if is_favorite {
            let cleared = self
                .characters
                .unset_favorite_except(user_id, character_id)
                .await?;
            tracing::debug!(user_id = %user_id, cleared, "Cleared previous favorite characters");
        }

        if !self.characters.set_favorite(character_id, is_favorite).await? {
            return Err(LifecycleError::Inconsistency(
                InconsistencyReport::new(
                    "set_character_favorite",
                    LINK_STORE,
                    DOCUMENT_STORE,
                    vec![format!("characters/{character_id}")],
                    "link exists but character document is missing",
                )
                .logged(),
            ));
        }

        tracing::info!(
            user_id = %user_id,
            character_id = %character_id,
            is_favorite,
            "Character favorite updated"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{MockCharacterLinkRepo, MockCharacterRepo};
    use chrono::Utc;
    use farmstead_domain::{CharacterLink, InventoryId, StatusLogId, WalletId};
    use mockall::Sequence;

    fn links_owned_by(user_id: UserId) -> MockCharacterLinkRepo {
        let mut links = MockCharacterLinkRepo::new();
        links.expect_get_by_character().returning(move |character_id| {
            Ok(Some(CharacterLink::new(
                user_id,
                character_id,
                InventoryId::new(),
                WalletId::new(),
                StatusLogId::new(),
                Utc::now(),
            )))
        });
        links
    }

    #[tokio::test]
    async fn favorite_clears_siblings_before_setting_target() {
        let user_id = UserId::new();
        let character_id = CharacterId::new();
        let mut seq = Sequence::new();

        let mut characters = MockCharacterRepo::new();
        characters
            .expect_unset_favorite_except()
            .withf(move |owner, keep| *owner == user_id && *keep == character_id)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(1));
        characters
            .expect_set_favorite()
            .withf(move |id, fav| *id == character_id && *fav)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(true));

        let uc = SetCharacterFavorite::new(Arc::new(links_owned_by(user_id)), Arc::new(characters));
        uc.execute(user_id, character_id, true).await.unwrap();
    }

    #[tokio::test]
    async fn unfavorite_touches_only_target() {
        let user_id = UserId::new();
        let mut characters = MockCharacterRepo::new();
        characters.expect_unset_favorite_except().never();
        characters
            .expect_set_favorite()
            .withf(|_, fav| !*fav)
            .returning(|_, _| Ok(true));

        let uc = SetCharacterFavorite::new(Arc::new(links_owned_by(user_id)), Arc::new(characters));
        uc.execute(user_id, CharacterId::new(), false).await.unwrap();
    }

    #[tokio::test]
    async fn other_users_character_is_not_found() {
        let uc = SetCharacterFavorite::new(
            Arc::new(links_owned_by(UserId::new())),
            Arc::new(MockCharacterRepo::new()),
        );
        let result = uc.execute(UserId::new(), CharacterId::new(), true).await;
        assert!(matches!(result, Err(LifecycleError::CharacterNotFound(_))));
    }

    #[tokio::test]
    async fn missing_document_behind_link_is_inconsistent() {
        let user_id = UserId::new();
        let mut characters = MockCharacterRepo::new();
        characters.expect_set_favorite().returning(|_, _| Ok(false));

        let uc = SetCharacterFavorite::new(Arc::new(links_owned_by(user_id)), Arc::new(characters));
        let result = uc.execute(user_id, CharacterId::new(), false).await;
        assert!(matches!(result, Err(LifecycleError::Inconsistency(_))));
    }
}
