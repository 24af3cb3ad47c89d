//! Map creation and management.

use std::sync::Arc;

use farmstead_domain::{
    CharacterId, DomainError, GameMap, GameRules, MapId, MapNickname, UserId,
};

use crate::infrastructure::ports::{
    CharacterLinkRepo, CharacterRepo, ClockPort, MapRepo, RandomPort, RepoError,
};
use crate::use_cases::error::{ErrorKind, InconsistencyReport, DOCUMENT_STORE, LINK_STORE};

/// One interior tile in this many starts as rubble.
const RUBBLE_ONE_IN: i32 = 8;

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Validation error: {0}")]
    Validation(#[from] DomainError),
    #[error("Character not found: {0}")]
    CharacterNotFound(CharacterId),
    #[error("Map not found: {0}")]
    MapNotFound(MapId),
    #[error("{0}")]
    Inconsistency(InconsistencyReport),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

impl MapError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MapError::Validation(_) => ErrorKind::Validation,
            MapError::CharacterNotFound(_) | MapError::MapNotFound(_) => ErrorKind::NotFound,
            MapError::Inconsistency(_) => ErrorKind::Inconsistency,
            MapError::Repo(_) => ErrorKind::Internal,
        }
    }
}

pub struct MapOps {
    maps: Arc<dyn MapRepo>,
    links: Arc<dyn CharacterLinkRepo>,
    characters: Arc<dyn CharacterRepo>,
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
    rules: Arc<GameRules>,
}

impl MapOps {
    pub fn new(
        maps: Arc<dyn MapRepo>,
        links: Arc<dyn CharacterLinkRepo>,
        characters: Arc<dyn CharacterRepo>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
        rules: Arc<GameRules>,
    ) -> Self {
        Self {
            maps,
            links,
            characters,
            clock,
            random,
            rules,
        }
    }

    async fn ensure_owns_character(
        &self,
        user_id: UserId,
        character_id: CharacterId,
    ) -> Result<(), MapError> {
        self.links
            .get_by_character(character_id)
            .await?
            .filter(|link| link.user_id == user_id)
            .map(|_| ())
            .ok_or(MapError::CharacterNotFound(character_id))
    }

    /// Load a map the user owns through one of their characters.
    async fn owned_map(&self, user_id: UserId, map_id: MapId) -> Result<GameMap, MapError> {
        let map = self.get_map(map_id).await?;
        self.ensure_owns_character(user_id, map.character_id)
            .await
            .map_err(|_| MapError::MapNotFound(map_id))?;
        Ok(map)
    }

    pub async fn get_map(&self, map_id: MapId) -> Result<GameMap, MapError> {
        self.maps
            .get(map_id)
            .await?
            .ok_or(MapError::MapNotFound(map_id))
    }

    /// Generate and store a new map. A character's first map becomes its favorite.
    pub async fn create_map(
        &self,
        user_id: UserId,
        character_id: CharacterId,
        nickname: Option<String>,
    ) -> Result<GameMap, MapError> {
        self.ensure_owns_character(user_id, character_id).await?;

        let nickname = match nickname {
            Some(nickname) => MapNickname::new(nickname)?,
            None => {
                let character = self.characters.get(character_id).await?.ok_or_else(|| {
                    MapError::Inconsistency(
                        InconsistencyReport::new(
                            "create_map",
                            LINK_STORE,
                            DOCUMENT_STORE,
                            vec![format!("characters/{character_id}")],
                            "link exists but character document is missing",
                        )
                        .logged(),
                    )
                })?;
                MapNickname::for_character(&character.name)
            }
        };

        let first = self.maps.list_for_character(character_id).await?.is_empty();
        let mut map = GameMap::generate(
            character_id,
            nickname,
            self.rules.map_width,
            self.rules.map_height,
            self.clock.now(),
            || self.random.gen_range(0, RUBBLE_ONE_IN - 1) == 0,
        );
        map.is_favorite = first;
        self.maps.insert(&map).await?;

        tracing::info!(
            map_id = %map.id,
            character_id = %character_id,
            nickname = %map.nickname,
            "Map created"
        );
        Ok(map)
    }

    pub async fn list_maps(
        &self,
        user_id: UserId,
        character_id: CharacterId,
    ) -> Result<Vec<GameMap>, MapError> {
        self.ensure_owns_character(user_id, character_id).await?;
        Ok(self.maps.list_for_character(character_id).await?)
    }

    pub async fn rename_map(
        &self,
        user_id: UserId,
        map_id: MapId,
        nickname: String,
    ) -> Result<MapNickname, MapError> {
        let nickname = MapNickname::new(nickname)?;
        self.owned_map(user_id, map_id).await?;
        if !self.maps.rename(map_id, &nickname).await? {
            return Err(MapError::MapNotFound(map_id));
        }
        tracing::info!(map_id = %map_id, nickname = %nickname, "Map renamed");
        Ok(nickname)
    }

    /// Two writes: clear the character's other favorites, then set the target.
    pub async fn set_favorite_map(
        &self,
        user_id: UserId,
        map_id: MapId,
        is_favorite: bool,
    ) -> Result<(), MapError> {
        let map = self.owned_map(user_id, map_id).await?;
        if is_favorite {
            self.maps
                .unset_favorite_except(map.character_id, map_id)
                .await?;
        }
        if !self.maps.set_favorite(map_id, is_favorite).await? {
            return Err(MapError::MapNotFound(map_id));
        }
        tracing::info!(map_id = %map_id, is_favorite, "Map favorite updated");
        Ok(())
    }
}
