use async_trait::async_trait;
use bson::doc;
use farmstead_domain::{Character, CharacterId, UserId};
use futures_util::TryStreamExt;
use mongodb::options::ReturnDocument;
use mongodb::Collection;

use super::documents::CharacterDoc;
use super::write_error;
use crate::infrastructure::ports::{CharacterRepo, RepoError};

pub struct MongoCharacterRepo {
    collection: Collection<CharacterDoc>,
}

impl MongoCharacterRepo {
    pub(super) fn new(collection: Collection<CharacterDoc>) -> Self {
        Self { collection }
    }
}

#[async_trait]
impl CharacterRepo for MongoCharacterRepo {
    async fn get(&self, id: CharacterId) -> Result<Option<Character>, RepoError> {
        self.collection
            .find_one(doc! { "_id": id.to_string() })
            .await
            .map_err(|e| RepoError::database("characters.get", e))?
            .map(CharacterDoc::into_domain)
            .transpose()
    }

    async fn get_many(&self, ids: Vec<CharacterId>) -> Result<Vec<Character>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
        let docs: Vec<CharacterDoc> = self
            .collection
            .find(doc! { "_id": { "$in": ids } })
            .sort(doc! { "createdAt": 1 })
            .await
            .map_err(|e| RepoError::database("characters.get_many", e))?
            .try_collect()
            .await
            .map_err(|e| RepoError::database("characters.get_many", e))?;
        docs.into_iter().map(CharacterDoc::into_domain).collect()
    }

    async fn insert(&self, character: &Character) -> Result<(), RepoError> {
        self.collection
            .insert_one(CharacterDoc::from_domain(character)?)
            .await
            .map_err(|e| write_error("characters.insert", e))?;
        Ok(())
    }

    async fn delete(&self, id: CharacterId) -> Result<bool, RepoError> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id.to_string() })
            .await
            .map_err(|e| RepoError::database("characters.delete", e))?;
        Ok(result.deleted_count > 0)
    }

    async fn set_favorite(&self, id: CharacterId, is_favorite: bool) -> Result<bool, RepoError> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": id.to_string() },
                doc! { "$set": { "isFavorite": is_favorite } },
            )
            .await
            .map_err(|e| RepoError::database("characters.set_favorite", e))?;
        Ok(result.matched_count > 0)
    }

    async fn unset_favorite_except(
        &self,
        owner_id: UserId,
        keep: CharacterId,
    ) -> Result<u64, RepoError> {
        let result = self
            .collection
            .update_many(
                doc! {
                    "ownerId": owner_id.to_string(),
                    "_id": { "$ne": keep.to_string() },
                    "isFavorite": true,
                },
                doc! { "$set": { "isFavorite": false } },
            )
            .await
            .map_err(|e| RepoError::database("characters.unset_favorite_except", e))?;
        Ok(result.modified_count)
    }

    async fn add_experience(&self, id: CharacterId, amount: u64) -> Result<Character, RepoError> {
        let amount = i64::try_from(amount)
            .map_err(|_| RepoError::serialization("experience amount out of range"))?;
        let updated = self
            .collection
            .find_one_and_update(
                doc! { "_id": id.to_string() },
                doc! { "$inc": { "experience": amount } },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| RepoError::database("characters.add_experience", e))?
            .ok_or_else(|| RepoError::not_found("Character", id))?;

        let mut character = updated.into_domain()?;
        let level = Character::level_for_experience(character.experience);
        if level != character.level {
            // Only ever raise the stored level; a concurrent grant may already have.
            self.collection
                .update_one(
                    doc! { "_id": id.to_string(), "level": { "$lt": i64::from(level) } },
                    doc! { "$set": { "level": i64::from(level) } },
                )
                .await
                .map_err(|e| RepoError::database("characters.add_experience", e))?;
            character.level = level;
        }
        Ok(character)
    }
}
