//! Map documents and the unordered bulk tile write.
//!
//! A tile update is one `UpdateOne` against the map document whose filter
//! pins `_id` and re-checks the tile precondition under `tiles.<x,y>`. All
//! updates of a batch go out in a single client-level `bulkWrite`
//! (MongoDB 8.0+) with `ordered: false`, so one non-matching tile never
//! blocks the others.

use async_trait::async_trait;
use bson::{doc, Bson, Document};
use farmstead_domain::{
    CharacterId, ConditionalTileUpdate, GameMap, MapId, MapNickname, TileChange, TileCoord,
    TilePrecondition, TileType,
};
use futures_util::TryStreamExt;
use mongodb::options::{UpdateModifications, UpdateOneModel, WriteModel};
use mongodb::{Client, Collection};

use super::documents::{bson_time, CropDoc, MapDoc};
use super::{to_bson, write_error};
use crate::infrastructure::ports::{BulkTileResult, MapRepo, RepoError};

pub struct MongoMapRepo {
    client: Client,
    collection: Collection<MapDoc>,
}

impl MongoMapRepo {
    pub(super) fn new(client: Client, collection: Collection<MapDoc>) -> Self {
        Self { client, collection }
    }
}

fn tile_path(coord: TileCoord, field: &str) -> String {
    format!("tiles.{}.{}", coord.key(), field)
}

/// Write-time filter for one tile: the map id plus the tile's precondition.
pub(crate) fn tile_filter(map_id: MapId, coord: TileCoord, pre: &TilePrecondition) -> Document {
    let mut filter = doc! { "_id": map_id.to_string() };
    match pre {
        TilePrecondition::Tilled => {
            filter.insert(tile_path(coord, "tileType"), TileType::Dirt.as_str());
            filter.insert(tile_path(coord, "crop"), Bson::Null);
        }
        TilePrecondition::CropReady { now } => {
            filter.insert(
                tile_path(coord, "crop.readyAt"),
                doc! { "$lte": bson_time(*now) },
            );
        }
        TilePrecondition::CropGrowing { now } => {
            filter.insert(
                tile_path(coord, "crop.readyAt"),
                doc! { "$gt": bson_time(*now) },
            );
        }
        TilePrecondition::Rubble => {
            filter.insert(tile_path(coord, "tileType"), TileType::Rubble.as_str());
        }
        TilePrecondition::Leasable => {
            filter.insert(tile_path(coord, "properties.leasable"), true);
        }
        TilePrecondition::RentDue { now } => {
            filter.insert(tile_path(coord, "properties.leasable"), false);
            filter.insert(
                tile_path(coord, "properties.nextRentDue"),
                doc! { "$lte": bson_time(*now) },
            );
        }
    }
    filter
}

/// `$set` document applying a tile change.
pub(crate) fn tile_update(coord: TileCoord, change: &TileChange) -> Result<Document, RepoError> {
    let mut set = Document::new();
    match change {
        TileChange::PlantCrop(crop) => {
            set.insert(tile_path(coord, "crop"), to_bson(&CropDoc::from(crop))?);
        }
        TileChange::ClearCrop => {
            set.insert(tile_path(coord, "crop"), Bson::Null);
        }
        TileChange::SetTileType(tile_type) => {
            set.insert(tile_path(coord, "tileType"), tile_type.as_str());
        }
        TileChange::RipenAt(at) => {
            set.insert(tile_path(coord, "crop.readyAt"), bson_time(*at));
        }
        TileChange::Lease { next_rent_due } => {
            set.insert(tile_path(coord, "properties.leasable"), false);
            set.insert(
                tile_path(coord, "properties.nextRentDue"),
                bson_time(*next_rent_due),
            );
        }
        TileChange::AdvanceRent { next_rent_due } => {
            set.insert(
                tile_path(coord, "properties.nextRentDue"),
                bson_time(*next_rent_due),
            );
        }
    }
    Ok(doc! { "$set": set })
}

#[async_trait]
impl MapRepo for MongoMapRepo {
    async fn get(&self, id: MapId) -> Result<Option<GameMap>, RepoError> {
        self.collection
            .find_one(doc! { "_id": id.to_string() })
            .await
            .map_err(|e| RepoError::database("maps.get", e))?
            .map(MapDoc::into_domain)
            .transpose()
    }

    async fn list_for_character(
        &self,
        character_id: CharacterId,
    ) -> Result<Vec<GameMap>, RepoError> {
        let docs: Vec<MapDoc> = self
            .collection
            .find(doc! { "characterId": character_id.to_string() })
            .sort(doc! { "createdAt": 1 })
            .await
            .map_err(|e| RepoError::database("maps.list_for_character", e))?
            .try_collect()
            .await
            .map_err(|e| RepoError::database("maps.list_for_character", e))?;
        docs.into_iter().map(MapDoc::into_domain).collect()
    }

    async fn insert(&self, map: &GameMap) -> Result<(), RepoError> {
        self.collection
            .insert_one(MapDoc::from_domain(map))
            .await
            .map_err(|e| write_error("maps.insert", e))?;
        Ok(())
    }

    async fn delete_for_character(&self, character_id: CharacterId) -> Result<u64, RepoError> {
        let result = self
            .collection
            .delete_many(doc! { "characterId": character_id.to_string() })
            .await
            .map_err(|e| RepoError::database("maps.delete_for_character", e))?;
        Ok(result.deleted_count)
    }

    async fn set_favorite(&self, id: MapId, is_favorite: bool) -> Result<bool, RepoError> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": id.to_string() },
                doc! { "$set": { "isFavorite": is_favorite } },
            )
            .await
            .map_err(|e| RepoError::database("maps.set_favorite", e))?;
        Ok(result.matched_count > 0)
    }

    async fn unset_favorite_except(
        &self,
        character_id: CharacterId,
        keep: MapId,
    ) -> Result<u64, RepoError> {
        let result = self
            .collection
            .update_many(
                doc! {
                    "characterId": character_id.to_string(),
                    "_id": { "$ne": keep.to_string() },
                    "isFavorite": true,
                },
                doc! { "$set": { "isFavorite": false } },
            )
            .await
            .map_err(|e| RepoError::database("maps.unset_favorite_except", e))?;
        Ok(result.modified_count)
    }

    async fn rename(&self, id: MapId, nickname: &MapNickname) -> Result<bool, RepoError> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": id.to_string() },
                doc! { "$set": { "nickname": nickname.as_str() } },
            )
            .await
            .map_err(|e| RepoError::database("maps.rename", e))?;
        Ok(result.matched_count > 0)
    }

    async fn bulk_update_tiles(
        &self,
        id: MapId,
        updates: Vec<ConditionalTileUpdate>,
    ) -> Result<BulkTileResult, RepoError> {
        if updates.is_empty() {
            return Ok(BulkTileResult::default());
        }

        let namespace = self.collection.namespace();
        let models = updates
            .iter()
            .map(|u| {
                let update = tile_update(u.coord, &u.change)?;
                Ok(WriteModel::UpdateOne(
                    UpdateOneModel::builder()
                        .namespace(namespace.clone())
                        .filter(tile_filter(id, u.coord, &u.precondition))
                        .update(UpdateModifications::Document(update))
                        .build(),
                ))
            })
            .collect::<Result<Vec<_>, RepoError>>()?;

        let result = self
            .client
            .bulk_write(models)
            .ordered(false)
            .verbose_results()
            .await
            .map_err(|e| RepoError::database("maps.bulk_update_tiles", e))?;

        let mut applied: Vec<TileCoord> = result
            .update_results
            .iter()
            .filter(|(_, r)| r.modified_count > 0)
            .filter_map(|(index, _)| updates.get(*index).map(|u| u.coord))
            .collect();
        applied.sort();

        let modified_count = u64::try_from(result.summary.modified_count).unwrap_or(0);

        tracing::debug!(
            map_id = %id,
            submitted = updates.len(),
            modified = modified_count,
            "Bulk tile write complete"
        );

        Ok(BulkTileResult {
            modified_count,
            applied,
        })
    }
}
