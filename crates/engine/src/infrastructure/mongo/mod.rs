//! MongoDB document store: per-character game state.
//!
//! One repository per collection, all sharing a single [`MongoStore`] client.

mod characters;
pub mod documents;
mod inventories;
mod maps;
mod status_logs;
mod wallets;

pub use characters::MongoCharacterRepo;
pub use inventories::MongoInventoryRepo;
pub use maps::MongoMapRepo;
pub use status_logs::MongoStatusLogRepo;
pub use wallets::MongoWalletRepo;

use std::sync::Arc;

use bson::{doc, Document};
use mongodb::{options::IndexOptions, Client, Collection, Database, IndexModel};
use serde::{de::DeserializeOwned, Serialize};

use crate::infrastructure::ports::RepoError;
use documents::{CHARACTERS, INVENTORIES, MAPS, STATUS_LOGS, WALLETS};

/// Indexes each collection needs, as (keys, options) pairs.
fn collection_indexes(collection: &str) -> Vec<(Document, Option<IndexOptions>)> {
    match collection {
        CHARACTERS => vec![(doc! { "ownerId": 1 }, None)],
        INVENTORIES | WALLETS | STATUS_LOGS => vec![(
            doc! { "characterId": 1 },
            Some(IndexOptions::builder().unique(true).build()),
        )],
        MAPS => vec![(doc! { "characterId": 1, "isFavorite": -1 }, None)],
        _ => Vec::new(),
    }
}

/// MongoDB client wrapper.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self, RepoError> {
        tracing::info!(db = %db_name, "Connecting to MongoDB");

        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| RepoError::database("mongo.connect", e))?;
        let db = client.database(db_name);

        db.run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| RepoError::database("mongo.ping", e))?;

        let store = Self { client, db };
        store.ensure_indexes().await?;

        tracing::info!(db = %db_name, "Connected to MongoDB");
        Ok(store)
    }

    async fn ensure_indexes(&self) -> Result<(), RepoError> {
        for name in [CHARACTERS, INVENTORIES, WALLETS, STATUS_LOGS, MAPS] {
            let models: Vec<IndexModel> = collection_indexes(name)
                .into_iter()
                .map(|(keys, options)| IndexModel::builder().keys(keys).options(options).build())
                .collect();
            if models.is_empty() {
                continue;
            }
            self.db
                .collection::<Document>(name)
                .create_indexes(models)
                .await
                .map_err(|e| RepoError::database("mongo.create_indexes", e))?;
        }
        Ok(())
    }

    fn collection<T>(&self, name: &str) -> Collection<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        self.db.collection::<T>(name)
    }

    pub fn characters(&self) -> Arc<MongoCharacterRepo> {
        Arc::new(MongoCharacterRepo::new(self.collection(CHARACTERS)))
    }

    pub fn inventories(&self) -> Arc<MongoInventoryRepo> {
        Arc::new(MongoInventoryRepo::new(self.collection(INVENTORIES)))
    }

    pub fn wallets(&self) -> Arc<MongoWalletRepo> {
        Arc::new(MongoWalletRepo::new(self.collection(WALLETS)))
    }

    pub fn status_logs(&self) -> Arc<MongoStatusLogRepo> {
        Arc::new(MongoStatusLogRepo::new(self.collection(STATUS_LOGS)))
    }

    pub fn maps(&self) -> Arc<MongoMapRepo> {
        Arc::new(MongoMapRepo::new(self.client.clone(), self.collection(MAPS)))
    }
}

fn write_error(operation: &'static str, e: mongodb::error::Error) -> RepoError {
    use mongodb::error::{ErrorKind, WriteFailure};
    match e.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(we)) if we.code == 11000 => {
            RepoError::constraint(we.message.clone())
        }
        _ => RepoError::database(operation, e),
    }
}

fn to_bson<T: Serialize>(value: &T) -> Result<bson::Bson, RepoError> {
    bson::to_bson(value).map_err(RepoError::serialization)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_character_collections_get_unique_character_index() {
        let idx = collection_indexes(WALLETS);
        assert_eq!(idx.len(), 1);
        assert_eq!(idx[0].0, doc! { "characterId": 1 });
        assert_eq!(idx[0].1.as_ref().and_then(|o| o.unique), Some(true));
        assert!(collection_indexes("unknown").is_empty());
    }
}
