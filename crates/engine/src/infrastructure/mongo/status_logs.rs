use async_trait::async_trait;
use bson::doc;
use farmstead_domain::{StatusEntry, StatusLog, StatusLogId};
use mongodb::Collection;

use super::documents::{StatusEntryDoc, StatusLogDoc};
use super::{to_bson, write_error};
use crate::infrastructure::ports::{RepoError, StatusLogRepo};

pub struct MongoStatusLogRepo {
    collection: Collection<StatusLogDoc>,
}

impl MongoStatusLogRepo {
    pub(super) fn new(collection: Collection<StatusLogDoc>) -> Self {
        Self { collection }
    }
}

#[async_trait]
impl StatusLogRepo for MongoStatusLogRepo {
    async fn get(&self, id: StatusLogId) -> Result<Option<StatusLog>, RepoError> {
        self.collection
            .find_one(doc! { "_id": id.to_string() })
            .await
            .map_err(|e| RepoError::database("status_logs.get", e))?
            .map(StatusLogDoc::into_domain)
            .transpose()
    }

    async fn insert(&self, log: &StatusLog) -> Result<(), RepoError> {
        self.collection
            .insert_one(StatusLogDoc::from_domain(log))
            .await
            .map_err(|e| write_error("status_logs.insert", e))?;
        Ok(())
    }

    async fn delete(&self, id: StatusLogId) -> Result<bool, RepoError> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id.to_string() })
            .await
            .map_err(|e| RepoError::database("status_logs.delete", e))?;
        Ok(result.deleted_count > 0)
    }

    async fn append(&self, id: StatusLogId, entry: &StatusEntry) -> Result<(), RepoError> {
        let entry = to_bson(&StatusEntryDoc::from(entry))?;
        let result = self
            .collection
            .update_one(
                doc! { "_id": id.to_string() },
                doc! { "$push": { "entries": entry } },
            )
            .await
            .map_err(|e| RepoError::database("status_logs.append", e))?;
        if result.matched_count == 0 {
            return Err(RepoError::not_found("StatusLog", id));
        }
        Ok(())
    }
}
