use async_trait::async_trait;
use bson::doc;
use farmstead_domain::{Inventory, InventoryId};
use mongodb::Collection;

use super::documents::InventoryDoc;
use super::write_error;
use crate::infrastructure::ports::{InventoryRepo, RepoError};

/// Attempts at the increment-or-append pair before giving up on a contended stack.
const ADD_ITEM_ATTEMPTS: usize = 3;

pub struct MongoInventoryRepo {
    collection: Collection<InventoryDoc>,
}

impl MongoInventoryRepo {
    pub(super) fn new(collection: Collection<InventoryDoc>) -> Self {
        Self { collection }
    }
}

#[async_trait]
impl InventoryRepo for MongoInventoryRepo {
    async fn get(&self, id: InventoryId) -> Result<Option<Inventory>, RepoError> {
        self.collection
            .find_one(doc! { "_id": id.to_string() })
            .await
            .map_err(|e| RepoError::database("inventories.get", e))?
            .map(InventoryDoc::into_domain)
            .transpose()
    }

    async fn insert(&self, inventory: &Inventory) -> Result<(), RepoError> {
        self.collection
            .insert_one(InventoryDoc::from_domain(inventory))
            .await
            .map_err(|e| write_error("inventories.insert", e))?;
        Ok(())
    }

    async fn delete(&self, id: InventoryId) -> Result<bool, RepoError> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id.to_string() })
            .await
            .map_err(|e| RepoError::database("inventories.delete", e))?;
        Ok(result.deleted_count > 0)
    }

    async fn add_item(
        &self,
        id: InventoryId,
        item_type: &str,
        item_name: &str,
        quantity: u32,
    ) -> Result<(), RepoError> {
        let stack = doc! { "itemType": item_type, "itemName": item_name };

        for _ in 0..ADD_ITEM_ATTEMPTS {
            // Existing stack: increment in place.
            let incremented = self
                .collection
                .update_one(
                    doc! { "_id": id.to_string(), "items": { "$elemMatch": stack.clone() } },
                    doc! { "$inc": { "items.$.quantity": i64::from(quantity) } },
                )
                .await
                .map_err(|e| RepoError::database("inventories.add_item", e))?;
            if incremented.matched_count > 0 {
                return Ok(());
            }

            // No stack yet: append, guarded so a concurrent append is not duplicated.
            let appended = self
                .collection
                .update_one(
                    doc! {
                        "_id": id.to_string(),
                        "items": { "$not": { "$elemMatch": stack.clone() } },
                    },
                    doc! { "$push": { "items": {
                        "itemType": item_type,
                        "itemName": item_name,
                        "quantity": i64::from(quantity),
                    } } },
                )
                .await
                .map_err(|e| RepoError::database("inventories.add_item", e))?;
            if appended.matched_count > 0 {
                return Ok(());
            }

            if self.get(id).await?.is_none() {
                return Err(RepoError::not_found("Inventory", id));
            }
        }

        Err(RepoError::database(
            "inventories.add_item",
            format!("stack {item_type}/{item_name} kept changing"),
        ))
    }

    async fn deduct_item(
        &self,
        id: InventoryId,
        item_type: &str,
        item_name: &str,
        quantity: u32,
    ) -> Result<(), RepoError> {
        let result = self
            .collection
            .update_one(
                doc! {
                    "_id": id.to_string(),
                    "items": { "$elemMatch": {
                        "itemType": item_type,
                        "itemName": item_name,
                        "quantity": { "$gte": i64::from(quantity) },
                    } },
                },
                doc! { "$inc": { "items.$.quantity": -i64::from(quantity) } },
            )
            .await
            .map_err(|e| RepoError::database("inventories.deduct_item", e))?;

        if result.matched_count > 0 {
            return Ok(());
        }

        let inventory = self
            .get(id)
            .await?
            .ok_or_else(|| RepoError::not_found("Inventory", id))?;
        Err(RepoError::insufficient(
            format!("{item_type}/{item_name}"),
            u64::from(quantity),
            u64::from(inventory.quantity_of(item_type, item_name)),
        ))
    }
}
