use async_trait::async_trait;
use bson::doc;
use farmstead_domain::{Wallet, WalletId};
use mongodb::options::ReturnDocument;
use mongodb::Collection;

use super::documents::WalletDoc;
use super::write_error;
use crate::infrastructure::ports::{RepoError, WalletRepo};

pub struct MongoWalletRepo {
    collection: Collection<WalletDoc>,
}

impl MongoWalletRepo {
    pub(super) fn new(collection: Collection<WalletDoc>) -> Self {
        Self { collection }
    }

    fn amount(value: u64) -> Result<i64, RepoError> {
        i64::try_from(value).map_err(|_| RepoError::serialization("coin amount out of range"))
    }
}

#[async_trait]
impl WalletRepo for MongoWalletRepo {
    async fn get(&self, id: WalletId) -> Result<Option<Wallet>, RepoError> {
        self.collection
            .find_one(doc! { "_id": id.to_string() })
            .await
            .map_err(|e| RepoError::database("wallets.get", e))?
            .map(WalletDoc::into_domain)
            .transpose()
    }

    async fn insert(&self, wallet: &Wallet) -> Result<(), RepoError> {
        self.collection
            .insert_one(WalletDoc::from_domain(wallet)?)
            .await
            .map_err(|e| write_error("wallets.insert", e))?;
        Ok(())
    }

    async fn delete(&self, id: WalletId) -> Result<bool, RepoError> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id.to_string() })
            .await
            .map_err(|e| RepoError::database("wallets.delete", e))?;
        Ok(result.deleted_count > 0)
    }

    async fn debit(&self, id: WalletId, cost: u64) -> Result<u64, RepoError> {
        let cost_i = Self::amount(cost)?;
        let updated = self
            .collection
            .find_one_and_update(
                doc! { "_id": id.to_string(), "coins": { "$gte": cost_i } },
                doc! { "$inc": { "coins": -cost_i } },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| RepoError::database("wallets.debit", e))?;

        match updated {
            Some(doc) => Ok(doc.into_domain()?.coins),
            None => {
                // Filter missed: either no wallet or not enough coins.
                let wallet = self
                    .get(id)
                    .await?
                    .ok_or_else(|| RepoError::not_found("Wallet", id))?;
                Err(RepoError::insufficient("coins", cost, wallet.coins))
            }
        }
    }

    async fn credit(&self, id: WalletId, amount: u64) -> Result<u64, RepoError> {
        let updated = self
            .collection
            .find_one_and_update(
                doc! { "_id": id.to_string() },
                doc! { "$inc": { "coins": Self::amount(amount)? } },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| RepoError::database("wallets.credit", e))?
            .ok_or_else(|| RepoError::not_found("Wallet", id))?;
        Ok(updated.into_domain()?.coins)
    }
}
