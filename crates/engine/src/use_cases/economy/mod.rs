//! Wallet and inventory operations.
//!
//! Every balance or quantity change is a single conditional write in the
//! document store; nothing here reads a value and writes it back.

use std::sync::Arc;

use farmstead_domain::{DomainError, InventoryId, UserId, Wallet, WalletId};

use crate::infrastructure::ports::{CharacterLinkRepo, InventoryRepo, RepoError, WalletRepo};
use crate::use_cases::error::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum EconomyError {
    #[error("Validation error: {0}")]
    Validation(#[from] DomainError),
    #[error("Wallet not found: {0}")]
    WalletNotFound(WalletId),
    #[error("Inventory not found: {0}")]
    InventoryNotFound(InventoryId),
    #[error("Insufficient {resource}: required {required}, available {available}")]
    Insufficient {
        resource: String,
        required: u64,
        available: u64,
    },
    #[error("Repository error: {0}")]
    Repo(RepoError),
}

impl EconomyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EconomyError::Validation(_) => ErrorKind::Validation,
            EconomyError::WalletNotFound(_) | EconomyError::InventoryNotFound(_) => {
                ErrorKind::NotFound
            }
            EconomyError::Insufficient { .. } => ErrorKind::InsufficientResource,
            EconomyError::Repo(e) => ErrorKind::of_repo(e),
        }
    }

    fn from_wallet(wallet_id: WalletId, e: RepoError) -> Self {
        match e {
            RepoError::NotFound { .. } => EconomyError::WalletNotFound(wallet_id),
            other => Self::from(other),
        }
    }

    fn from_inventory(inventory_id: InventoryId, e: RepoError) -> Self {
        match e {
            RepoError::NotFound { .. } => EconomyError::InventoryNotFound(inventory_id),
            other => Self::from(other),
        }
    }
}

impl From<RepoError> for EconomyError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::InsufficientResource {
                resource,
                required,
                available,
            } => EconomyError::Insufficient {
                resource,
                required,
                available,
            },
            other => EconomyError::Repo(other),
        }
    }
}

/// Container for economy use cases.
pub struct EconomyUseCases {
    pub wallets: Arc<WalletOps>,
    pub inventories: Arc<InventoryOps>,
}

impl EconomyUseCases {
    pub fn new(wallets: Arc<WalletOps>, inventories: Arc<InventoryOps>) -> Self {
        Self {
            wallets,
            inventories,
        }
    }
}

pub struct WalletOps {
    wallets: Arc<dyn WalletRepo>,
    links: Arc<dyn CharacterLinkRepo>,
}

impl WalletOps {
    pub fn new(wallets: Arc<dyn WalletRepo>, links: Arc<dyn CharacterLinkRepo>) -> Self {
        Self { wallets, links }
    }

    /// Check that `wallet_id` belongs to one of `user_id`'s characters.
    pub async fn ensure_owner(&self, user_id: UserId, wallet_id: WalletId) -> Result<(), EconomyError> {
        self.links
            .get_by_wallet(wallet_id)
            .await?
            .filter(|link| link.user_id == user_id)
            .map(|_| ())
            .ok_or(EconomyError::WalletNotFound(wallet_id))
    }

    pub async fn get(&self, wallet_id: WalletId) -> Result<Wallet, EconomyError> {
        self.wallets
            .get(wallet_id)
            .await?
            .ok_or(EconomyError::WalletNotFound(wallet_id))
    }

    /// Spend `cost` coins. Returns the new balance.
    ///
    /// A wallet that cannot cover the cost is left unchanged.
    pub async fn process_transaction(&self, wallet_id: WalletId, cost: u64) -> Result<u64, EconomyError> {
        if cost == 0 {
            return Err(DomainError::validation("Transaction cost must be greater than zero").into());
        }
        let balance = self
            .wallets
            .debit(wallet_id, cost)
            .await
            .map_err(|e| EconomyError::from_wallet(wallet_id, e))?;
        tracing::info!(wallet_id = %wallet_id, cost, balance, "Transaction processed");
        Ok(balance)
    }

    pub async fn deposit(&self, wallet_id: WalletId, amount: u64) -> Result<u64, EconomyError> {
        if amount == 0 {
            return Err(DomainError::validation("Deposit must be greater than zero").into());
        }
        let balance = self
            .wallets
            .credit(wallet_id, amount)
            .await
            .map_err(|e| EconomyError::from_wallet(wallet_id, e))?;
        tracing::info!(wallet_id = %wallet_id, amount, balance, "Deposit processed");
        Ok(balance)
    }
}

pub struct InventoryOps {
    inventories: Arc<dyn InventoryRepo>,
}

impl InventoryOps {
    pub fn new(inventories: Arc<dyn InventoryRepo>) -> Self {
        Self { inventories }
    }

    pub async fn add_item(
        &self,
        inventory_id: InventoryId,
        item_type: &str,
        item_name: &str,
        quantity: u32,
    ) -> Result<(), EconomyError> {
        validate_item(item_type, item_name, quantity)?;
        self.inventories
            .add_item(inventory_id, item_type, item_name, quantity)
            .await
            .map_err(|e| EconomyError::from_inventory(inventory_id, e))
    }

    /// Remove items. A drained stack stays in the inventory at zero.
    pub async fn deduct_item(
        &self,
        inventory_id: InventoryId,
        item_type: &str,
        item_name: &str,
        quantity: u32,
    ) -> Result<(), EconomyError> {
        validate_item(item_type, item_name, quantity)?;
        self.inventories
            .deduct_item(inventory_id, item_type, item_name, quantity)
            .await
            .map_err(|e| EconomyError::from_inventory(inventory_id, e))
    }
}

fn validate_item(item_type: &str, item_name: &str, quantity: u32) -> Result<(), DomainError> {
    if item_type.trim().is_empty() || item_name.trim().is_empty() {
        return Err(DomainError::validation("Item type and name are required"));
    }
    if quantity == 0 {
        return Err(DomainError::validation("Quantity must be greater than zero"));
    }
    Ok(())
}
