//! Wallet document

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::{CharacterId, WalletId};

/// Coin balance of a character. Never negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub id: WalletId,
    pub character_id: CharacterId,
    pub coins: u64,
}

impl Wallet {
    pub fn new(character_id: CharacterId, coins: u64) -> Self {
        Self {
            id: WalletId::new(),
            character_id,
            coins,
        }
    }

    pub fn can_afford(&self, cost: u64) -> bool {
        self.coins >= cost
    }

    pub fn debit(&mut self, cost: u64) -> Result<(), DomainError> {
        if !self.can_afford(cost) {
            return Err(DomainError::insufficient("coins", cost, self.coins));
        }
        self.coins -= cost;
        Ok(())
    }

    pub fn credit(&mut self, amount: u64) {
        self.coins = self.coins.saturating_add(amount);
    }
}
