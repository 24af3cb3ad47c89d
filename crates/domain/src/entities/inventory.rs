//! Inventory document - item stacks held by a character

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::{CharacterId, InventoryId};

/// A quantity of one (item type, item name) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStack {
    pub item_type: String,
    pub item_name: String,
    pub quantity: u32,
}

impl ItemStack {
    pub fn new(item_type: impl Into<String>, item_name: impl Into<String>, quantity: u32) -> Self {
        Self {
            item_type: item_type.into(),
            item_name: item_name.into(),
            quantity,
        }
    }

    pub fn is(&self, item_type: &str, item_name: &str) -> bool {
        self.item_type == item_type && self.item_name == item_name
    }
}

/// Ordered list of stacks, at most one per (item type, item name).
///
/// A stack drained to zero stays in the list as a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    pub id: InventoryId,
    pub character_id: CharacterId,
    items: Vec<ItemStack>,
}

impl Inventory {
    pub fn new(character_id: CharacterId) -> Self {
        Self {
            id: InventoryId::new(),
            character_id,
            items: Vec::new(),
        }
    }

    /// Rebuild from stored stacks, rejecting duplicate pairs.
    pub fn from_parts(
        id: InventoryId,
        character_id: CharacterId,
        items: Vec<ItemStack>,
    ) -> Result<Self, DomainError> {
        for (i, stack) in items.iter().enumerate() {
            if items[..i]
                .iter()
                .any(|other| other.is(&stack.item_type, &stack.item_name))
            {
                return Err(DomainError::constraint(format!(
                    "Duplicate inventory stack {}/{}",
                    stack.item_type, stack.item_name
                )));
            }
        }
        Ok(Self {
            id,
            character_id,
            items,
        })
    }

    pub fn items(&self) -> &[ItemStack] {
        &self.items
    }

    pub fn quantity_of(&self, item_type: &str, item_name: &str) -> u32 {
        self.items
            .iter()
            .find(|s| s.is(item_type, item_name))
            .map(|s| s.quantity)
            .unwrap_or(0)
    }

    /// Increment an existing stack in place or append a new one.
    pub fn add(&mut self, item_type: &str, item_name: &str, quantity: u32) {
        match self.items.iter_mut().find(|s| s.is(item_type, item_name)) {
            Some(stack) => stack.quantity = stack.quantity.saturating_add(quantity),
            None => self
                .items
                .push(ItemStack::new(item_type, item_name, quantity)),
        }
    }

    /// Remove `quantity` from a stack. Fails without clamping when short.
    pub fn deduct(
        &mut self,
        item_type: &str,
        item_name: &str,
        quantity: u32,
    ) -> Result<(), DomainError> {
        let available = self.quantity_of(item_type, item_name);
        let stack = self
            .items
            .iter_mut()
            .find(|s| s.is(item_type, item_name))
            .filter(|s| s.quantity >= quantity)
            .ok_or_else(|| {
                DomainError::insufficient(
                    format!("{}/{}", item_type, item_name),
                    u64::from(quantity),
                    u64::from(available),
                )
            })?;
        stack.quantity -= quantity;
        Ok(())
    }
}
