//! Character document - a farmer owned by a user

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::value_objects::{CharacterName, CropType};
use crate::{CharacterId, UserId};

/// Experience needed per level.
const EXPERIENCE_PER_LEVEL: u64 = 100;

/// Equipment slots a character can fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentSlot {
    Head,
    Body,
    Tool,
}

/// Items currently equipped, by slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    pub head: Option<String>,
    pub body: Option<String>,
    pub tool: Option<String>,
}

impl Equipment {
    pub fn get(&self, slot: EquipmentSlot) -> Option<&str> {
        match slot {
            EquipmentSlot::Head => self.head.as_deref(),
            EquipmentSlot::Body => self.body.as_deref(),
            EquipmentSlot::Tool => self.tool.as_deref(),
        }
    }

    pub fn set(&mut self, slot: EquipmentSlot, item: Option<String>) {
        match slot {
            EquipmentSlot::Head => self.head = item,
            EquipmentSlot::Body => self.body = item,
            EquipmentSlot::Tool => self.tool = item,
        }
    }
}

/// A farmer.
///
/// Name uniqueness per owner is enforced by the creation flow, not here.
/// At most one character per owner should have `is_favorite` set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: CharacterId,
    pub owner_id: UserId,
    pub name: CharacterName,
    pub level: u32,
    pub experience: u64,
    /// Sparse per-crop skill levels; crops not present are level 1.
    pub skills: BTreeMap<CropType, u32>,
    pub equipment: Equipment,
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
}

impl Character {
    pub fn new(owner_id: UserId, name: CharacterName, now: DateTime<Utc>) -> Self {
        Self {
            id: CharacterId::new(),
            owner_id,
            name,
            level: 1,
            experience: 0,
            skills: BTreeMap::new(),
            equipment: Equipment::default(),
            is_favorite: false,
            created_at: now,
        }
    }

    pub fn skill_level(&self, crop: CropType) -> u32 {
        self.skills.get(&crop).copied().unwrap_or(1)
    }

    /// Level implied by an experience total.
    pub fn level_for_experience(experience: u64) -> u32 {
        let level = 1 + experience / EXPERIENCE_PER_LEVEL;
        u32::try_from(level).unwrap_or(u32::MAX)
    }

    /// Add experience and recompute the level. Returns true on level up.
    pub fn gain_experience(&mut self, amount: u64) -> bool {
        let before = self.level;
        self.experience = self.experience.saturating_add(amount);
        self.level = Self::level_for_experience(self.experience);
        self.level > before
    }
}
