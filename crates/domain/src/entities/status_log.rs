//! Status log document - append-only character activity feed

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{CharacterId, StatusLogId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusType {
    Connected,
    Disconnected,
    Harvest,
    Purchase,
    LevelUp,
    RentPaid,
    TileLeased,
    Info,
}

impl StatusType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusType::Connected => "connected",
            StatusType::Disconnected => "disconnected",
            StatusType::Harvest => "harvest",
            StatusType::Purchase => "purchase",
            StatusType::LevelUp => "levelUp",
            StatusType::RentPaid => "rentPaid",
            StatusType::TileLeased => "tileLeased",
            StatusType::Info => "info",
        }
    }
}

impl fmt::Display for StatusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEntry {
    pub timestamp: DateTime<Utc>,
    pub status_type: StatusType,
    pub details: String,
}

impl StatusEntry {
    pub fn new(status_type: StatusType, details: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            timestamp: now,
            status_type,
            details: details.into(),
        }
    }
}

/// Entries are only ever appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusLog {
    pub id: StatusLogId,
    pub character_id: CharacterId,
    pub entries: Vec<StatusEntry>,
}

impl StatusLog {
    /// New log seeded with a `connected` entry.
    pub fn new(character_id: CharacterId, now: DateTime<Utc>) -> Self {
        Self {
            id: StatusLogId::new(),
            character_id,
            entries: vec![StatusEntry::new(
                StatusType::Connected,
                "Character created",
                now,
            )],
        }
    }

    pub fn append(&mut self, entry: StatusEntry) {
        self.entries.push(entry);
    }

    /// The newest `n` entries, newest first.
    pub fn recent(&self, n: usize) -> Vec<StatusEntry> {
        self.entries.iter().rev().take(n).cloned().collect()
    }
}
