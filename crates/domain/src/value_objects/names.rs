//! Validated name newtypes and the farmer name generator
//!
//! Names are valid by construction:
//! - Non-empty after trimming
//! - Within length limits
//! - Trimmed of leading/trailing whitespace

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Maximum length for character names
const MAX_CHARACTER_NAME_LENGTH: usize = 32;

/// Maximum length for map nicknames
const MAX_NICKNAME_LENGTH: usize = 64;

// ============================================================================
// CharacterName
// ============================================================================

/// A validated character name (non-empty, <=32 chars, trimmed)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CharacterName(String);

impl CharacterName {
    /// Create a new validated character name.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the name is empty or longer than
    /// 32 characters after trimming.
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("Character name cannot be empty"));
        }
        if trimmed.chars().count() > MAX_CHARACTER_NAME_LENGTH {
            return Err(DomainError::validation(format!(
                "Character name cannot exceed {} characters",
                MAX_CHARACTER_NAME_LENGTH
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison used for per-owner uniqueness.
    pub fn collides_with(&self, other: &str) -> bool {
        self.0.to_lowercase() == other.trim().to_lowercase()
    }
}

impl fmt::Display for CharacterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for CharacterName {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<CharacterName> for String {
    fn from(name: CharacterName) -> String {
        name.0
    }
}

// ============================================================================
// MapNickname
// ============================================================================

/// A validated map nickname (non-empty, <=64 chars, trimmed)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MapNickname(String);

impl MapNickname {
    pub fn new(nickname: impl Into<String>) -> Result<Self, DomainError> {
        let nickname = nickname.into();
        let trimmed = nickname.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("Map nickname cannot be empty"));
        }
        if trimmed.chars().count() > MAX_NICKNAME_LENGTH {
            return Err(DomainError::validation(format!(
                "Map nickname cannot exceed {} characters",
                MAX_NICKNAME_LENGTH
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Default nickname for a character's farm.
    pub fn for_character(name: &CharacterName) -> Self {
        let candidate = format!("{}'s Farm", name.as_str());
        match Self::new(candidate) {
            Ok(nickname) => nickname,
            Err(_) => Self("Farm".to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MapNickname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for MapNickname {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<MapNickname> for String {
    fn from(nickname: MapNickname) -> String {
        nickname.0
    }
}

// ============================================================================
// Name generation
// ============================================================================

const NAME_PREFIXES: &[&str] = &[
    "Sunny", "Dusty", "Clover", "Maple", "Barley", "Hazel", "Rusty", "Willow", "Briar", "Meadow",
    "Pepper", "Juniper", "Thistle", "Acorn", "Bramble", "Fern",
];

const NAME_SUFFIXES: &[&str] = &[
    "Turnip", "Furrow", "Haybale", "Sprout", "Plough", "Orchard", "Gourd", "Harvest", "Sickle",
    "Millstone", "Paddock", "Scarecrow",
];

/// Generate a farmer name from the built-in word lists.
///
/// `pick(len)` must return an index in `0..len`; out-of-range values wrap.
pub fn generate_farmer_name(mut pick: impl FnMut(usize) -> usize) -> CharacterName {
    let prefix = NAME_PREFIXES[pick(NAME_PREFIXES.len()) % NAME_PREFIXES.len()];
    let suffix = NAME_SUFFIXES[pick(NAME_SUFFIXES.len()) % NAME_SUFFIXES.len()];
    // Word lists are short and non-empty, so the joined name always validates.
    CharacterName(format!("{} {}", prefix, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn character_name_is_trimmed() {
        let name = CharacterName::new("  Bo  ").unwrap();
        assert_eq!(name.as_str(), "Bo");
    }

    #[test]
    fn character_name_rejects_blank_and_long() {
        assert!(CharacterName::new("   ").is_err());
        assert!(CharacterName::new("x".repeat(33)).is_err());
        assert!(CharacterName::new("x".repeat(32)).is_ok());
    }

    #[test]
    fn collision_is_case_insensitive() {
        let name = CharacterName::new("Bo").unwrap();
        assert!(name.collides_with("bO"));
        assert!(name.collides_with(" BO "));
        assert!(!name.collides_with("Bob"));
    }

    #[test]
    fn generator_uses_injected_picks() {
        let mut picks = vec![0usize, 1].into_iter();
        let name = generate_farmer_name(|_| picks.next().unwrap_or(0));
        assert_eq!(name.as_str(), "Sunny Furrow");
    }

    #[test]
    fn generator_wraps_out_of_range_picks() {
        let name = generate_farmer_name(|len| len + 2);
        assert_eq!(name.as_str(), "Maple Haybale");
    }

    #[test]
    fn default_nickname_uses_character_name() {
        let name = CharacterName::new("Bo").unwrap();
        assert_eq!(MapNickname::for_character(&name).as_str(), "Bo's Farm");
    }
}
