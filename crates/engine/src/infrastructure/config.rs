//! Environment-driven configuration.
//!
//! Every value has a default so a bare `cargo run` against local stores works.
//! Game rule overrides are optional and fall back to [`GameRules::default`].

use chrono::Duration;
use farmstead_domain::GameRules;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a non-negative integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct FarmsteadConfig {
    /// sqlx URL of the link store.
    pub database_url: String,
    pub mongodb_uri: String,
    pub mongodb_db: String,
    pub server_host: String,
    pub server_port: u16,
    pub cors_allowed_origins: Option<String>,
    pub rules: GameRules,
}

impl FarmsteadConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let server_port = get("SERVER_PORT")
            .or_else(|| get("PORT"))
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let mut rules = GameRules::default();
        if let Some(secs) = number(&get, "LEASE_DURATION_SECS")? {
            rules.lease_duration = Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX));
        }
        if let Some(v) = number(&get, "STARTING_COINS")? {
            rules.starting_coins = v;
        }
        if let Some(v) = number(&get, "COST_TO_LEASE_TILE")? {
            rules.cost_to_lease_tile = v;
        }
        if let Some(v) = number(&get, "COST_TO_RENT_TILE")? {
            rules.cost_to_rent_tile = v;
        }
        if let Some(v) = number(&get, "COST_TO_CLEAR_RUBBLE")? {
            rules.cost_to_clear_rubble = v;
        }
        if let Some(v) = number(&get, "COST_TO_SPEED_GROW")? {
            rules.cost_to_speed_grow = v;
        }
        if let Some(v) = number(&get, "MAP_SIZE")? {
            let size = u32::try_from(v).unwrap_or(u32::MAX);
            rules.map_width = size;
            rules.map_height = size;
        }

        Ok(Self {
            database_url: get("DATABASE_URL")
                .unwrap_or_else(|| "sqlite:farmstead.db?mode=rwc".into()),
            mongodb_uri: get("MONGODB_URI").unwrap_or_else(|| "mongodb://localhost:27017".into()),
            mongodb_db: get("MONGODB_DB").unwrap_or_else(|| "farmstead".into()),
            server_host: get("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            server_port,
            cors_allowed_origins: get("CORS_ALLOWED_ORIGINS"),
            rules,
        })
    }
}

fn number(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<u64>, ConfigError> {
    get(key)
        .map(|value| {
            value
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidNumber { key, value })
        })
        .transpose()
}
