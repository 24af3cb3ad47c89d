//! SQLite-backed link store: user accounts and character link rows.

mod character_links;
mod users;

pub use character_links::SqliteCharacterLinkRepo;
pub use users::SqliteUserRepo;

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use uuid::Uuid;

use crate::infrastructure::ports::RepoError;

/// Shared pool plus schema bootstrap for both link-store repositories.
#[derive(Clone)]
pub struct SqliteLinkStore {
    pool: SqlitePool,
}

impl SqliteLinkStore {
    /// Connect to `database_url` (e.g. `sqlite:farmstead.db?mode=rwc`) and create tables.
    pub async fn connect(database_url: &str) -> Result<Self, RepoError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| RepoError::database("link_store", e))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| RepoError::database("link_store", e))?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("link_store", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS character_links (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id),
                character_id TEXT NOT NULL UNIQUE,
                inventory_id TEXT NOT NULL,
                wallet_id TEXT NOT NULL,
                status_log_id TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("link_store", e))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_character_links_user ON character_links(user_id)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("link_store", e))?;

        Ok(())
    }

    pub fn users(&self) -> Arc<SqliteUserRepo> {
        Arc::new(SqliteUserRepo::new(self.pool.clone()))
    }

    pub fn character_links(&self) -> Arc<SqliteCharacterLinkRepo> {
        Arc::new(SqliteCharacterLinkRepo::new(self.pool.clone()))
    }
}

fn parse_uuid(column: &str, value: &str) -> Result<Uuid, RepoError> {
    Uuid::parse_str(value)
        .map_err(|e| RepoError::serialization(format!("{column} is not a uuid: {e}")))
}

fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>, RepoError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepoError::serialization(format!("{column} is not a timestamp: {e}")))
}

/// Unique-key violations surface as `ConstraintViolation`, everything else as `Database`.
fn map_write_error(operation: &'static str, e: sqlx::Error) -> RepoError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() || db.is_foreign_key_violation() => {
            RepoError::constraint(db.message())
        }
        _ => RepoError::database(operation, e),
    }
}

#[cfg(test)]
pub(crate) async fn temp_store() -> (SqliteLinkStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}?mode=rwc", dir.path().join("links.db").display());
    let store = SqliteLinkStore::connect(&url).await.unwrap();
    (store, dir)
}
