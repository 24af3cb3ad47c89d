use async_trait::async_trait;
use farmstead_domain::{
    CharacterId, CharacterLink, CharacterLinkId, InventoryId, StatusLogId, UserId, WalletId,
};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{map_write_error, parse_timestamp, parse_uuid};
use crate::infrastructure::ports::{CharacterLinkRepo, RepoError};

const LINK_COLUMNS: &str =
    "id, user_id, character_id, inventory_id, wallet_id, status_log_id, created_at";

pub struct SqliteCharacterLinkRepo {
    pool: SqlitePool,
}

impl SqliteCharacterLinkRepo {
    pub(super) fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(
        &self,
        operation: &'static str,
        column: &str,
        value: String,
    ) -> Result<Option<CharacterLink>, RepoError> {
        let sql = format!("SELECT {LINK_COLUMNS} FROM character_links WHERE {column} = ?");
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database(operation, e))?;
        row.as_ref().map(row_to_link).transpose()
    }
}

fn row_to_link(row: &SqliteRow) -> Result<CharacterLink, RepoError> {
    let text = |column: &str| -> Result<String, RepoError> {
        row.try_get::<String, _>(column)
            .map_err(|e| RepoError::serialization(format!("character_links.{column}: {e}")))
    };
    Ok(CharacterLink {
        id: CharacterLinkId::from_uuid(parse_uuid("id", &text("id")?)?),
        user_id: UserId::from_uuid(parse_uuid("user_id", &text("user_id")?)?),
        character_id: CharacterId::from_uuid(parse_uuid("character_id", &text("character_id")?)?),
        inventory_id: InventoryId::from_uuid(parse_uuid("inventory_id", &text("inventory_id")?)?),
        wallet_id: WalletId::from_uuid(parse_uuid("wallet_id", &text("wallet_id")?)?),
        status_log_id: StatusLogId::from_uuid(parse_uuid(
            "status_log_id",
            &text("status_log_id")?,
        )?),
        created_at: parse_timestamp("created_at", &text("created_at")?)?,
    })
}

#[async_trait]
impl CharacterLinkRepo for SqliteCharacterLinkRepo {
    async fn insert(&self, link: &CharacterLink) -> Result<(), RepoError> {
        let result = sqlx::query(
            r#"
            INSERT INTO character_links
                (id, user_id, character_id, inventory_id, wallet_id, status_log_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(link.id.to_string())
        .bind(link.user_id.to_string())
        .bind(link.character_id.to_string())
        .bind(link.inventory_id.to_string())
        .bind(link.wallet_id.to_string())
        .bind(link.status_log_id.to_string())
        .bind(link.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error("character_links.insert", e))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::constraint(format!(
                "character link for {} was not inserted",
                link.character_id
            )));
        }
        Ok(())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<CharacterLink>, RepoError> {
        let sql = format!(
            "SELECT {LINK_COLUMNS} FROM character_links WHERE user_id = ? ORDER BY created_at"
        );
        let rows = sqlx::query(&sql)
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::database("character_links.list_for_user", e))?;
        rows.iter().map(row_to_link).collect()
    }

    async fn get_by_character(
        &self,
        character_id: CharacterId,
    ) -> Result<Option<CharacterLink>, RepoError> {
        self.fetch_one_where(
            "character_links.get_by_character",
            "character_id",
            character_id.to_string(),
        )
        .await
    }

    async fn get_by_wallet(&self, wallet_id: WalletId) -> Result<Option<CharacterLink>, RepoError> {
        self.fetch_one_where(
            "character_links.get_by_wallet",
            "wallet_id",
            wallet_id.to_string(),
        )
        .await
    }

    async fn remove_owned(
        &self,
        character_id: CharacterId,
        user_id: UserId,
    ) -> Result<Option<CharacterLink>, RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("character_links.remove_owned", e))?;

        let sql = format!(
            "DELETE FROM character_links WHERE character_id = ? AND user_id = ? RETURNING {LINK_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(character_id.to_string())
            .bind(user_id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| RepoError::database("character_links.remove_owned", e))?;

        let Some(row) = row else {
            tx.rollback()
                .await
                .map_err(|e| RepoError::database("character_links.remove_owned", e))?;
            return Ok(None);
        };

        // Dropping `tx` on a decode error rolls the delete back.
        let link = row_to_link(&row)?;
        tx.commit()
            .await
            .map_err(|e| RepoError::database("character_links.remove_owned", e))?;

        tracing::info!(
            character_id = %link.character_id,
            user_id = %link.user_id,
            "Character link removed"
        );
        Ok(Some(link))
    }
}
