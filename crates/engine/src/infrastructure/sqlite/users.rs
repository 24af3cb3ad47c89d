use async_trait::async_trait;
use farmstead_domain::{User, UserId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{map_write_error, parse_timestamp, parse_uuid};
use crate::infrastructure::ports::{RepoError, UserRepo};

pub struct SqliteUserRepo {
    pool: SqlitePool,
}

impl SqliteUserRepo {
    pub(super) fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_user(row: &SqliteRow) -> Result<User, RepoError> {
    let id: String = row.get("id");
    let created_at: String = row.get("created_at");
    Ok(User {
        id: UserId::from_uuid(parse_uuid("users.id", &id)?),
        username: row.get("username"),
        email: row.get("email"),
        created_at: parse_timestamp("users.created_at", &created_at)?,
    })
}

#[async_trait]
impl UserRepo for SqliteUserRepo {
    async fn get(&self, id: UserId) -> Result<Option<User>, RepoError> {
        let row = sqlx::query("SELECT id, username, email, created_at FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("users.get", e))?;
        row.as_ref().map(row_to_user).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let row =
            sqlx::query("SELECT id, username, email, created_at FROM users WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| RepoError::database("users.find_by_username", e))?;
        row.as_ref().map(row_to_user).transpose()
    }

    async fn create(&self, user: &User) -> Result<(), RepoError> {
        sqlx::query("INSERT INTO users (id, username, email, created_at) VALUES (?, ?, ?, ?)")
            .bind(user.id.to_string())
            .bind(&user.username)
            .bind(&user.email)
            .bind(user.created_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_error("users.create", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::temp_store;
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn create_then_lookup_by_id_and_username() {
        let (store, _dir) = temp_store().await;
        let users = store.users();
        let user = User::new("bo", "bo@example.com", Utc::now());
        users.create(&user).await.unwrap();

        let by_id = users.get(user.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "bo");
        let by_name = users.find_by_username("bo").await.unwrap().unwrap();
        assert_eq!(by_name.id, user.id);
        assert!(users.find_by_username("al").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_username_is_a_constraint_violation() {
        let (store, _dir) = temp_store().await;
        let users = store.users();
        users
            .create(&User::new("bo", "bo@example.com", Utc::now()))
            .await
            .unwrap();
        let err = users
            .create(&User::new("bo", "other@example.com", Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::ConstraintViolation(_)));
    }
}
