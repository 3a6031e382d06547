//! Credential repository: per-user provider keys in the `credentials` table.

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use crate::error::StorageError;
use crate::models::UserCredential;
use crate::repository::CredentialStore;
use crate::sqlite_pool::SqlitePoolManager;

#[derive(Clone)]
pub struct CredentialRepository {
    pool_manager: SqlitePoolManager,
}

impl CredentialRepository {
    /// Wraps the pool and creates the table if missing.
    pub async fn new(pool_manager: SqlitePoolManager) -> Result<Self, StorageError> {
        let repo = Self { pool_manager };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS credentials (
                user_id INTEGER NOT NULL,
                provider TEXT NOT NULL,
                api_key TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (user_id, provider)
            )
            "#,
        )
        .execute(self.pool_manager.pool())
        .await?;
        Ok(())
    }

    pub async fn find(&self, user_id: i64, provider: &str) -> Result<Option<UserCredential>, StorageError> {
        let credential = sqlx::query_as::<_, UserCredential>(
            "SELECT user_id, provider, api_key, updated_at FROM credentials WHERE user_id = ? AND provider = ?",
        )
        .bind(user_id)
        .bind(provider)
        .fetch_optional(self.pool_manager.pool())
        .await?;
        Ok(credential)
    }
}

#[async_trait]
impl CredentialStore for CredentialRepository {
    async fn upsert_api_key(&self, user_id: i64, provider: &str, api_key: &str) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO credentials (user_id, provider, api_key, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id, provider) DO UPDATE SET
                api_key = excluded.api_key,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(provider)
        .bind(api_key)
        .bind(Utc::now())
        .execute(self.pool_manager.pool())
        .await?;

        info!(user_id, provider = %provider, "Stored API key");
        Ok(())
    }

    async fn find_api_key(&self, user_id: i64, provider: &str) -> Result<Option<String>, StorageError> {
        Ok(self.find(user_id, provider).await?.map(|c| c.api_key))
    }
}
