//! Grounding-link repository: `vertex_links` table with a one-shot `sent` flag.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StorageError;
use crate::models::{GroundingLink, MarkSent, VertexLinks, VertexLinksRow};
use crate::repository::LinkStore;
use crate::sqlite_pool::SqlitePoolManager;

#[derive(Clone)]
pub struct LinkRepository {
    pool_manager: SqlitePoolManager,
}

impl LinkRepository {
    pub async fn new(pool_manager: SqlitePoolManager) -> Result<Self, StorageError> {
        let repo = Self { pool_manager };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS vertex_links (
                id TEXT PRIMARY KEY,
                links TEXT NOT NULL,
                sent INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(self.pool_manager.pool())
        .await?;
        Ok(())
    }
}

#[async_trait]
impl LinkStore for LinkRepository {
    async fn insert_links(&self, links: &[GroundingLink]) -> Result<String, StorageError> {
        let id = Uuid::new_v4().to_string();
        let json = serde_json::to_string(links)?;

        sqlx::query("INSERT INTO vertex_links (id, links, sent, created_at) VALUES (?, ?, 0, ?)")
            .bind(&id)
            .bind(&json)
            .bind(Utc::now())
            .execute(self.pool_manager.pool())
            .await?;

        info!(links_id = %id, count = links.len(), "Stored grounding links");
        Ok(id)
    }

    async fn find_links(&self, id: &str) -> Result<Option<VertexLinks>, StorageError> {
        let row = sqlx::query_as::<_, VertexLinksRow>(
            "SELECT id, links, sent, created_at FROM vertex_links WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool_manager.pool())
        .await?;

        row.map(|r| r.into_model().map_err(StorageError::from)).transpose()
    }

    async fn mark_sent(&self, id: &str) -> Result<MarkSent, StorageError> {
        let pool = self.pool_manager.pool();

        let flipped = sqlx::query("UPDATE vertex_links SET sent = 1 WHERE id = ? AND sent = 0")
            .bind(id)
            .execute(pool)
            .await?
            .rows_affected();
        if flipped == 1 {
            debug!(links_id = %id, "Grounding links marked sent");
            return Ok(MarkSent::Marked);
        }

        let exists: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM vertex_links WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(if exists.is_some() {
            MarkSent::AlreadySent
        } else {
            MarkSent::NotFound
        })
    }

    async fn reset_sent(&self, id: &str) -> Result<(), StorageError> {
        sqlx::query("UPDATE vertex_links SET sent = 0 WHERE id = ?")
            .bind(id)
            .execute(self.pool_manager.pool())
            .await?;
        debug!(links_id = %id, "Grounding links released for another delivery");
        Ok(())
    }
}
