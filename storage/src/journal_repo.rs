//! Message journal: the transport records what it sees so history and by-id lookups can be served locally.

use chrono::Utc;
use tracing::info;

use crate::error::StorageError;
use crate::models::JournalEntry;
use crate::sqlite_pool::SqlitePoolManager;

#[derive(Clone)]
pub struct JournalRepository {
    pool_manager: SqlitePoolManager,
}

impl JournalRepository {
    pub async fn new(pool_manager: SqlitePoolManager) -> Result<Self, StorageError> {
        let repo = Self { pool_manager };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS journal (
                chat_id INTEGER NOT NULL,
                message_id INTEGER NOT NULL,
                payload TEXT NOT NULL,
                recorded_at TEXT NOT NULL,
                PRIMARY KEY (chat_id, message_id)
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_journal_recorded_at ON journal(recorded_at)")
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Inserts or replaces the entry for `(chat_id, message_id)`; edits overwrite earlier payloads.
    pub async fn record(&self, entry: &JournalEntry) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO journal (chat_id, message_id, payload, recorded_at) VALUES (?, ?, ?, ?)
            ON CONFLICT(chat_id, message_id) DO UPDATE SET
                payload = excluded.payload,
                recorded_at = excluded.recorded_at
            "#,
        )
        .bind(entry.chat_id)
        .bind(entry.message_id)
        .bind(&entry.payload)
        .bind(entry.recorded_at)
        .execute(self.pool_manager.pool())
        .await?;
        Ok(())
    }

    /// Entries of `chat_id` whose id is in `ids`, in ascending id order. Unknown ids are skipped.
    pub async fn find(&self, chat_id: i64, ids: &[i32]) -> Result<Vec<JournalEntry>, StorageError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT chat_id, message_id, payload, recorded_at FROM journal \
             WHERE chat_id = ? AND message_id IN ({}) ORDER BY message_id ASC",
            placeholders
        );

        let mut query = sqlx::query_as::<_, JournalEntry>(&sql).bind(chat_id);
        for id in ids {
            query = query.bind(*id);
        }
        Ok(query.fetch_all(self.pool_manager.pool()).await?)
    }

    /// Up to `limit` entries of `chat_id` with id lower than `before_id`, newest first.
    pub async fn history(&self, chat_id: i64, before_id: i32, limit: usize) -> Result<Vec<JournalEntry>, StorageError> {
        let entries = sqlx::query_as::<_, JournalEntry>(
            "SELECT chat_id, message_id, payload, recorded_at FROM journal \
             WHERE chat_id = ? AND message_id < ? ORDER BY message_id DESC LIMIT ?",
        )
        .bind(chat_id)
        .bind(before_id)
        .bind(limit as i64)
        .fetch_all(self.pool_manager.pool())
        .await?;
        Ok(entries)
    }

    /// Deletes entries recorded more than `days` days ago; returns the number removed.
    pub async fn cleanup_older_than(&self, days: i64) -> Result<u64, StorageError> {
        let cutoff = Utc::now() - chrono::Duration::days(days);
        let result = sqlx::query("DELETE FROM journal WHERE recorded_at < ?")
            .bind(cutoff)
            .execute(self.pool_manager.pool())
            .await?;

        info!(removed = result.rows_affected(), days, "Pruned message journal");
        Ok(result.rows_affected())
    }
}
