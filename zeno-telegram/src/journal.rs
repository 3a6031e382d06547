//! Core-message view over the storage journal.
//!
//! The Bot API has no history endpoint, so every message the bot sees or sends is recorded here and history and
//! by-id lookups are answered from it.

use storage::{JournalEntry, JournalRepository, StorageError};
use tracing::warn;
use zeno_core::{Message, Result, ZenoError};

#[derive(Clone)]
pub struct MessageJournal {
    repo: JournalRepository,
}

fn db_err(e: StorageError) -> ZenoError {
    ZenoError::Database(e.to_string())
}

impl MessageJournal {
    pub fn new(repo: JournalRepository) -> Self {
        Self { repo }
    }

    pub async fn record(&self, message: &Message) -> Result<()> {
        let payload = serde_json::to_string(message).map_err(|e| ZenoError::Database(e.to_string()))?;
        self.repo
            .record(&JournalEntry::new(message.chat.id, message.id, payload))
            .await
            .map_err(db_err)
    }

    /// Records `message` only if nothing is journaled under its id yet.
    pub async fn record_if_absent(&self, message: &Message) -> Result<()> {
        let existing = self.repo.find(message.chat.id, &[message.id]).await.map_err(db_err)?;
        if existing.is_empty() {
            self.record(message).await?;
        }
        Ok(())
    }

    /// Newest first, like [`zeno_core::Bot::get_history`].
    pub async fn history(&self, chat_id: i64, before_id: i32, limit: usize) -> Result<Vec<Message>> {
        let entries = self.repo.history(chat_id, before_id, limit).await.map_err(db_err)?;
        Ok(decode_all(entries))
    }

    pub async fn find(&self, chat_id: i64, ids: &[i32]) -> Result<Vec<Message>> {
        let entries = self.repo.find(chat_id, ids).await.map_err(db_err)?;
        Ok(decode_all(entries))
    }

    pub async fn cleanup_older_than(&self, days: i64) -> Result<u64> {
        self.repo.cleanup_older_than(days).await.map_err(db_err)
    }
}

fn decode_all(entries: Vec<JournalEntry>) -> Vec<Message> {
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_str::<Message>(&entry.payload) {
            Ok(message) => Some(message),
            Err(e) => {
                warn!(
                    chat_id = entry.chat_id,
                    message_id = entry.message_id,
                    error = %e,
                    "Skipping undecodable journal entry"
                );
                None
            }
        })
        .collect()
}
