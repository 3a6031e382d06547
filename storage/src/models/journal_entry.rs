//! Message journal entry. Maps to the `journal` table.
//!
//! The payload is an opaque JSON document owned by the transport layer; storage only indexes it by
//! `(chat_id, message_id)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JournalEntry {
    pub chat_id: i64,
    pub message_id: i32,
    pub payload: String,
    pub recorded_at: DateTime<Utc>,
}

impl JournalEntry {
    pub fn new(chat_id: i64, message_id: i32, payload: String) -> Self {
        Self {
            chat_id,
            message_id,
            payload,
            recorded_at: Utc::now(),
        }
    }
}
