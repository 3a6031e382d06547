//! Inline-button press delivered by the transport, and the handler seam for it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::user::User;

/// A press on an inline action attached to a bot message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackEvent {
    /// Transport id of the callback (used to acknowledge it).
    pub id: String,
    /// Opaque payload set when the action was attached.
    pub data: String,
    pub from: User,
    /// Chat and message the button belongs to; absent when the message is no longer accessible.
    pub chat_id: Option<i64>,
    pub message_id: Option<i32>,
}

/// Processes callback presses. The transport acknowledges every press; the returned text, if any, is shown to
/// the presser as the acknowledgement.
#[async_trait]
pub trait CallbackHandler: Send + Sync {
    async fn handle_callback(&self, event: &CallbackEvent) -> crate::error::Result<Option<String>>;
}
