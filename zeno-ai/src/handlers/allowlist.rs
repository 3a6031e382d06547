use async_trait::async_trait;
use tracing::debug;
use zeno_core::{Handler, Message, Result};

use super::credentials::ADD_KEY_COMMAND;

/// Stops the chain for chats outside the allowlist. An empty list allows every chat; the credential command in a
/// private chat always passes so users can register keys wherever they are.
pub struct AllowlistHandler {
    allowed: Vec<i64>,
}

impl AllowlistHandler {
    pub fn new(allowed: Vec<i64>) -> Self {
        Self { allowed }
    }

    fn allows(&self, message: &Message) -> bool {
        if self.allowed.is_empty() || self.allowed.contains(&message.chat.id) {
            return true;
        }
        message.chat.is_private()
            && matches!(message.command(), Some((name, _, _)) if name.eq_ignore_ascii_case(ADD_KEY_COMMAND))
    }
}

#[async_trait]
impl Handler for AllowlistHandler {
    async fn before(&self, message: &Message) -> Result<bool> {
        let allowed = self.allows(message);
        if !allowed {
            debug!(chat_id = message.chat.id, "Chat not in allowlist, ignoring");
        }
        Ok(allowed)
    }
}
