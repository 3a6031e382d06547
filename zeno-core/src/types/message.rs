//! Message type for the core model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    chat::Chat,
    entity::MessageEntity,
    media::Media,
    user::Sender,
};

/// A single chat message. `text` holds the text or, for media messages, the caption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i32,
    pub chat: Chat,
    pub sender: Option<Sender>,
    pub text: String,
    pub reply_to_message_id: Option<i32>,
    pub entities: Vec<MessageEntity>,
    pub media: Option<Media>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Plain text message with no entities, media or reply target.
    pub fn text(id: i32, chat: Chat, sender: Option<Sender>, text: impl Into<String>) -> Self {
        Self {
            id,
            chat,
            sender,
            text: text.into(),
            reply_to_message_id: None,
            entities: Vec::new(),
            media: None,
            created_at: Utc::now(),
        }
    }

    pub fn sender_id(&self) -> Option<i64> {
        self.sender.as_ref().map(|s| s.id())
    }

    /// True if the text starts with the command prefix `/`.
    pub fn is_command(&self) -> bool {
        self.text.starts_with('/')
    }

    /// Splits a command message into `(name, addressed_to, args)`.
    ///
    /// `/askai@ZenoBot what's up` → `("askai", Some("ZenoBot"), "what's up")`. Returns None for non-commands.
    pub fn command(&self) -> Option<(&str, Option<&str>, &str)> {
        let rest = self.text.strip_prefix('/')?;
        let (head, args) = match rest.find(char::is_whitespace) {
            Some(idx) => (&rest[..idx], rest[idx..].trim()),
            None => (rest, ""),
        };
        if head.is_empty() {
            return None;
        }
        let (name, target) = match head.split_once('@') {
            Some((name, target)) => (name, Some(target)),
            None => (head, None),
        };
        Some((name, target, args))
    }
}
