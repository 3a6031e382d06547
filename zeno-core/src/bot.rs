//! Messaging abstraction: history lookups, media download, send/edit with reply threading and inline actions.
//!
//! [`Bot`] is transport-agnostic; `zeno-telegram` implements it with teloxide and tests substitute mocks.

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Media, Message, User};

/// How the transport should interpret outgoing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextFormat {
    #[default]
    Plain,
    /// Telegram-flavoured HTML subset (`b`, `i`, `s`, `u`, `code`, `pre`, `a`, `blockquote`).
    Html,
}

/// A single inline button; pressing it delivers `data` back as a callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineAction {
    pub label: String,
    pub data: String,
}

impl InlineAction {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}

/// Options for [`Bot::send_message`] and [`Bot::edit_message`]. `reply_to` is ignored on edits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendOptions {
    pub reply_to: Option<i32>,
    pub format: TextFormat,
    pub action: Option<InlineAction>,
}

impl SendOptions {
    pub fn reply_to(message_id: i32) -> Self {
        Self {
            reply_to: Some(message_id),
            ..Self::default()
        }
    }

    pub fn with_format(mut self, format: TextFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_action(mut self, action: Option<InlineAction>) -> Self {
        self.action = action;
        self
    }
}

/// Messaging collaborator used by the orchestrator.
#[async_trait]
pub trait Bot: Send + Sync {
    /// Up to `limit` messages of `chat_id` with id lower than `before_id`, newest first.
    async fn get_history(&self, chat_id: i64, before_id: i32, limit: usize) -> Result<Vec<Message>>;

    /// Direct lookup by id. May return [`crate::ZenoError::Unsupported`] when the transport cannot serve it.
    async fn get_messages_by_ids(&self, chat_id: i64, ids: &[i32]) -> Result<Vec<Message>>;

    /// Resolves a raw user reference. Default: not resolvable.
    async fn get_user(&self, _user_id: i64) -> Result<Option<User>> {
        Ok(None)
    }

    /// Downloads the bytes of a message's media.
    async fn download_media(&self, media: &Media) -> Result<Vec<u8>>;

    /// Sends a text message and returns its id (for later edits).
    async fn send_message(&self, chat_id: i64, text: &str, options: &SendOptions) -> Result<i32>;

    /// Replaces the text (and inline action) of a sent message.
    async fn edit_message(&self, chat_id: i64, message_id: i32, text: &str, options: &SendOptions) -> Result<()>;

    /// Removes inline actions from a sent message.
    async fn clear_actions(&self, chat_id: i64, message_id: i32) -> Result<()>;

    /// Sends a file as a document (never as an inline preview).
    async fn send_document(&self, chat_id: i64, path: &Path, caption: &str, reply_to: Option<i32>) -> Result<()>;

    /// Sends an image file as a photo.
    async fn send_photo(&self, chat_id: i64, path: &Path, caption: &str, reply_to: Option<i32>) -> Result<()>;
}
