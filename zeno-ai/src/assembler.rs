//! Context assembly: recent history, the replied-to message and the trigger rendered into one transcript, plus
//! media attachments within the size cap.
//!
//! Every fetch failure degrades to "nothing" for that piece; the direct query alone is still answerable.

use std::sync::Arc;

use llm_client::Attachment;
use prompt::{render_transcript, ConversationTurn, TriggerVerb};
use tracing::{debug, info, warn};
use zeno_core::{display_name, Bot, Chat, Message, PeerRef, Sender};

use crate::mime;

pub const GROUP_HISTORY_LIMIT: usize = 20;
pub const PRIVATE_HISTORY_LIMIT: usize = 30;
/// Extra messages fetched to make up for filtered ones.
const HISTORY_OVERFETCH: usize = 5;
/// Window scanned when the direct by-id lookup fails.
const REPLY_FALLBACK_WINDOW: usize = 10;

#[derive(Debug, Clone, Default)]
pub struct AssembledContext {
    pub transcript: String,
    pub attachments: Vec<Attachment>,
    pub history: Vec<ConversationTurn>,
    pub replied_to: Option<Message>,
}

impl AssembledContext {
    /// Nothing to answer: no history, no reply target and no query.
    pub fn is_empty(&self) -> bool {
        self.transcript.trim().is_empty()
    }
}

pub fn history_limit(chat: &Chat) -> usize {
    if chat.is_private() {
        PRIVATE_HISTORY_LIMIT
    } else {
        GROUP_HISTORY_LIMIT
    }
}

#[derive(Clone)]
pub struct ContextAssembler {
    bot: Arc<dyn Bot>,
    max_media_size: u64,
}

impl ContextAssembler {
    pub fn new(bot: Arc<dyn Bot>, max_media_size: u64) -> Self {
        Self { bot, max_media_size }
    }

    /// Display name for a message's sender; raw user references are resolved through the transport.
    pub async fn speaker(&self, message: &Message) -> String {
        match &message.sender {
            Some(Sender::Peer(PeerRef::User(id))) => match self.bot.get_user(*id).await {
                Ok(Some(user)) => display_name(&user),
                _ => format!("User_{}", id),
            },
            Some(sender) => sender.display_name(),
            None => "Unknown".to_string(),
        }
    }

    /// Prior messages, oldest first, without the trigger, its reply target, empty texts and commands.
    pub async fn history(&self, trigger: &Message) -> Vec<ConversationTurn> {
        let limit = history_limit(&trigger.chat);
        let fetched = match self
            .bot
            .get_history(trigger.chat.id, trigger.id, limit + HISTORY_OVERFETCH)
            .await
        {
            Ok(messages) => messages,
            Err(e) => {
                warn!(chat_id = trigger.chat.id, error = %e, "History fetch failed, continuing without it");
                return Vec::new();
            }
        };

        let mut kept: Vec<Message> = fetched
            .into_iter()
            .filter(|m| m.id != trigger.id && Some(m.id) != trigger.reply_to_message_id)
            .filter(|m| !m.text.trim().is_empty() && !m.is_command())
            .take(limit)
            .collect();
        kept.sort_by_key(|m| m.id);

        let mut turns = Vec::with_capacity(kept.len());
        for m in &kept {
            turns.push(ConversationTurn::new(self.speaker(m).await, m.text.clone()));
        }
        debug!(chat_id = trigger.chat.id, count = turns.len(), "History assembled");
        turns
    }

    /// One message by id: direct lookup first, then a history window ending at it.
    pub async fn fetch_message(&self, chat_id: i64, message_id: i32) -> Option<Message> {
        match self.bot.get_messages_by_ids(chat_id, &[message_id]).await {
            Ok(found) => {
                if let Some(m) = found.into_iter().find(|m| m.id == message_id) {
                    return Some(m);
                }
            }
            Err(e) if e.is_unsupported() => debug!(chat_id, message_id, "No direct lookup, trying history window"),
            Err(e) => warn!(chat_id, message_id, error = %e, "Direct lookup failed, trying history window"),
        }
        match self
            .bot
            .get_history(chat_id, message_id.saturating_add(1), REPLY_FALLBACK_WINDOW)
            .await
        {
            Ok(window) => window.into_iter().find(|m| m.id == message_id),
            Err(e) => {
                warn!(chat_id, message_id, error = %e, "Reply target unavailable");
                None
            }
        }
    }

    /// Downloads a message's media if it fits the cap. Oversized or undownloadable media yields None.
    pub async fn attachment(&self, message: &Message) -> Option<Attachment> {
        let media = message.media.as_ref()?;
        if media.file_size.is_some_and(|size| size > self.max_media_size) {
            info!(
                chat_id = message.chat.id,
                message_id = message.id,
                size = ?media.file_size,
                cap = self.max_media_size,
                "Media over size cap, skipping"
            );
            return None;
        }
        let bytes = match self.bot.download_media(media).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(chat_id = message.chat.id, message_id = message.id, error = %e, "Media download failed");
                return None;
            }
        };
        if bytes.len() as u64 > self.max_media_size {
            info!(message_id = message.id, size = bytes.len(), "Downloaded media over size cap, dropping");
            return None;
        }
        let file_name = media.display_file_name();
        let mime_type = mime::classify(media.mime_type.as_deref(), &file_name, &bytes);
        Some(Attachment {
            bytes,
            mime_type,
            file_name,
        })
    }

    /// Builds the full request context for `trigger`. `with_media` enables attachments (multimodal providers).
    pub async fn assemble(&self, trigger: &Message, query: &str, verb: TriggerVerb, with_media: bool) -> AssembledContext {
        let history = self.history(trigger).await;

        let replied_to = match trigger.reply_to_message_id {
            Some(id) => self.fetch_message(trigger.chat.id, id).await,
            None => None,
        };
        let replied_turn = match &replied_to {
            Some(m) => {
                let text = if m.text.trim().is_empty() {
                    m.media
                        .as_ref()
                        .map(|media| format!("[{}]", media.display_file_name()))
                        .unwrap_or_default()
                } else {
                    m.text.clone()
                };
                Some(ConversationTurn::new(self.speaker(m).await, text))
            }
            None => None,
        };

        let speaker = self.speaker(trigger).await;
        let mut transcript = render_transcript(&history, replied_turn.as_ref(), Some((&speaker, verb, query)));

        let mut attachments = Vec::new();
        if with_media {
            for source in std::iter::once(trigger).chain(replied_to.as_ref()) {
                if let Some(attachment) = self.attachment(source).await {
                    transcript.push_str(&format!("Attached file: {}\n", attachment.file_name));
                    attachments.push(attachment);
                }
            }
        }

        AssembledContext {
            transcript,
            attachments,
            history,
            replied_to,
        }
    }
}
