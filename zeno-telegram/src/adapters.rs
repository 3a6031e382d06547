//! Adapters from Telegram (teloxide) types to zeno_core types.
//! Depends only on teloxide and zeno_core type definitions.

use teloxide::types::{CallbackQuery, MessageEntityKind};
use zeno_core::{
    CallbackEvent, Chat, ChatKind, EntityKind, Media, MediaKind, Message, MessageEntity, PeerRef, Sender, User,
};

/// Wraps a teloxide User for conversion to core [`User`].
pub struct TelegramUserWrapper<'a>(pub &'a teloxide::types::User);

impl<'a> TelegramUserWrapper<'a> {
    pub fn to_core(&self) -> User {
        User {
            id: self.0.id.0 as i64,
            username: self.0.username.clone(),
            first_name: Some(self.0.first_name.clone()).filter(|n| !n.is_empty()),
            last_name: self.0.last_name.clone(),
            is_bot: self.0.is_bot,
        }
    }
}

/// Wraps a teloxide Message for conversion to core [`Message`].
pub struct TelegramMessageWrapper<'a>(pub &'a teloxide::types::Message);

impl<'a> TelegramMessageWrapper<'a> {
    pub fn to_core(&self) -> Message {
        let msg = self.0;
        let (text, entities) = match msg.text() {
            Some(text) => (text, msg.entities()),
            None => (msg.caption().unwrap_or(""), msg.caption_entities()),
        };

        Message {
            id: msg.id.0,
            chat: Chat::new(msg.chat.id.0, self.chat_kind()),
            sender: self.sender(),
            text: text.to_string(),
            reply_to_message_id: msg.reply_to_message().map(|m| m.id.0),
            entities: entities.map(convert_entities).unwrap_or_default(),
            media: self.media(),
            created_at: msg.date,
        }
    }

    fn chat_kind(&self) -> ChatKind {
        if self.0.chat.is_private() {
            ChatKind::Private
        } else if self.0.chat.is_channel() {
            ChatKind::Channel
        } else {
            ChatKind::Group
        }
    }

    /// Anonymous admins and channel posts carry `sender_chat`; those win over the placeholder `from`.
    fn sender(&self) -> Option<Sender> {
        if let Some(chat) = self.0.sender_chat.as_ref() {
            let peer = if chat.is_channel() {
                PeerRef::Channel(chat.id.0)
            } else {
                PeerRef::Chat(chat.id.0)
            };
            return Some(Sender::Peer(peer));
        }
        self.0
            .from
            .as_ref()
            .map(|u| Sender::User(TelegramUserWrapper(u).to_core()))
    }

    fn media(&self) -> Option<Media> {
        let msg = self.0;
        if let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) {
            return Some(Media {
                kind: MediaKind::Photo,
                file_id: photo.file.id.to_string(),
                file_name: None,
                mime_type: Some("image/jpeg".to_string()),
                file_size: Some(photo.file.size as u64),
            });
        }
        if let Some(doc) = msg.document() {
            return Some(Media {
                kind: MediaKind::Document,
                file_id: doc.file.id.to_string(),
                file_name: doc.file_name.clone(),
                mime_type: doc.mime_type.as_ref().map(|m| m.to_string()),
                file_size: Some(doc.file.size as u64),
            });
        }
        if let Some(video) = msg.video() {
            return Some(Media {
                kind: MediaKind::Video,
                file_id: video.file.id.to_string(),
                file_name: video.file_name.clone(),
                mime_type: video.mime_type.as_ref().map(|m| m.to_string()),
                file_size: Some(video.file.size as u64),
            });
        }
        if let Some(audio) = msg.audio() {
            return Some(Media {
                kind: MediaKind::Audio,
                file_id: audio.file.id.to_string(),
                file_name: audio.file_name.clone(),
                mime_type: audio.mime_type.as_ref().map(|m| m.to_string()),
                file_size: Some(audio.file.size as u64),
            });
        }
        if let Some(voice) = msg.voice() {
            return Some(Media {
                kind: MediaKind::Voice,
                file_id: voice.file.id.to_string(),
                file_name: None,
                mime_type: voice.mime_type.as_ref().map(|m| m.to_string()),
                file_size: Some(voice.file.size as u64),
            });
        }
        if let Some(sticker) = msg.sticker() {
            return Some(Media {
                kind: MediaKind::Sticker,
                file_id: sticker.file.id.to_string(),
                file_name: None,
                mime_type: None,
                file_size: Some(sticker.file.size as u64),
            });
        }
        None
    }
}

fn convert_entities(entities: &[teloxide::types::MessageEntity]) -> Vec<MessageEntity> {
    entities
        .iter()
        .map(|e| {
            let kind = match &e.kind {
                MessageEntityKind::Mention => EntityKind::Mention,
                MessageEntityKind::TextMention { user } => EntityKind::TextMention {
                    user_id: user.id.0 as i64,
                },
                MessageEntityKind::BotCommand => EntityKind::BotCommand,
                _ => EntityKind::Other,
            };
            MessageEntity::new(kind, e.offset, e.length)
        })
        .collect()
}

/// Converts an inline-button press; `data` is empty when Telegram sent none.
pub fn callback_to_core(query: &CallbackQuery) -> CallbackEvent {
    CallbackEvent {
        id: query.id.to_string(),
        data: query.data.clone().unwrap_or_default(),
        from: TelegramUserWrapper(&query.from).to_core(),
        chat_id: query.message.as_ref().map(|m| m.chat().id.0),
        message_id: query.message.as_ref().map(|m| m.id().0),
    }
}
