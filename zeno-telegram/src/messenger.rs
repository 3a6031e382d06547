//! Wraps teloxide::Bot and implements [`zeno_core::Bot`]. History and by-id lookups are served from the
//! [`MessageJournal`]; everything the bot sends is journaled so replies to it can be recognised later.

use std::path::Path;

use async_trait::async_trait;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{
    FileId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId, ParseMode, ReplyParameters,
};
use teloxide::{ApiError, RequestError};
use tracing::{debug, warn};
use zeno_core::{Bot as CoreBot, InlineAction, Media, Message, Result, SendOptions, TextFormat, ZenoError};

use crate::adapters::TelegramMessageWrapper;
use crate::journal::MessageJournal;

fn bot_err(e: impl std::fmt::Display) -> ZenoError {
    ZenoError::Bot(e.to_string())
}

fn keyboard(action: &InlineAction) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        action.label.clone(),
        action.data.clone(),
    )]])
}

fn is_markup_error(e: &RequestError) -> bool {
    e.to_string().to_lowercase().contains("can't parse entities")
}

fn is_not_modified(e: &RequestError) -> bool {
    matches!(e, RequestError::Api(ApiError::MessageNotModified))
}

/// Plain-text rendering of Telegram HTML: tags dropped, the four escaped entities restored.
pub fn strip_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

/// teloxide-backed messaging collaborator.
pub struct TelegramMessenger {
    bot: teloxide::Bot,
    journal: MessageJournal,
}

impl TelegramMessenger {
    pub fn new(bot: teloxide::Bot, journal: MessageJournal) -> Self {
        Self { bot, journal }
    }

    /// Returns the underlying teloxide::Bot for direct API use when needed.
    pub fn inner(&self) -> &teloxide::Bot {
        &self.bot
    }

    pub fn journal(&self) -> &MessageJournal {
        &self.journal
    }

    /// Journals an incoming message (and its embedded reply target) and returns its core form.
    pub async fn observe(&self, msg: &teloxide::types::Message) -> Message {
        if let Some(target) = msg.reply_to_message() {
            let target = TelegramMessageWrapper(target).to_core();
            if let Err(e) = self.journal.record_if_absent(&target).await {
                warn!(chat_id = target.chat.id, message_id = target.id, error = %e, "Failed to journal reply target");
            }
        }
        let core = TelegramMessageWrapper(msg).to_core();
        self.remember(&core).await;
        core
    }

    async fn remember(&self, message: &Message) {
        if let Err(e) = self.journal.record(message).await {
            warn!(chat_id = message.chat.id, message_id = message.id, error = %e, "Failed to journal message");
        }
    }

    async fn remember_sent(&self, sent: &teloxide::types::Message) {
        self.remember(&TelegramMessageWrapper(sent).to_core()).await;
    }

    async fn request_send(
        &self,
        chat_id: i64,
        text: &str,
        options: &SendOptions,
        parse_mode: Option<ParseMode>,
    ) -> std::result::Result<teloxide::types::Message, RequestError> {
        let mut req = self.bot.send_message(ChatId(chat_id), text.to_string());
        if let Some(id) = options.reply_to {
            req = req.reply_parameters(ReplyParameters::new(MessageId(id)));
        }
        if let Some(mode) = parse_mode {
            req = req.parse_mode(mode);
        }
        if let Some(action) = &options.action {
            req = req.reply_markup(keyboard(action));
        }
        req.await
    }

    async fn request_edit(
        &self,
        chat_id: i64,
        message_id: i32,
        text: &str,
        options: &SendOptions,
        parse_mode: Option<ParseMode>,
    ) -> std::result::Result<teloxide::types::Message, RequestError> {
        let mut req = self
            .bot
            .edit_message_text(ChatId(chat_id), MessageId(message_id), text.to_string());
        if let Some(mode) = parse_mode {
            req = req.parse_mode(mode);
        }
        if let Some(action) = &options.action {
            req = req.reply_markup(keyboard(action));
        }
        req.await
    }
}

#[async_trait]
impl CoreBot for TelegramMessenger {
    async fn get_history(&self, chat_id: i64, before_id: i32, limit: usize) -> Result<Vec<Message>> {
        self.journal.history(chat_id, before_id, limit).await
    }

    async fn get_messages_by_ids(&self, chat_id: i64, ids: &[i32]) -> Result<Vec<Message>> {
        self.journal.find(chat_id, ids).await
    }

    async fn download_media(&self, media: &Media) -> Result<Vec<u8>> {
        let file = self
            .bot
            .get_file(FileId(media.file_id.clone()))
            .await
            .map_err(bot_err)?;
        let mut data = Vec::new();
        self.bot
            .download_file(&file.path, &mut data)
            .await
            .map_err(bot_err)?;
        debug!(file_id = %media.file_id, size = data.len(), "Downloaded media");
        Ok(data)
    }

    async fn send_message(&self, chat_id: i64, text: &str, options: &SendOptions) -> Result<i32> {
        let sent = match options.format {
            TextFormat::Plain => self.request_send(chat_id, text, options, None).await.map_err(bot_err)?,
            TextFormat::Html => match self.request_send(chat_id, text, options, Some(ParseMode::Html)).await {
                Ok(sent) => sent,
                Err(e) if is_markup_error(&e) => {
                    warn!(chat_id, error = %e, "HTML rejected, resending as plain text");
                    self.request_send(chat_id, &strip_html(text), options, None)
                        .await
                        .map_err(bot_err)?
                }
                Err(e) => return Err(bot_err(e)),
            },
        };
        self.remember_sent(&sent).await;
        Ok(sent.id.0)
    }

    async fn edit_message(&self, chat_id: i64, message_id: i32, text: &str, options: &SendOptions) -> Result<()> {
        let result = match options.format {
            TextFormat::Plain => self.request_edit(chat_id, message_id, text, options, None).await,
            TextFormat::Html => match self
                .request_edit(chat_id, message_id, text, options, Some(ParseMode::Html))
                .await
            {
                Err(e) if is_markup_error(&e) => {
                    warn!(chat_id, message_id, error = %e, "HTML rejected, editing as plain text");
                    self.request_edit(chat_id, message_id, &strip_html(text), options, None)
                        .await
                }
                other => other,
            },
        };
        match result {
            Ok(edited) => {
                self.remember_sent(&edited).await;
                Ok(())
            }
            Err(e) if is_not_modified(&e) => Ok(()),
            Err(e) => Err(bot_err(e)),
        }
    }

    async fn clear_actions(&self, chat_id: i64, message_id: i32) -> Result<()> {
        match self
            .bot
            .edit_message_reply_markup(ChatId(chat_id), MessageId(message_id))
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if is_not_modified(&e) => Ok(()),
            Err(e) => Err(bot_err(e)),
        }
    }

    async fn send_document(&self, chat_id: i64, path: &Path, caption: &str, reply_to: Option<i32>) -> Result<()> {
        let mut req = self
            .bot
            .send_document(ChatId(chat_id), InputFile::file(path.to_path_buf()))
            .caption(caption.to_string())
            .disable_content_type_detection(true);
        if let Some(id) = reply_to {
            req = req.reply_parameters(ReplyParameters::new(MessageId(id)));
        }
        let sent = req.await.map_err(bot_err)?;
        self.remember_sent(&sent).await;
        Ok(())
    }

    async fn send_photo(&self, chat_id: i64, path: &Path, caption: &str, reply_to: Option<i32>) -> Result<()> {
        let mut req = self
            .bot
            .send_photo(ChatId(chat_id), InputFile::file(path.to_path_buf()))
            .caption(caption.to_string());
        if let Some(id) = reply_to {
            req = req.reply_parameters(ReplyParameters::new(MessageId(id)));
        }
        let sent = req.await.map_err(bot_err)?;
        self.remember_sent(&sent).await;
        Ok(())
    }
}
