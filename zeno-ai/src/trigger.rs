//! Trigger detection: decides whether a message engages the orchestrator and extracts the effective query.
//!
//! Rules, first match wins:
//! 1. the ask command (`/askai`, optionally addressed `/askai@bot`), query = command arguments;
//! 2. the inline trigger token (`@ask`, case-insensitive) anywhere in the text, query = text without it;
//! 3. a reply to a message whose sender is the bot account, query = the full text;
//! 4. a mention entity naming the bot, query = text without the mention.
//!
//! Command-prefixed text never reaches rules 2 to 4.

use regex::Regex;
use tracing::debug;
use zeno_core::{entity_text, Bot, EntityKind, Message};

use crate::context::BotIdentity;

pub const ASK_COMMAND: &str = "askai";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pathway {
    /// Per-user key, stateless completion, plain text.
    Ask,
    /// Service key, tool loop with grounding, Markdown.
    Chat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    AskCommand { query: String },
    InlineMention { query: String },
    ReplyToBot { query: String },
    HandleMention { query: String },
}

impl Trigger {
    pub fn query(&self) -> &str {
        match self {
            Trigger::AskCommand { query }
            | Trigger::InlineMention { query }
            | Trigger::ReplyToBot { query }
            | Trigger::HandleMention { query } => query,
        }
    }

    pub fn pathway(&self) -> Pathway {
        match self {
            Trigger::AskCommand { .. } | Trigger::ReplyToBot { .. } => Pathway::Ask,
            Trigger::InlineMention { .. } | Trigger::HandleMention { .. } => Pathway::Chat,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Trigger::AskCommand { .. } => "ask_command",
            Trigger::InlineMention { .. } => "inline_mention",
            Trigger::ReplyToBot { .. } => "reply_to_bot",
            Trigger::HandleMention { .. } => "handle_mention",
        }
    }
}

/// Removes `range` from `text`, joining the two sides with a single space.
pub fn remove_span(text: &str, range: std::ops::Range<usize>) -> String {
    let left = text[..range.start].trim_end();
    let right = text[range.end..].trim_start();
    match (left.is_empty(), right.is_empty()) {
        (true, _) => right.trim_end().to_string(),
        (false, true) => left.trim_start().to_string(),
        (false, false) => format!("{} {}", left.trim_start(), right.trim_end()),
    }
}

pub struct TriggerDetector {
    identity: BotIdentity,
    inline: Regex,
}

impl TriggerDetector {
    pub fn new(identity: BotIdentity, inline_trigger: &str) -> Result<Self, regex::Error> {
        let pattern = format!(r"(?i)(?:^|\s)({})(?:$|\s|[,.!?:;])", regex::escape(inline_trigger));
        Ok(Self {
            identity,
            inline: Regex::new(&pattern)?,
        })
    }

    pub fn identity(&self) -> &BotIdentity {
        &self.identity
    }

    pub async fn detect(&self, message: &Message, bot: &dyn Bot) -> Option<Trigger> {
        if message.is_command() {
            return self.command_trigger(message);
        }
        if let Some(query) = self.inline_query(&message.text) {
            return Some(Trigger::InlineMention { query });
        }
        if self.replies_to_bot(message, bot).await {
            return Some(Trigger::ReplyToBot {
                query: message.text.trim().to_string(),
            });
        }
        self.handle_mention_query(message)
            .map(|query| Trigger::HandleMention { query })
    }

    fn command_trigger(&self, message: &Message) -> Option<Trigger> {
        let (name, target, args) = message.command()?;
        if !name.eq_ignore_ascii_case(ASK_COMMAND) {
            return None;
        }
        if let Some(target) = target {
            if !target.eq_ignore_ascii_case(&self.identity.username) {
                return None;
            }
        }
        Some(Trigger::AskCommand {
            query: args.to_string(),
        })
    }

    fn inline_query(&self, text: &str) -> Option<String> {
        let captures = self.inline.captures(text)?;
        let token = captures.get(1)?;
        Some(remove_span(text, token.range()))
    }

    async fn replies_to_bot(&self, message: &Message, bot: &dyn Bot) -> bool {
        let Some(reply_id) = message.reply_to_message_id else {
            return false;
        };
        if message.text.trim().is_empty() {
            return false;
        }
        match bot.get_messages_by_ids(message.chat.id, &[reply_id]).await {
            Ok(found) => found
                .iter()
                .find(|m| m.id == reply_id)
                .and_then(Message::sender_id)
                .is_some_and(|id| id == self.identity.user_id),
            Err(e) => {
                debug!(chat_id = message.chat.id, reply_id, error = %e, "Reply target lookup failed");
                false
            }
        }
    }

    fn handle_mention_query(&self, message: &Message) -> Option<String> {
        let handle = format!("@{}", self.identity.username);
        message.entities.iter().find_map(|entity| {
            let names_bot = match &entity.kind {
                EntityKind::Mention => entity_text(&message.text, entity)
                    .is_some_and(|t| !self.identity.username.is_empty() && t.eq_ignore_ascii_case(&handle)),
                EntityKind::TextMention { user_id } => *user_id == self.identity.user_id,
                _ => false,
            };
            if !names_bot {
                return None;
            }
            let range = entity.byte_range(&message.text)?;
            Some(remove_span(&message.text, range))
        })
    }
}
