//! Entity spans (mentions, commands) inside message text.
//!
//! Offsets and lengths are in UTF-16 code units, as reported by Telegram.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    /// `@username` mention.
    Mention,
    /// Mention of a user without a username.
    TextMention { user_id: i64 },
    BotCommand,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntity {
    pub kind: EntityKind,
    pub offset: usize,
    pub length: usize,
}

impl MessageEntity {
    pub fn new(kind: EntityKind, offset: usize, length: usize) -> Self {
        Self { kind, offset, length }
    }

    /// Byte range of this entity in `text`, or None if the span is out of bounds or splits a character.
    pub fn byte_range(&self, text: &str) -> Option<std::ops::Range<usize>> {
        let start = utf16_to_byte(text, self.offset)?;
        let end = utf16_to_byte(text, self.offset + self.length)?;
        Some(start..end)
    }
}

/// Returns the substring covered by `entity`.
pub fn entity_text<'a>(text: &'a str, entity: &MessageEntity) -> Option<&'a str> {
    entity.byte_range(text).map(|r| &text[r])
}

fn utf16_to_byte(text: &str, utf16_offset: usize) -> Option<usize> {
    let mut units = 0;
    for (byte_idx, ch) in text.char_indices() {
        if units == utf16_offset {
            return Some(byte_idx);
        }
        if units > utf16_offset {
            return None;
        }
        units += ch.len_utf16();
    }
    (units == utf16_offset).then_some(text.len())
}
