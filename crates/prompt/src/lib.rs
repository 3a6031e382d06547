//! # Prompt
//!
//! Renders chat context into a single delimited transcript for AI models.
//!
//! ## Format
//!
//! - **Chat context** (optional): history turns, oldest first, each as `speaker\ntext`, inside a fenced block
//! - **Replied to** (optional): the message the trigger replies to, in its own fenced block
//! - **Trigger**: ``user `name` Asked:`` (or `Said:`) followed by the query in a fenced block
//!
//! Fences inside message text are neutralized so user content cannot close a block early.
//!
//! ## External interactions
//!
//! - **AI models**: Output is sent to chat-completion and multimodal generation APIs.

/// Role of a message, one-to-one with OpenAI Chat Completions API `role` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A single chat message, one-to-one with one element of OpenAI `messages` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// One history entry: normalized display name and text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    pub speaker: String,
    pub text: String,
}

impl ConversationTurn {
    pub fn new(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
        }
    }
}

/// How the triggering message is introduced: a direct question or a remark in an ongoing reply thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerVerb {
    Asked,
    Said,
}

impl TriggerVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerVerb::Asked => "Asked",
            TriggerVerb::Said => "Said",
        }
    }
}

/// Section title for the history block.
pub const SECTION_HISTORY: &str = "Chat context:";

/// Section title for the replied-to block.
pub const SECTION_REPLIED_TO: &str = "Replied to:";

const FENCE: &str = "```";

fn neutralize(text: &str) -> String {
    text.replace(FENCE, "'''")
}

/// Renders history turns (oldest first) as the "Chat context" block. Empty history renders nothing.
pub fn format_history(turns: &[ConversationTurn]) -> String {
    if turns.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    out.push_str(SECTION_HISTORY);
    out.push('\n');
    out.push_str(FENCE);
    out.push('\n');
    for turn in turns {
        out.push_str(&neutralize(&turn.speaker));
        out.push('\n');
        out.push_str(&neutralize(&turn.text));
        out.push('\n');
    }
    out.push_str(FENCE);
    out.push('\n');
    out
}

/// Renders the replied-to message block.
pub fn format_replied_to(turn: &ConversationTurn) -> String {
    format!(
        "{}\n{}\n{}\n{}\n{}\n",
        SECTION_REPLIED_TO,
        FENCE,
        neutralize(&turn.speaker),
        neutralize(&turn.text),
        FENCE
    )
}

/// Renders the triggering message block. Empty text renders nothing.
pub fn format_trigger(speaker: &str, verb: TriggerVerb, text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    format!(
        "user `{}` {}:\n{}\n{}\n{}\n",
        neutralize(speaker).replace('`', "'"),
        verb.as_str(),
        FENCE,
        neutralize(text),
        FENCE
    )
}

/// Concatenates history, replied-to and trigger blocks in that order.
pub fn render_transcript(
    history: &[ConversationTurn],
    replied_to: Option<&ConversationTurn>,
    trigger: Option<(&str, TriggerVerb, &str)>,
) -> String {
    let mut out = format_history(history);
    if let Some(turn) = replied_to {
        out.push_str(&format_replied_to(turn));
    }
    if let Some((speaker, verb, text)) = trigger {
        out.push_str(&format_trigger(speaker, verb, text));
    }
    out
}

/// System message (if any) followed by the transcript as a single user message.
pub fn transcript_messages(system_message: Option<&str>, transcript: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::new();
    if let Some(msg) = system_message {
        messages.push(ChatMessage::system(msg));
    }
    messages.push(ChatMessage::user(transcript));
    messages
}
