//! Handler-chain members and the callback handler.
//!
//! - [`AllowlistHandler`] – drops messages from chats outside `ALLOWED_CHAT_IDS`
//! - [`CredentialHandler`] – `/addaikey` in private chats
//! - [`ConversationHandler`] – trigger detection and the ask/chat pathways
//! - [`SourcesCallback`] – the "Show sources" button

mod allowlist;
mod ask;
mod chat;
mod conversation;
mod credentials;
mod sources;

use tracing::warn;
use zeno_core::{Bot, Message, SendOptions};

pub use allowlist::AllowlistHandler;
pub use conversation::ConversationHandler;
pub use credentials::{CredentialHandler, ADD_KEY_COMMAND};
pub use sources::SourcesCallback;

/// Replies to `message` with plain text; a failed send is only logged.
pub(crate) async fn reply(bot: &dyn Bot, message: &Message, text: &str) {
    if let Err(e) = bot
        .send_message(message.chat.id, text, &SendOptions::reply_to(message.id))
        .await
    {
        warn!(chat_id = message.chat.id, message_id = message.id, error = %e, "Reply failed");
    }
}
