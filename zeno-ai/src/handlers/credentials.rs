use std::sync::Arc;

use async_trait::async_trait;
use storage::CredentialStore;
use tracing::{error, info, instrument};
use zeno_core::{Bot, Handler, HandlerResponse, Message, PeerRef, Result, Sender};

use super::reply;
use crate::context::ASK_PROVIDER;

pub const ADD_KEY_COMMAND: &str = "addaikey";

const MSG_USAGE: &str =
    "Usage: /addaikey <your_cerebras_api_key>\n\nGet your API key from: https://cloud.cerebras.ai/platform/";
const MSG_SAVE_FAILED: &str = "Error saving API key. Try again.";
const MSG_SAVED: &str = "Cerebras API key saved successfully! You can now use /askai in groups.";

/// Numeric user id of the author, when the author is a user.
pub(crate) fn author_user_id(message: &Message) -> Option<i64> {
    match &message.sender {
        Some(Sender::User(user)) => Some(user.id),
        Some(Sender::Peer(PeerRef::User(id))) => Some(*id),
        _ => None,
    }
}

/// `/addaikey <key>`: stores the sender's ask-pathway key. Private chats only; elsewhere the command is ignored.
pub struct CredentialHandler {
    bot: Arc<dyn Bot>,
    credentials: Arc<dyn CredentialStore>,
}

impl CredentialHandler {
    pub fn new(bot: Arc<dyn Bot>, credentials: Arc<dyn CredentialStore>) -> Self {
        Self { bot, credentials }
    }
}

#[async_trait]
impl Handler for CredentialHandler {
    #[instrument(skip(self, message), fields(chat_id = message.chat.id))]
    async fn handle(&self, message: &Message) -> Result<HandlerResponse> {
        let Some((name, _, args)) = message.command() else {
            return Ok(HandlerResponse::Continue);
        };
        if !name.eq_ignore_ascii_case(ADD_KEY_COMMAND) || !message.chat.is_private() {
            return Ok(HandlerResponse::Continue);
        }

        let key = args.trim();
        let Some(user_id) = author_user_id(message) else {
            return Ok(HandlerResponse::Handled);
        };
        if key.is_empty() {
            reply(self.bot.as_ref(), message, MSG_USAGE).await;
            return Ok(HandlerResponse::Handled);
        }

        match self.credentials.upsert_api_key(user_id, ASK_PROVIDER, key).await {
            Ok(()) => {
                info!(user_id, provider = ASK_PROVIDER, "API key saved");
                reply(self.bot.as_ref(), message, MSG_SAVED).await;
            }
            Err(e) => {
                error!(user_id, error = %e, "Failed to save API key");
                reply(self.bot.as_ref(), message, MSG_SAVE_FAILED).await;
            }
        }
        Ok(HandlerResponse::Handled)
    }
}
