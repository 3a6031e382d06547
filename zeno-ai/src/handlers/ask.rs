//! Ask pathway: `/askai` and replies to the bot. Per-user Cerebras key, one stateless completion, plain text with
//! `[IMAGE: …]` directives handed to the image worker.

use llm_client::{GenerationRequest, ProviderError, ASK_SAMPLING, ASK_TIMEOUT};
use prompt::TriggerVerb;
use storage::StorageError;
use tracing::{debug, info, warn};
use zeno_core::Message;

use super::credentials::author_user_id;
use super::reply;
use crate::context::{AppContext, ASK_PROVIDER};
use crate::error::AiError;
use crate::prompts::ask_system_prompt;
use crate::reconciler::{FinalAnswer, Reconciler, Rendering};
use crate::trigger::Trigger;

const MSG_NO_KEY: &str =
    "Add your Cerebras API key first.\nGet key: https://cloud.cerebras.ai/platform/\nThen DM me: /addaikey <yourkey>";
const MSG_LOOKUP_FAILED: &str = "Something went wrong. Try again.";
const MSG_USAGE: &str = "Usage: /askai <query> or reply to a message with /askai";
const MSG_REQUEST_FAILED: &str = "AI request failed. Try again.";
const MSG_SERVICE_ERROR: &str = "AI service error. Try again later.";
const MSG_PARSE_FAILED: &str = "Failed to parse AI response.";
const MSG_EMPTY: &str = "AI returned empty response.";
const MSG_REPLY_EMPTY: &str = "No response from AI.";
const TITLE_CHARS: usize = 60;

fn failure_message(e: &ProviderError) -> &'static str {
    match e {
        ProviderError::Transport(_) | ProviderError::Timeout(_) | ProviderError::Unsupported(_) => MSG_REQUEST_FAILED,
        ProviderError::Status { .. } => MSG_SERVICE_ERROR,
        ProviderError::Malformed(_) => MSG_PARSE_FAILED,
        ProviderError::EmptyResult => MSG_EMPTY,
    }
}

/// A usable stored key, [`AiError::Auth`] when there is none, [`AiError::Persistence`] when the lookup failed.
fn require_key(lookup: Result<Option<String>, StorageError>) -> Result<String, AiError> {
    match lookup? {
        Some(key) if !key.trim().is_empty() => Ok(key),
        Some(_) => Err(AiError::Auth("stored key is blank".to_string())),
        None => Err(AiError::Auth("no key stored".to_string())),
    }
}

pub(crate) fn answer_title(query: &str) -> String {
    let query = query.trim();
    if query.is_empty() {
        return "Answer".to_string();
    }
    query.chars().take(TITLE_CHARS).collect()
}

pub(crate) async fn answer(
    ctx: &AppContext,
    reconciler: &Reconciler,
    message: &Message,
    trigger: &Trigger,
) -> Result<(), AiError> {
    let is_command = matches!(trigger, Trigger::AskCommand { .. });
    let user_id = author_user_id(message);

    let lookup = match user_id {
        Some(id) => ctx.credentials.find_api_key(id, ASK_PROVIDER).await,
        None => Ok(None),
    };
    let api_key = match require_key(lookup) {
        Ok(key) => key,
        Err(AiError::Auth(reason)) => {
            if is_command {
                reply(ctx.bot.as_ref(), message, MSG_NO_KEY).await;
            } else {
                debug!(user_id = ?user_id, reason = %reason, "Ignoring reply to bot");
            }
            return Ok(());
        }
        Err(e) => {
            warn!(user_id = ?user_id, error = %e, "API key lookup failed");
            if is_command {
                reply(ctx.bot.as_ref(), message, MSG_LOOKUP_FAILED).await;
            }
            return Ok(());
        }
    };

    let verb = if is_command { TriggerVerb::Asked } else { TriggerVerb::Said };
    let context = ctx.assembler().assemble(message, trigger.query(), verb, false).await;
    if is_command && trigger.query().trim().is_empty() && context.replied_to.is_none() && context.history.is_empty() {
        reply(ctx.bot.as_ref(), message, MSG_USAGE).await;
        return Ok(());
    }

    let placeholder = reconciler.open(message.chat.id, message.id).await?;
    let model = if is_command {
        &ctx.config.ask_model
    } else {
        &ctx.config.reply_model
    };
    let request = GenerationRequest::new(model.as_str(), context.transcript)
        .with_system_prompt(ask_system_prompt(&ctx.identity.username))
        .with_sampling(ASK_SAMPLING)
        .with_timeout(ASK_TIMEOUT);
    info!(
        user_id = ?user_id,
        model = %model,
        history = context.history.len(),
        replied_to = context.replied_to.is_some(),
        "Ask request"
    );

    let empty_message = if is_command { MSG_EMPTY } else { MSG_REPLY_EMPTY };
    let response = match ctx.ask_gateways.for_key(&api_key).generate(&request).await {
        Ok(response) => response,
        Err(ProviderError::EmptyResult) => {
            placeholder.fail(empty_message).await;
            return Ok(());
        }
        Err(e) => {
            warn!(user_id = ?user_id, model = %model, error = %e, "Ask request failed");
            placeholder.fail(failure_message(&e)).await;
            return Err(e.into());
        }
    };

    let result = placeholder
        .finish(FinalAnswer {
            text: response.text,
            rendering: Rendering::Plain,
            sources_id: None,
            image_directives: true,
            title: answer_title(trigger.query()),
        })
        .await;
    match result {
        Err(AiError::EmptyResult) => {
            placeholder.fail(empty_message).await;
            Ok(())
        }
        other => other,
    }
}
