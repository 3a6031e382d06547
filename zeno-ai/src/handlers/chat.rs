//! Chat pathway: inline `@ask` and mentions of the bot. Service key, tool loop with optional grounding, Markdown.

use llm_client::{GenerationRequest, CHAT_SAMPLING, CHAT_TIMEOUT};
use prompt::TriggerVerb;
use tracing::{info, warn};
use zeno_core::Message;

use super::ask::answer_title;
use crate::context::AppContext;
use crate::error::AiError;
use crate::prompts::CHAT_SYSTEM_PROMPT;
use crate::reconciler::{FinalAnswer, Reconciler, Rendering};
use crate::tools::{tool_specs, ToolTarget};
use crate::trigger::Trigger;

const MSG_NOTHING_TO_ANSWER: &str = "Ask me something!";
const MSG_TIMED_OUT: &str = "AI took too long to respond. Try again later.";
const MSG_SERVICE_ERROR: &str = "AI service error. Try again later.";
const MSG_EMPTY: &str = "AI returned empty response.";
const MSG_DONE: &str = "Done.";
const MSG_DELIVERY_FAILED: &str = "Failed to send the answer. Try again.";

fn failure_message(e: &AiError) -> &'static str {
    match e {
        AiError::Timeout(_) => MSG_TIMED_OUT,
        AiError::EmptyResult => MSG_EMPTY,
        _ => MSG_SERVICE_ERROR,
    }
}

pub(crate) async fn answer(
    ctx: &AppContext,
    reconciler: &Reconciler,
    message: &Message,
    trigger: &Trigger,
) -> Result<(), AiError> {
    let placeholder = reconciler.open(message.chat.id, message.id).await?;

    let context = ctx
        .assembler()
        .assemble(message, trigger.query(), TriggerVerb::Asked, true)
        .await;
    if context.is_empty() {
        placeholder.fail(MSG_NOTHING_TO_ANSWER).await;
        return Ok(());
    }

    let request = GenerationRequest::new(ctx.config.default_model.as_str(), context.transcript)
        .with_system_prompt(CHAT_SYSTEM_PROMPT)
        .with_attachments(context.attachments)
        .with_sampling(CHAT_SAMPLING)
        .with_tools(tool_specs())
        .with_grounding(ctx.config.enable_grounding)
        .with_timeout(CHAT_TIMEOUT);
    info!(
        model = %ctx.config.default_model,
        history = context.history.len(),
        attachments = request.attachments.len(),
        grounding = request.grounding,
        "Chat request"
    );

    let target = ToolTarget {
        chat_id: message.chat.id,
        reply_to: Some(message.id),
    };
    let outcome = match ctx.tool_loop().run(request, target, &placeholder).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(error = %e, "Chat exchange failed");
            placeholder.fail(failure_message(&e)).await;
            return Err(e);
        }
    };

    if outcome.text.trim().is_empty() {
        let text = if outcome.tool_calls > 0 { MSG_DONE } else { MSG_EMPTY };
        placeholder.fail(text).await;
        return Ok(());
    }

    let result = placeholder
        .finish(FinalAnswer {
            text: outcome.text,
            rendering: Rendering::Markdown,
            sources_id: outcome.sources_id,
            image_directives: false,
            title: answer_title(trigger.query()),
        })
        .await;
    if let Err(e) = &result {
        warn!(error = %e, "Final answer delivery failed");
        placeholder.fail(MSG_DELIVERY_FAILED).await;
    }
    result
}
