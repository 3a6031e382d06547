use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, instrument};
use zeno_core::{Handler, HandlerResponse, Message, Result};

use super::{ask, chat};
use crate::context::AppContext;
use crate::reconciler::Reconciler;
use crate::trigger::{Pathway, TriggerDetector};

/// Runs one exchange per triggering message. Messages that trigger nothing pass through untouched.
///
/// **External interactions:** messaging collaborator (history, placeholder, edits, files), credential and link
/// stores, provider gateways, image queue.
pub struct ConversationHandler {
    ctx: Arc<AppContext>,
    detector: TriggerDetector,
    reconciler: Reconciler,
}

impl ConversationHandler {
    pub fn new(ctx: Arc<AppContext>) -> std::result::Result<Self, regex::Error> {
        let detector = TriggerDetector::new(ctx.identity.clone(), &ctx.config.inline_trigger)?;
        let reconciler = Reconciler::new(ctx.bot.clone(), ctx.image_queue.clone(), ctx.publisher.clone());
        Ok(Self {
            ctx,
            detector,
            reconciler,
        })
    }
}

#[async_trait]
impl Handler for ConversationHandler {
    #[instrument(skip(self, message), fields(chat_id = message.chat.id, message_id = message.id))]
    async fn handle(&self, message: &Message) -> Result<HandlerResponse> {
        if message.sender_id() == Some(self.ctx.identity.user_id) {
            return Ok(HandlerResponse::Continue);
        }
        let Some(trigger) = self.detector.detect(message, self.ctx.bot.as_ref()).await else {
            return Ok(HandlerResponse::Continue);
        };

        info!(
            user_id = ?message.sender_id(),
            trigger = trigger.name(),
            query_chars = trigger.query().chars().count(),
            "Trigger detected"
        );
        let result = match trigger.pathway() {
            Pathway::Ask => ask::answer(&self.ctx, &self.reconciler, message, &trigger).await,
            Pathway::Chat => chat::answer(&self.ctx, &self.reconciler, message, &trigger).await,
        };
        if let Err(e) = result {
            error!(user_id = ?message.sender_id(), trigger = trigger.name(), error = %e, "Exchange failed");
        }
        Ok(HandlerResponse::Handled)
    }
}
