//! # Handler chain
//!
//! Gates (`before`) run first for every handler; the first handler answering [`HandlerResponse::Handled`] claims
//! the message; `after` hooks then run in reverse with the outcome.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::types::{Handler, HandlerResponse, Message};
use crate::Result;

#[derive(Clone, Default)]
pub struct HandlerChain {
    handlers: Vec<Arc<dyn Handler>>,
}

fn handler_name(h: &dyn Handler) -> &'static str {
    let full = std::any::type_name_of_val(h);
    full.rsplit("::").next().unwrap_or(full)
}

impl HandlerChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler; order is priority.
    pub fn add_handler(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Returns [`HandlerResponse::Filtered`] if a gate refused, `Handled` if a handler claimed the message,
    /// otherwise `Continue`.
    #[instrument(skip(self, message), fields(chat_id = message.chat.id, message_id = message.id))]
    pub async fn handle(&self, message: &Message) -> Result<HandlerResponse> {
        let mut outcome = HandlerResponse::Continue;

        for h in &self.handlers {
            if !h.before(message).await? {
                debug!(handler = handler_name(h.as_ref()), "Message filtered");
                outcome = HandlerResponse::Filtered;
                break;
            }
        }

        if outcome != HandlerResponse::Filtered {
            for h in &self.handlers {
                if h.handle(message).await?.is_handled() {
                    info!(
                        user_id = ?message.sender_id(),
                        handler = handler_name(h.as_ref()),
                        "Message handled"
                    );
                    outcome = HandlerResponse::Handled;
                    break;
                }
            }
        }

        for h in self.handlers.iter().rev() {
            h.after(message, outcome).await?;
        }
        Ok(outcome)
    }
}
