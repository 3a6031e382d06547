use async_trait::async_trait;

use super::{message::Message, response::HandlerResponse};

/// One member of a [`crate::HandlerChain`].
#[async_trait]
pub trait Handler: Send + Sync {
    /// Gate run for every handler before any `handle`. `false` filters the message out.
    async fn before(&self, _message: &Message) -> crate::error::Result<bool> {
        Ok(true)
    }

    async fn handle(&self, _message: &Message) -> crate::error::Result<HandlerResponse> {
        Ok(HandlerResponse::Continue)
    }

    /// Runs in reverse order once the outcome is known, also for filtered messages.
    async fn after(&self, _message: &Message, _outcome: HandlerResponse) -> crate::error::Result<()> {
        Ok(())
    }
}
