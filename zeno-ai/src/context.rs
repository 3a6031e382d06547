//! Application context: every collaborator the handlers need, built once at startup and shared by `Arc`.

use std::sync::Arc;

use image_generation_client::ImageGenerator;
use llm_client::{ChatCompletionGateway, ProviderGateway};
use storage::{CredentialStore, LinkStore};
use zeno_core::Bot;

use crate::assembler::ContextAssembler;
use crate::config::AiConfig;
use crate::engine::ToolLoop;
use crate::image_worker::ImageQueue;
use crate::telegraph::Publisher;
use crate::tools::{Sandbox, ToolExecutor};

/// Provider name under which per-user ask keys are stored.
pub const ASK_PROVIDER: &str = "cerebras";

/// Who the bot is, for reply-to-bot and mention detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub user_id: i64,
    /// Handle without `@`.
    pub username: String,
}

/// Builds a gateway authenticated with one caller's key.
pub trait GatewayFactory: Send + Sync {
    fn for_key(&self, api_key: &str) -> Arc<dyn ProviderGateway>;
}

/// Chat-completion gateways against the Cerebras endpoint.
#[derive(Debug, Clone)]
pub struct CerebrasGateways {
    base_url: String,
}

impl CerebrasGateways {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl GatewayFactory for CerebrasGateways {
    fn for_key(&self, api_key: &str) -> Arc<dyn ProviderGateway> {
        Arc::new(ChatCompletionGateway::new(api_key.to_string(), self.base_url.clone()))
    }
}

pub struct AppContext {
    pub config: AiConfig,
    pub identity: BotIdentity,
    pub bot: Arc<dyn Bot>,
    pub credentials: Arc<dyn CredentialStore>,
    pub links: Arc<dyn LinkStore>,
    /// Service-key gateway with tools and grounding.
    pub chat_gateway: Arc<dyn ProviderGateway>,
    pub ask_gateways: Arc<dyn GatewayFactory>,
    pub images: Arc<dyn ImageGenerator>,
    pub sandbox: Arc<dyn Sandbox>,
    pub publisher: Option<Arc<dyn Publisher>>,
    pub image_queue: ImageQueue,
}

impl AppContext {
    pub fn assembler(&self) -> ContextAssembler {
        ContextAssembler::new(self.bot.clone(), self.config.max_media_size)
    }

    pub fn tool_executor(&self) -> ToolExecutor {
        ToolExecutor::new(
            self.bot.clone(),
            self.images.clone(),
            self.sandbox.clone(),
            self.config.image_model.clone(),
            self.config.high_image_model.clone(),
            self.config.generated_dir.clone(),
        )
    }

    pub fn tool_loop(&self) -> ToolLoop {
        ToolLoop::new(
            self.chat_gateway.clone(),
            Arc::new(self.tool_executor()),
            self.links.clone(),
        )
    }
}
