//! # Provider gateway
//!
//! One interface over the text generation backends. Callers build a provider-agnostic
//! [`GenerationRequest`] and get back a [`GenerationResponse`] exposing `{text, tool_calls, grounding_links}`;
//! each adapter hides its provider's request construction, authentication, timeout and response schema.
//!
//! - [`ChatCompletionGateway`] – OpenAI-compatible chat completion (stateless, no tools)
//! - [`GeminiGateway`] – multimodal `generateContent` with function calling and optional search grounding

use async_trait::async_trait;

mod chat_completion;
mod error;
mod gemini;
mod request;
mod sampling;

pub use chat_completion::ChatCompletionGateway;
pub use error::ProviderError;
pub use gemini::GeminiGateway;
pub use request::{
    Attachment, GenerationRequest, GenerationResponse, GroundingLink, Role, ToolCall, ToolResult, ToolSpec, Turn,
    TurnPart,
};
pub use sampling::{
    SamplingParams, ASK_SAMPLING, ASK_TIMEOUT, CHAT_SAMPLING, CHAT_TIMEOUT,
};

/// Uniform generation interface implemented once per provider shape.
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    /// Whether this provider accepts tool declarations and returns tool calls.
    fn supports_tools(&self) -> bool;

    /// Sends the request and parses the first candidate/choice.
    ///
    /// Zero candidates/choices is [`ProviderError::EmptyResult`], distinct from transport and status failures.
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, ProviderError>;
}
