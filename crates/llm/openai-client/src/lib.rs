//! # OpenAI-compatible chat completion client
//!
//! Thin wrapper around [async-openai] for non-streaming chat completion against any OpenAI-compatible endpoint
//! (e.g. Cerebras). Adds explicit sampling parameters, a per-call timeout, typed errors and token masking for
//! safe logging.

use std::sync::Arc;
use std::time::Duration;

use async_openai::error::OpenAIError;
use async_openai::types::CreateChatCompletionRequestArgs;
use async_openai::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs,
};

/// Masks an API key/token for safe logging: shows first 7 chars + "***" + last 4 chars.
/// If length <= 11 (or the key is not ASCII), returns "***" to avoid leaking any part of the key.
pub fn mask_token(token: &str) -> String {
    let len = token.len();
    if len <= 11 || !token.is_ascii() {
        return "***".to_string();
    }
    format!("{}***{}", &token[..7], &token[len - 4..])
}

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

/// Failure of a chat completion call.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// The endpoint answered with an error object (bad key, bad model, quota, …).
    #[error("API error ({code}): {message}")]
    Api { code: String, message: String },

    /// Network failure or non-JSON error status.
    #[error("transport error (status {status:?}): {message}")]
    Transport { status: Option<u16>, message: String },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The response body could not be decoded.
    #[error("malformed response: {0}")]
    Decode(String),

    /// Well-formed response with zero choices.
    #[error("response contained no choices")]
    NoChoices,

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<OpenAIError> for CompletionError {
    fn from(e: OpenAIError) -> Self {
        match e {
            OpenAIError::ApiError(api) => CompletionError::Api {
                code: api
                    .code
                    .map(|c| c.to_string().trim_matches('"').to_string())
                    .or(api.r#type)
                    .unwrap_or_else(|| "unknown".to_string()),
                message: api.message,
            },
            OpenAIError::Reqwest(err) => CompletionError::Transport {
                status: err.status().map(|s| s.as_u16()),
                message: err.to_string(),
            },
            OpenAIError::JSONDeserialize(err) => CompletionError::Decode(err.to_string()),
            OpenAIError::InvalidArgument(msg) => CompletionError::InvalidRequest(msg),
            other => CompletionError::Transport {
                status: None,
                message: other.to_string(),
            },
        }
    }
}

/// Chat client for one API key and base URL.
#[derive(Clone)]
pub struct OpenAIClient {
    client: Arc<Client<async_openai::config::OpenAIConfig>>,
    /// Kept only for masked logging.
    api_key: String,
}

impl OpenAIClient {
    /// Builds a client for the given key against `base_url` (e.g. `https://api.cerebras.ai/v1`).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let config = async_openai::config::OpenAIConfig::new()
            .with_api_key(api_key.clone())
            .with_api_base(base_url);
        Self {
            client: Arc::new(Client::with_config(config)),
            api_key,
        }
    }

    /// Sends a chat completion request and returns the first choice's content (possibly empty).
    ///
    /// The whole call, including the library's own retries, is bounded by `timeout`.
    pub async fn chat_completion(
        &self,
        model: &str,
        messages: Vec<ChatCompletionRequestMessage>,
        sampling: SamplingParams,
        timeout: Duration,
    ) -> Result<String, CompletionError> {
        tracing::info!(
            model = %model,
            message_count = messages.len(),
            api_key = %mask_token(&self.api_key),
            "chat_completion request"
        );

        #[allow(deprecated)]
        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .temperature(sampling.temperature)
            .top_p(sampling.top_p)
            .max_tokens(sampling.max_tokens)
            .build()?;

        if let Ok(json) = serde_json::to_string(&request) {
            tracing::debug!(request_json = %json, "chat_completion request JSON");
        }

        let response = tokio::time::timeout(timeout, self.client.chat().create(request))
            .await
            .map_err(|_| CompletionError::Timeout(timeout))??;

        if let Some(ref u) = response.usage {
            tracing::info!(
                prompt_tokens = u.prompt_tokens,
                completion_tokens = u.completion_tokens,
                total_tokens = u.total_tokens,
                "chat_completion usage"
            );
        }

        let choice = response.choices.into_iter().next().ok_or(CompletionError::NoChoices)?;
        Ok(choice.message.content.unwrap_or_default())
    }
}
