//! # Gemini client
//!
//! Minimal [reqwest] client for the `models/{model}:generateContent` endpoint.
//!
//! - [`types`] – request/response wire types (contents, parts, tools, generation config, grounding metadata)
//! - [`GeminiClient`] – authenticated POST with a per-call timeout
//! - [`GeminiError`] – transport / status / timeout / decode failures

pub mod types;

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use types::{
    Blob, Candidate, Content, FunctionCall, FunctionDeclaration, FunctionResponse, GenerateContentRequest,
    GenerateContentResponse, GenerationConfig, GoogleSearch, GroundingChunk, GroundingMetadata, ImageConfig, Part,
    Tool, UsageMetadata, WebChunk,
};

/// Public endpoint base; override for proxies and tests.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status; `message` is the API's error message when the body carried one.
    #[error("HTTP {code}: {message}")]
    Status { code: u16, message: String },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed response: {0}")]
    Decode(String),
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Client bound to one API key.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Calls `generateContent` for `model`. The request is abandoned after `timeout`.
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
        timeout: Duration,
    ) -> Result<GenerateContentResponse, GeminiError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        info!(
            model = %model,
            contents = request.contents.len(),
            tools = request.tools.as_ref().map(|t| t.len()).unwrap_or(0),
            "generateContent request"
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .timeout(timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| classify(e, timeout))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| classify(e, timeout))?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
                Ok(env) => match env.error.status {
                    Some(s) => format!("{} ({})", env.error.message, s),
                    None => env.error.message,
                },
                Err(_) => status.canonical_reason().unwrap_or("error").to_string(),
            };
            warn!(model = %model, status = status.as_u16(), error = %message, "generateContent failed");
            return Err(GeminiError::Status {
                code: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| GeminiError::Decode(e.to_string()))?;

        if let Some(ref usage) = parsed.usage_metadata {
            debug!(
                prompt_tokens = usage.prompt_token_count,
                candidates_tokens = usage.candidates_token_count,
                total_tokens = usage.total_token_count,
                "generateContent usage"
            );
        }
        Ok(parsed)
    }
}

fn classify(e: reqwest::Error, timeout: Duration) -> GeminiError {
    if e.is_timeout() {
        GeminiError::Timeout(timeout)
    } else if e.is_decode() {
        GeminiError::Decode(e.to_string())
    } else {
        GeminiError::Transport(e.to_string())
    }
}
