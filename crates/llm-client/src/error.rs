//! Provider failure classification shared by all adapters.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network failure before a status was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// Provider answered with a failure status or error object.
    #[error("provider returned {code}: {message}")]
    Status { code: String, message: String },

    #[error("provider call timed out after {0:?}")]
    Timeout(Duration),

    /// The body could not be parsed into the provider's response schema.
    #[error("malformed provider response: {0}")]
    Malformed(String),

    /// Well-formed response without any choice or candidate.
    #[error("provider returned no candidates")]
    EmptyResult,

    /// The request cannot be expressed for this provider (e.g. tools on a tool-less shape).
    #[error("unsupported request: {0}")]
    Unsupported(String),
}

impl From<openai_client::CompletionError> for ProviderError {
    fn from(e: openai_client::CompletionError) -> Self {
        use openai_client::CompletionError as E;
        match e {
            E::Api { code, message } => ProviderError::Status { code, message },
            E::Transport {
                status: Some(status),
                message,
            } => ProviderError::Status {
                code: status.to_string(),
                message,
            },
            E::Transport { status: None, message } => ProviderError::Transport(message),
            E::Timeout(d) => ProviderError::Timeout(d),
            E::Decode(m) => ProviderError::Malformed(m),
            E::NoChoices => ProviderError::EmptyResult,
            E::InvalidRequest(m) => ProviderError::Unsupported(m),
        }
    }
}

impl From<gemini_client::GeminiError> for ProviderError {
    fn from(e: gemini_client::GeminiError) -> Self {
        use gemini_client::GeminiError as E;
        match e {
            E::Transport(m) => ProviderError::Transport(m),
            E::Status { code, message } => ProviderError::Status {
                code: code.to_string(),
                message,
            },
            E::Timeout(d) => ProviderError::Timeout(d),
            E::Decode(m) => ProviderError::Malformed(m),
        }
    }
}
