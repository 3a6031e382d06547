//! Orchestrator error taxonomy and conversions from the layer errors.

use std::time::Duration;

use image_generation_client::ImageError;
use llm_client::ProviderError;
use storage::StorageError;
use thiserror::Error;
use zeno_core::ZenoError;

#[derive(Debug, Error)]
pub enum AiError {
    /// Messaging, provider or sandbox network failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Missing or invalid per-user credential. Expected; answered with instructions.
    #[error("credential missing: {0}")]
    Auth(String),

    /// Malformed tool arguments, unknown tool, invalid enumerated value.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Well-formed response with nothing usable in it.
    #[error("empty result")]
    EmptyResult,

    #[error("persistence error: {0}")]
    Persistence(String),
}

impl From<ProviderError> for AiError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Timeout(d) => AiError::Timeout(d),
            ProviderError::EmptyResult => AiError::EmptyResult,
            other => AiError::Transport(other.to_string()),
        }
    }
}

impl From<ImageError> for AiError {
    fn from(e: ImageError) -> Self {
        match e {
            ImageError::Timeout(d) => AiError::Timeout(d),
            ImageError::NoCandidates | ImageError::NoImage => AiError::EmptyResult,
            ImageError::Provider(m) => AiError::Transport(m),
        }
    }
}

impl From<StorageError> for AiError {
    fn from(e: StorageError) -> Self {
        AiError::Persistence(e.to_string())
    }
}

impl From<ZenoError> for AiError {
    fn from(e: ZenoError) -> Self {
        match e {
            ZenoError::Database(m) => AiError::Persistence(m),
            other => AiError::Transport(other.to_string()),
        }
    }
}

impl From<AiError> for ZenoError {
    fn from(e: AiError) -> Self {
        ZenoError::Handler(e.to_string())
    }
}
