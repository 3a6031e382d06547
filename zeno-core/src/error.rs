//! Core error type shared by the transport, the handlers and the persistence shims.

use thiserror::Error;

/// Failure of a collaborator call or a handler.
#[derive(Error, Debug)]
pub enum ZenoError {
    #[error("Database error: {0}")]
    Database(String),

    /// Messaging transport failure (send, edit, download, lookup).
    #[error("Bot error: {0}")]
    Bot(String),

    /// A handler gave up on a message it had already claimed.
    #[error("Handler error: {0}")]
    Handler(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport has no way to serve this request, e.g. a by-id lookup.
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl ZenoError {
    /// True when a caller should fall back to another strategy instead of reporting a failure.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, ZenoError::Unsupported(_))
    }
}

pub type Result<T> = std::result::Result<T, ZenoError>;
