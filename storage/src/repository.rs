//! Persistence seams consumed by the orchestrator.
//!
//! Each trait covers one logical collection. The SQLite repositories implement them; callers hold
//! `Arc<dyn …Store>` so tests can substitute their own.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::models::{GroundingLink, MarkSent, VertexLinks};

/// Per-user provider credentials. Absence is a normal state.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Inserts or replaces the key for `(user_id, provider)` atomically.
    async fn upsert_api_key(&self, user_id: i64, provider: &str, api_key: &str) -> Result<(), StorageError>;
    async fn find_api_key(&self, user_id: i64, provider: &str) -> Result<Option<String>, StorageError>;
}

/// Grounding-link records keyed by a generated id.
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Persists a new unsent record and returns its id.
    async fn insert_links(&self, links: &[GroundingLink]) -> Result<String, StorageError>;
    async fn find_links(&self, id: &str) -> Result<Option<VertexLinks>, StorageError>;
    /// Flips `sent` from false to true. Exactly one caller ever observes [`MarkSent::Marked`] for a record.
    async fn mark_sent(&self, id: &str) -> Result<MarkSent, StorageError>;
    /// Clears `sent` after a claimed delivery failed, so the next attempt can claim it again.
    async fn reset_sent(&self, id: &str) -> Result<(), StorageError>;
}

/// Singleton key/value settings (e.g. a cached third-party access token).
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_setting(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn put_setting(&self, key: &str, value: &str) -> Result<(), StorageError>;
}
