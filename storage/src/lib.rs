//! Storage crate: SQLite persistence for the Zeno bot.
//!
//! ## Modules
//!
//! - [`error`] – Storage error types
//! - [`models`] – UserCredential, GroundingLink, VertexLinks, MarkSent, JournalEntry
//! - [`repository`] – CredentialStore, LinkStore, SettingsStore traits
//! - [`credential_repo`], [`link_repo`], [`settings_repo`], [`journal_repo`] – SQLite implementations
//! - [`sqlite_pool`] – SqlitePoolManager

mod credential_repo;
mod error;
mod journal_repo;
mod link_repo;
mod models;
mod repository;
mod settings_repo;
mod sqlite_pool;

pub use credential_repo::CredentialRepository;
pub use error::StorageError;
pub use journal_repo::JournalRepository;
pub use link_repo::LinkRepository;
pub use models::{GroundingLink, JournalEntry, MarkSent, UserCredential, VertexLinks};
pub use repository::{CredentialStore, LinkStore, SettingsStore};
pub use settings_repo::SettingsRepository;
pub use sqlite_pool::SqlitePoolManager;
