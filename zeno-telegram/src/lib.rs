//! # zeno-telegram
//!
//! Telegram transport layer: adapters, journal-backed [`zeno_core::Bot`] implementation, base config, dispatcher
//! runner. Handles only Telegram connectivity and handler dispatch; no AI logic.

mod adapters;
mod config;
mod journal;
mod messenger;
mod runner;

pub use adapters::{callback_to_core, TelegramMessageWrapper, TelegramUserWrapper};
pub use config::BaseConfig;
pub use journal::MessageJournal;
pub use messenger::{strip_html, TelegramMessenger};
pub use runner::{resolve_identity, run_dispatcher, JOURNAL_RETENTION_DAYS};
