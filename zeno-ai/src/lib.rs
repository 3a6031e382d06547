//! # zeno-ai
//!
//! AI conversation orchestrator for the Zeno Telegram bot.
//!
//! - [`trigger`] – decides whether a message engages the bot and extracts the query
//! - [`assembler`] – history, replied-to message and media into one request
//! - [`engine`] / [`tools`] – tool loop and the `create_image`, `send_file`, `run_code` tools
//! - [`reconciler`] – placeholder, status edits, final answer, sources control
//! - [`image_worker`] – bounded queue and single background consumer for `[IMAGE: …]` jobs
//! - [`handlers`] – handler-chain members and the sources callback
//! - [`runner`] – startup wiring

pub mod assembler;
pub mod config;
pub mod context;
pub mod directive;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod image_worker;
pub mod mime;
pub mod prompts;
pub mod reconciler;
pub mod render;
pub mod runner;
pub mod telegraph;
pub mod tools;
pub mod trigger;

pub use config::AiConfig;
pub use context::{AppContext, BotIdentity, CerebrasGateways, GatewayFactory, ASK_PROVIDER};
pub use error::AiError;
pub use runner::{build_handler_chain, run_bot};
