//! # zeno-core
//!
//! Core types and traits for the Zeno bot: [`Bot`], [`Handler`], [`HandlerChain`], message, user and chat types,
//! and tracing initialization. Transport-agnostic; the Telegram implementation lives in `zeno-telegram`.

pub mod bot;
pub mod chain;
pub mod error;
pub mod logger;
pub mod types;

pub use bot::{Bot, InlineAction, SendOptions, TextFormat};
pub use chain::HandlerChain;
pub use error::{Result, ZenoError};
pub use logger::init_tracing;
pub use types::{
    display_name, entity_text, CallbackEvent, CallbackHandler, Chat, ChatKind, EntityKind, Handler, HandlerResponse,
    Media, MediaKind, Message, MessageEntity, PeerRef, Sender, User,
};
