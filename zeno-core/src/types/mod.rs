//! Core types: user, chat, message, entities, media, callback events, handler response, and Handler trait.
//!
//! One file per main type.

mod callback;
mod chat;
mod entity;
mod handler;
mod media;
mod message;
mod response;
mod user;

pub use callback::{CallbackEvent, CallbackHandler};
pub use chat::{Chat, ChatKind};
pub use entity::{entity_text, EntityKind, MessageEntity};
pub use handler::Handler;
pub use media::{Media, MediaKind};
pub use message::Message;
pub use response::HandlerResponse;
pub use user::{display_name, PeerRef, Sender, User};
