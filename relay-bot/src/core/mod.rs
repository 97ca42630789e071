//! Core types and traits: Handler, Bot, MessageHandle, Message, error, logger. Transport-agnostic.

pub mod bot;
pub mod error;
pub mod logger;
pub mod types;

pub use bot::{parse_message_id, text_hash, Bot, MessageHandle};
pub use error::{ConfigError, HandlerError, RelayError, Result};
pub use logger::init_tracing;
pub use types::{
    Chat, ChatKind, FileAttachment, Handler, HandlerResponse, Message, MessageDirection,
    ToCoreMessage, ToCoreUser, User,
};
