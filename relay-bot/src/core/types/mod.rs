//! Core types: user, chat, message, handler response, and Handler trait.

mod attachment;
mod chat;
mod handler;
mod message;
mod response;
mod user;

pub use attachment::FileAttachment;
pub use chat::{Chat, ChatKind};
pub use handler::{Handler, ToCoreMessage, ToCoreUser};
pub use message::{Message, MessageDirection};
pub use response::HandlerResponse;
pub use user::User;
