//! Bot abstraction for posting and editing messages.
//!
//! [`Bot`] is transport-agnostic; [`crate::telegram::TelegramBotAdapter`] implements it via teloxide
//! and tests substitute a recording mock.

use crate::core::error::{RelayError, Result};
use crate::core::types::Chat;
use async_trait::async_trait;
use prompt::AttachmentRef;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tokio::time::Instant;

/// A posted message that a single response edits in place.
///
/// Owned by exactly one scheduler; not `Clone`, so two tasks can never edit the same reply.
#[derive(Debug)]
pub struct MessageHandle {
    chat: Chat,
    message_id: String,
    last_edit_time: Option<Instant>,
    last_edit_text_hash: Option<u64>,
}

impl MessageHandle {
    pub fn new(chat: Chat, message_id: impl Into<String>) -> Self {
        Self {
            chat,
            message_id: message_id.into(),
            last_edit_time: None,
            last_edit_text_hash: None,
        }
    }

    pub fn chat(&self) -> &Chat {
        &self.chat
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub fn last_edit_time(&self) -> Option<Instant> {
        self.last_edit_time
    }

    pub fn last_edit_text_hash(&self) -> Option<u64> {
        self.last_edit_text_hash
    }

    /// True when `text` is what the last successful edit delivered.
    pub fn is_unchanged(&self, text: &str) -> bool {
        self.last_edit_text_hash == Some(text_hash(text))
    }

    /// Records a successful edit.
    pub fn mark_edited(&mut self, text: &str) {
        self.last_edit_time = Some(Instant::now());
        self.last_edit_text_hash = Some(text_hash(text));
    }
}

pub fn text_hash(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

/// Parses a message id string into an i32.
pub fn parse_message_id(s: &str) -> Result<i32> {
    s.parse()
        .map_err(|_| RelayError::Bot(format!("Invalid message_id for edit: {}", s)))
}

/// Posting and editing messages on a chat platform.
#[async_trait]
pub trait Bot: Send + Sync {
    /// Posts `text` and returns a handle for editing it later.
    async fn post(&self, chat: &Chat, text: &str) -> Result<MessageHandle>;

    /// Replaces the text of a posted message.
    async fn edit(&self, handle: &MessageHandle, text: &str) -> Result<()>;

    /// Sends a standalone message (notices, errors).
    async fn send_message(&self, chat: &Chat, text: &str) -> Result<()>;

    /// Sends an image by URL or platform file id.
    async fn send_image(&self, chat: &Chat, image: &AttachmentRef, caption: Option<&str>) -> Result<()>;

    /// Fetches the bytes of an attached file.
    async fn download(&self, file_id: &str) -> Result<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_message_id_valid() {
        assert_eq!(parse_message_id("123").unwrap(), 123);
        assert_eq!(parse_message_id("0").unwrap(), 0);
    }

    #[test]
    fn test_parse_message_id_invalid() {
        assert!(parse_message_id("").is_err());
        assert!(parse_message_id("abc").is_err());
        assert!(parse_message_id("12.3").is_err());
    }

    /// **Test: A fresh handle has no edit recorded; mark_edited records time and text hash.**
    #[tokio::test]
    async fn test_handle_tracks_last_edit() {
        let mut handle = MessageHandle::new(Chat::private(7), "42");
        assert!(handle.last_edit_time().is_none());
        assert!(!handle.is_unchanged(""));

        handle.mark_edited("hello");
        assert!(handle.last_edit_time().is_some());
        assert!(handle.is_unchanged("hello"));
        assert!(!handle.is_unchanged("hello!"));
        assert_eq!(handle.message_id(), "42");
        assert_eq!(handle.chat().id, 7);
    }
}
