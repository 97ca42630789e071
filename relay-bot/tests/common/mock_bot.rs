//! Mock implementation of [`relay_bot::Bot`] for integration tests.
//!
//! Records every successful `edit` into a channel so tests can wait for the final edit and
//! assert on the text without hitting Telegram. Queued errors make the next edits fail.

use async_trait::async_trait;
use prompt::AttachmentRef;
use relay_bot::{Bot, Chat, MessageHandle, RelayError, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// One recorded call to `edit(handle, text)`.
#[derive(Debug, Clone, PartialEq)]
pub struct EditRecord {
    pub chat_id: i64,
    pub message_id: String,
    pub text: String,
}

/// One recorded `send_image` call.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord {
    pub chat_id: i64,
    pub image: String,
    pub caption: Option<String>,
}

/// Mock Bot: posts return ids "1", "2", ...; edits are sent to `edit_tx`.
pub struct MockBot {
    next_id: AtomicUsize,
    edit_tx: mpsc::UnboundedSender<EditRecord>,
    failing_edits: Mutex<VecDeque<String>>,
    posts: Mutex<Vec<(i64, String)>>,
    sent: Mutex<Vec<(i64, String)>>,
    images: Mutex<Vec<ImageRecord>>,
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MockBot {
    pub fn new(edit_tx: mpsc::UnboundedSender<EditRecord>) -> Self {
        Self {
            next_id: AtomicUsize::new(1),
            edit_tx,
            failing_edits: Mutex::new(VecDeque::new()),
            posts: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            images: Mutex::new(Vec::new()),
            files: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a MockBot and returns the receiver for edit records.
    pub fn with_receiver() -> (Arc<Self>, mpsc::UnboundedReceiver<EditRecord>) {
        let (edit_tx, edit_rx) = mpsc::unbounded_channel();
        (Arc::new(Self::new(edit_tx)), edit_rx)
    }

    /// The next `edit` call fails with `error`. Calls queue up.
    pub fn fail_next_edit(&self, error: &str) {
        self.failing_edits
            .lock()
            .unwrap()
            .push_back(error.to_string());
    }

    /// Makes `download(file_id)` return `bytes`. Unknown ids fail.
    pub fn add_file(&self, file_id: &str, bytes: &[u8]) {
        self.files
            .lock()
            .unwrap()
            .insert(file_id.to_string(), bytes.to_vec());
    }

    pub fn posts(&self) -> Vec<(i64, String)> {
        self.posts.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn images(&self) -> Vec<ImageRecord> {
        self.images.lock().unwrap().clone()
    }
}

#[async_trait]
impl Bot for MockBot {
    async fn post(&self, chat: &Chat, text: &str) -> Result<MessageHandle> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.posts.lock().unwrap().push((chat.id, text.to_string()));
        Ok(MessageHandle::new(chat.clone(), id.to_string()))
    }

    async fn edit(&self, handle: &MessageHandle, text: &str) -> Result<()> {
        if let Some(error) = self.failing_edits.lock().unwrap().pop_front() {
            return Err(RelayError::Bot(error));
        }
        let _ = self.edit_tx.send(EditRecord {
            chat_id: handle.chat().id,
            message_id: handle.message_id().to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_message(&self, chat: &Chat, text: &str) -> Result<()> {
        self.sent.lock().unwrap().push((chat.id, text.to_string()));
        Ok(())
    }

    async fn send_image(&self, chat: &Chat, image: &AttachmentRef, caption: Option<&str>) -> Result<()> {
        self.images.lock().unwrap().push(ImageRecord {
            chat_id: chat.id,
            image: image.as_str().to_string(),
            caption: caption.map(str::to_string),
        });
        Ok(())
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(file_id)
            .cloned()
            .ok_or_else(|| RelayError::Bot(format!("file not found: {}", file_id)))
    }
}
