//! Bounded in-process history per conversation thread.
//!
//! Only what the next request needs is kept: the last `limit` entries per thread. Nothing is
//! persisted; history is lost on restart.

use dashmap::DashMap;
use prompt::{AttachmentRef, MessageRole};
use std::collections::VecDeque;

use crate::core::{Message, User};

pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// One recorded message of a thread.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub role: MessageRole,
    /// Author of a user entry; `None` for the bot's own replies.
    pub author: Option<User>,
    pub text: String,
    pub attachments: Vec<AttachmentRef>,
}

impl HistoryEntry {
    pub fn from_user(user: User, text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            author: Some(user),
            text: text.into(),
            attachments: Vec::new(),
        }
    }

    pub fn from_bot(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            author: None,
            text: text.into(),
            attachments: Vec::new(),
        }
    }

    /// User entry for an inbound message; `text` is the prompt after mention stripping and
    /// with text attachments inlined.
    pub fn from_message(message: &Message, text: impl Into<String>) -> Self {
        Self::from_user(message.user.clone(), text)
    }

    /// Attaches images the model should see with this entry.
    pub fn with_attachments(mut self, attachments: Vec<AttachmentRef>) -> Self {
        self.attachments = attachments;
        self
    }
}

/// Per-thread ring of recent entries, keyed by thread id.
#[derive(Debug)]
pub struct ThreadHistory {
    threads: DashMap<String, VecDeque<HistoryEntry>>,
    limit: usize,
}

impl Default for ThreadHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl ThreadHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            threads: DashMap::new(),
            limit: limit.max(1),
        }
    }

    pub fn push(&self, thread_id: &str, entry: HistoryEntry) {
        let mut entries = self.threads.entry(thread_id.to_string()).or_default();
        entries.push_back(entry);
        while entries.len() > self.limit {
            entries.pop_front();
        }
    }

    /// Copy of the thread's entries, oldest first.
    pub fn snapshot(&self, thread_id: &str) -> Vec<HistoryEntry> {
        self.threads
            .get(thread_id)
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self, thread_id: &str) -> usize {
        self.threads.get(thread_id).map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self, thread_id: &str) -> bool {
        self.len(thread_id) == 0
    }

    pub fn clear(&self, thread_id: &str) {
        self.threads.remove(thread_id);
    }
}
