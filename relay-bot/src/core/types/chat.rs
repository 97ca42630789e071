//! Chat identity type for core messages.

use serde::{Deserialize, Serialize};

/// Chat (private, group or channel) identity. One chat is one conversation thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub chat_type: ChatKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatKind {
    Private,
    Group,
    Channel,
}

impl Chat {
    pub fn private(id: i64) -> Self {
        Self {
            id,
            chat_type: ChatKind::Private,
        }
    }

    pub fn group(id: i64) -> Self {
        Self {
            id,
            chat_type: ChatKind::Group,
        }
    }

    pub fn is_private(&self) -> bool {
        self.chat_type == ChatKind::Private
    }

    /// Thread key for per-conversation state.
    pub fn thread_id(&self) -> String {
        self.id.to_string()
    }
}
