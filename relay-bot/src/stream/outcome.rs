//! How one streamed response ended.

use llm_client::ProviderError;

/// Result of a scheduler run. Cancellation is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum TerminalOutcome {
    /// The stream ended normally. `text` is what was shown; `raw` is the untranslated reply.
    Completed { text: String, raw: String },
    /// The cancel token fired; `partial_text` is what was shown at that point.
    Cancelled { partial_text: String, raw: String },
    /// The provider failed mid-stream or the overall timeout expired. `partial_text` includes the notice.
    Failed {
        partial_text: String,
        error: ProviderError,
    },
}

impl TerminalOutcome {
    /// Text left visible in the chat.
    pub fn shown_text(&self) -> &str {
        match self {
            TerminalOutcome::Completed { text, .. } => text,
            TerminalOutcome::Cancelled { partial_text, .. }
            | TerminalOutcome::Failed { partial_text, .. } => partial_text,
        }
    }

    /// Raw reply worth recording as the assistant's turn; failed replies are not recorded.
    pub fn reply_for_history(&self) -> Option<&str> {
        match self {
            TerminalOutcome::Completed { raw, .. } | TerminalOutcome::Cancelled { raw, .. } => {
                Some(raw.as_str()).filter(|r| !r.trim().is_empty())
            }
            TerminalOutcome::Failed { .. } => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TerminalOutcome::Completed { .. } => "completed",
            TerminalOutcome::Cancelled { .. } => "cancelled",
            TerminalOutcome::Failed { .. } => "failed",
        }
    }
}
