//! # Stream
//!
//! Turns a provider's chunk stream into live edits of one chat message.
//!
//! - **[`StreamScheduler::run`]**: translation, outbound redaction, throttled and coalesced
//!   intermediate edits, cancellation between chunks, one guaranteed final edit.
//! - **[`split_pages`]**: replies over Telegram's length limit continue in follow-up messages.
//! - **[`TerminalOutcome`]**: `Completed`, `Cancelled` or `Failed`.
//! - **[`edit`]**: Telegram retry helpers (Retry-After, "message is not modified").

pub mod edit;
mod outcome;
mod pages;
mod scheduler;

pub use edit::{extract_retry_after_seconds, is_message_not_modified_error};
pub use outcome::TerminalOutcome;
pub use pages::{split_pages, MAX_MESSAGE_CHARS};
pub use scheduler::{
    StreamScheduler, StreamSettings, CANCELLED_TEXT, DEFAULT_EDIT_INTERVAL,
    DEFAULT_FINAL_EDIT_TIMEOUT, DEFAULT_TIMEOUT, ERROR_NOTICE_PREFIX, NO_REPLY_TEXT,
};
