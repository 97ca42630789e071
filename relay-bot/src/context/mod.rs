//! # Context
//!
//! Per-thread history and the assembler that turns it into a [`prompt::GenerationRequest`].
//!
//! - **[`ThreadHistory`]**: bounded, in-memory, keyed by thread id.
//! - **[`ContextAssembler`]**: newest-first walk under a token budget, inbound redaction,
//!   author prefixes on user turns, budget-exempt system turn.

mod assembler;
mod format;
mod history;
mod utils;

pub use assembler::{ContextAssembler, BOT_USERNAME_PLACEHOLDER};
pub use format::{prefix_for, user_info_prefix};
pub use history::{HistoryEntry, ThreadHistory, DEFAULT_HISTORY_LIMIT};
pub use utils::estimate_tokens;
