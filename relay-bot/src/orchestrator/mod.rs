//! # Orchestrator
//!
//! [`RelayHandler`] implements [`crate::core::Handler`]: trigger detection, per-thread
//! cancellation, context assembly, provider call and scheduler spawn.

mod commands;
mod handler;

pub use commands::{parse_command, Command};
pub use handler::{RelayHandler, RelayOptions, DEFAULT_CONTEXT_TOKEN_BUDGET, DEFAULT_THINKING_MESSAGE};
