//! # relay-bot
//!
//! Telegram bot that relays conversations to an AI provider and streams the reply back as a
//! live-edited message.
//!
//! ## Pipeline
//!
//! 1. **[`context`]**: bounded thread history → token-budgeted [`prompt::GenerationRequest`].
//! 2. **[`redaction`]**: sensitive text replaced before it leaves the process (inbound) or is shown (outbound).
//! 3. **[`llm_client`]**: provider stream of [`prompt::ContentChunk`]s.
//! 4. **[`markdown`]**: incremental markdown → Telegram HTML.
//! 5. **[`stream`]**: throttled, coalesced edits with cancellation and a guaranteed final edit.
//!
//! Attachments are resolved by [`files`] first: text files are inlined, images become data URLs.
//!
//! [`orchestrator::RelayHandler`] ties these together per thread; [`telegram`] connects it to
//! Telegram via teloxide.

pub mod cli;
pub mod config;
pub mod context;
pub mod core;
pub mod files;
pub mod markdown;
pub mod mention;
pub mod orchestrator;
pub mod redaction;
pub mod runner;
pub mod stream;
pub mod telegram;

pub use cli::{load_config, Cli, Commands};
pub use config::RelayConfig;
pub use crate::core::{
    init_tracing, Bot, Chat, ChatKind, ConfigError, FileAttachment, Handler, HandlerError,
    HandlerResponse, Message, MessageHandle, RelayError, Result, User,
};
pub use orchestrator::{RelayHandler, RelayOptions};
pub use runner::{build_handler, run_bot};
pub use stream::{StreamScheduler, StreamSettings, TerminalOutcome};
pub use telegram::{run_repl, TelegramBotAdapter, TelegramMessageWrapper, TelegramUserWrapper};
