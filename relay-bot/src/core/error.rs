//! Error types for the relay bot.
//!
//! [`RelayError`] is the top-level error; [`HandlerError`] covers handler failures and
//! [`ConfigError`] covers everything rejected at startup.

use llm_client::ProviderError;
use thiserror::Error;

/// Top-level error (bot transport, provider, config, handler, IO).
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Bot error: {0}")]
    Bot(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced by handlers.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("No text in message")]
    NoText,

    #[error("Empty prompt for {0}")]
    EmptyPrompt(String),

    #[error("State error: {0}")]
    State(String),
}

/// Invalid or missing configuration. Fatal at startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(String),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },

    #[error("Invalid pattern for {category}: {reason}")]
    InvalidPattern { category: String, reason: String },
}

/// Result type for core operations; uses [`RelayError`].
pub type Result<T> = std::result::Result<T, RelayError>;
