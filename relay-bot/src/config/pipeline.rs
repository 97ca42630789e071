//! Pipeline config: generation parameters, context budget, translation, edit cadence,
//! attachment limits and redaction. Loaded from env.

use prompt::GenerationParams;
use std::time::Duration;

use super::env;
use super::redaction::load_redaction_policy;
use crate::context::DEFAULT_HISTORY_LIMIT;
use crate::core::ConfigError;
use crate::files::DEFAULT_MAX_FILE_SIZE;
use crate::markdown::TranslationMode;
use crate::orchestrator::{RelayOptions, DEFAULT_CONTEXT_TOKEN_BUDGET, DEFAULT_THINKING_MESSAGE};
use crate::redaction::RedactionPolicy;
use crate::stream::{
    StreamSettings, DEFAULT_EDIT_INTERVAL, DEFAULT_FINAL_EDIT_TIMEOUT, DEFAULT_TIMEOUT,
    MAX_MESSAGE_CHARS,
};

/// Default system turn. `{bot_username}` is replaced with the bot's Telegram username.
pub const DEFAULT_SYSTEM_TEXT: &str = "You are a bot in a Telegram chat. You might receive messages from multiple people.
Your username is @{bot_username}.
Each user message starts with its author, like `[User: Name / @username] `, followed by the message text.
Use Markdown for formatting: **bold**, _italic_, ~~strikethrough~~, `inline code` and fenced code blocks.";

/// Everything that shapes one response.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// TEMPERATURE
    pub temperature: f32,
    /// MAX_RESPONSE_TOKENS
    pub max_response_tokens: u32,
    /// TIMEOUT_SECONDS
    pub timeout: Duration,
    /// SYSTEM_TEXT
    pub system_text: String,
    /// CONTEXT_TOKEN_BUDGET
    pub context_token_budget: usize,
    /// HISTORY_LIMIT
    pub history_limit: usize,
    /// TRANSLATE_MARKDOWN
    pub translate_markdown: bool,
    /// TELEGRAM_EDIT_INTERVAL_SECS
    pub edit_interval: Duration,
    /// FINAL_EDIT_TIMEOUT_SECS
    pub final_edit_timeout: Duration,
    /// THINKING_MESSAGE
    pub thinking_message: String,
    /// IMAGE_FILE_ACCESS_ENABLED
    pub image_file_access: bool,
    /// MAX_FILE_SIZE_BYTES
    pub max_file_size: u64,
    /// REDACTION_ENABLED, REDACT_OUTBOUND, REDACT_*_PATTERN
    pub redaction: RedactionPolicy,
}

impl PipelineConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            temperature: env::parse_or("TEMPERATURE", 1.0)?,
            max_response_tokens: env::parse_or("MAX_RESPONSE_TOKENS", 1024)?,
            timeout: env::secs_or("TIMEOUT_SECONDS", DEFAULT_TIMEOUT)?,
            system_text: env::string_or("SYSTEM_TEXT", DEFAULT_SYSTEM_TEXT),
            context_token_budget: env::parse_or("CONTEXT_TOKEN_BUDGET", DEFAULT_CONTEXT_TOKEN_BUDGET)?,
            history_limit: env::parse_or("HISTORY_LIMIT", DEFAULT_HISTORY_LIMIT)?,
            translate_markdown: env::bool_or("TRANSLATE_MARKDOWN", true)?,
            edit_interval: env::secs_or("TELEGRAM_EDIT_INTERVAL_SECS", DEFAULT_EDIT_INTERVAL)?,
            final_edit_timeout: env::secs_or("FINAL_EDIT_TIMEOUT_SECS", DEFAULT_FINAL_EDIT_TIMEOUT)?,
            thinking_message: env::string_or("THINKING_MESSAGE", DEFAULT_THINKING_MESSAGE),
            image_file_access: env::bool_or("IMAGE_FILE_ACCESS_ENABLED", false)?,
            max_file_size: env::parse_or("MAX_FILE_SIZE_BYTES", DEFAULT_MAX_FILE_SIZE)?,
            redaction: load_redaction_policy()?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(env::invalid("TEMPERATURE", &self.temperature.to_string()));
        }
        if self.max_response_tokens == 0 {
            return Err(env::invalid("MAX_RESPONSE_TOKENS", "0"));
        }
        if self.timeout.is_zero() {
            return Err(env::invalid("TIMEOUT_SECONDS", "0"));
        }
        if self.history_limit == 0 {
            return Err(env::invalid("HISTORY_LIMIT", "0"));
        }
        Ok(())
    }

    pub fn translation_mode(&self) -> TranslationMode {
        if self.translate_markdown {
            TranslationMode::TelegramHtml
        } else {
            TranslationMode::Passthrough
        }
    }

    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            temperature: self.temperature,
            max_tokens: self.max_response_tokens,
            system_text: Some(self.system_text.clone()),
        }
    }

    pub fn stream_settings(&self) -> StreamSettings {
        StreamSettings {
            mode: self.translation_mode(),
            edit_interval: self.edit_interval,
            timeout: self.timeout,
            final_edit_timeout: self.final_edit_timeout,
            max_message_chars: MAX_MESSAGE_CHARS,
        }
    }

    pub fn relay_options(&self) -> RelayOptions {
        RelayOptions {
            thinking_message: self.thinking_message.clone(),
            token_budget: self.context_token_budget,
            image_file_access: self.image_file_access,
            max_file_size: self.max_file_size,
        }
    }
}
