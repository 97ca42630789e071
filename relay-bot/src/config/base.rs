//! Base config: Telegram connection and logging. Loaded from env.

use crate::core::ConfigError;

use super::env;

pub const DEFAULT_LOG_FILE: &str = "logs/relay-bot.log";

/// Telegram-related settings and the log file.
#[derive(Clone)]
pub struct BaseConfig {
    /// BOT_TOKEN
    pub bot_token: String,
    /// TELEGRAM_API_URL or TELOXIDE_API_URL
    pub telegram_api_url: Option<String>,
    /// LOG_FILE
    pub log_file: String,
}

impl std::fmt::Debug for BaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseConfig")
            .field("bot_token", &openai_client::mask_token(&self.bot_token))
            .field("telegram_api_url", &self.telegram_api_url)
            .field("log_file", &self.log_file)
            .finish()
    }
}

impl BaseConfig {
    /// Load from environment variables. `token` overrides BOT_TOKEN if provided.
    pub fn load(token: Option<String>) -> Result<Self, ConfigError> {
        let bot_token = token
            .filter(|t| !t.trim().is_empty())
            .or_else(|| env::var("BOT_TOKEN"))
            .ok_or_else(|| ConfigError::Missing("BOT_TOKEN".to_string()))?;
        let telegram_api_url = env::var("TELEGRAM_API_URL").or_else(|| env::var("TELOXIDE_API_URL"));
        let log_file = env::string_or("LOG_FILE", DEFAULT_LOG_FILE);

        Ok(Self {
            bot_token,
            telegram_api_url,
            log_file,
        })
    }

    /// telegram_api_url must be a valid URL if set.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref url_str) = self.telegram_api_url {
            if reqwest::Url::parse(url_str).is_err() {
                return Err(env::invalid("TELEGRAM_API_URL", url_str));
            }
        }
        Ok(())
    }
}
