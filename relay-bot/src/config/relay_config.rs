//! RelayConfig: BaseConfig + PipelineConfig + ProviderConfig. Use load() for env-based loading.

use llm_client::ProviderConfig;

use super::provider::{load_provider_config, validate_provider_config};
use super::{BaseConfig, PipelineConfig};
use crate::core::ConfigError;

/// Full bot config. Call validate() after load() to fail fast before init.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub base: BaseConfig,
    pub pipeline: PipelineConfig,
    pub provider: ProviderConfig,
}

impl RelayConfig {
    /// Load full config from environment variables. If `token` is provided it overrides BOT_TOKEN.
    pub fn load(token: Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            base: BaseConfig::load(token)?,
            pipeline: PipelineConfig::load()?,
            provider: load_provider_config()?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base.validate()?;
        self.pipeline.validate()?;
        validate_provider_config(&self.provider)
    }

    pub fn bot_token(&self) -> &str {
        &self.base.bot_token
    }
    pub fn log_file(&self) -> &str {
        &self.base.log_file
    }
    pub fn telegram_api_url(&self) -> Option<&str> {
        self.base.telegram_api_url.as_deref()
    }
}
