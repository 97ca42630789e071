//! Bot configuration: BaseConfig (Telegram + log) + PipelineConfig (generation, cadence,
//! redaction) + ProviderConfig (llm-client). All from env after `dotenvy::dotenv()`.

mod base;
mod env;
mod pipeline;
mod provider;
mod redaction;
mod relay_config;

#[cfg(test)]
mod tests;

pub use base::{BaseConfig, DEFAULT_LOG_FILE};
pub use pipeline::{PipelineConfig, DEFAULT_SYSTEM_TEXT};
pub use provider::{load_provider_config, validate_provider_config};
pub use redaction::load_redaction_policy;
pub use relay_config::RelayConfig;
