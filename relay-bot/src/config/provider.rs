//! Provider selection from env: PROVIDER plus the per-provider keys, URLs and models.

use llm_client::{ProviderConfig, ProviderKind};

use super::env;
use crate::core::ConfigError;

/// Reads the provider settings. Only the selected provider's key is checked in validate.
pub fn load_provider_config() -> Result<ProviderConfig, ConfigError> {
    let defaults = ProviderConfig::default();
    let kind = match env::var("PROVIDER") {
        None => ProviderKind::default(),
        Some(raw) => raw.parse().map_err(|_| env::invalid("PROVIDER", &raw))?,
    };

    Ok(ProviderConfig {
        kind,
        openai_api_key: env::var("OPENAI_API_KEY"),
        openai_base_url: env::string_or("OPENAI_BASE_URL", &defaults.openai_base_url),
        openai_model: env::string_or("OPENAI_MODEL", &defaults.openai_model),
        openai_image_model: env::string_or(
            "OPENAI_IMAGE_GENERATION_MODEL",
            &defaults.openai_image_model,
        ),
        anthropic_api_key: env::var("ANTHROPIC_API_KEY"),
        anthropic_base_url: env::string_or("ANTHROPIC_BASE_URL", &defaults.anthropic_base_url),
        anthropic_model: env::string_or("ANTHROPIC_MODEL", &defaults.anthropic_model),
    })
}

/// The selected provider needs its API key and a valid base URL.
pub fn validate_provider_config(config: &ProviderConfig) -> Result<(), ConfigError> {
    let (key, key_name, url, url_name) = match config.kind {
        ProviderKind::OpenAi => (
            &config.openai_api_key,
            "OPENAI_API_KEY",
            &config.openai_base_url,
            "OPENAI_BASE_URL",
        ),
        ProviderKind::Anthropic => (
            &config.anthropic_api_key,
            "ANTHROPIC_API_KEY",
            &config.anthropic_base_url,
            "ANTHROPIC_BASE_URL",
        ),
    };
    if key.is_none() {
        return Err(ConfigError::Missing(key_name.to_string()));
    }
    if reqwest::Url::parse(url).is_err() {
        return Err(env::invalid(url_name, url));
    }
    Ok(())
}
