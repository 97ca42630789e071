//! Config tests.

use super::*;
use crate::core::ConfigError;
use crate::markdown::TranslationMode;
use llm_client::ProviderKind;
use serial_test::serial;
use std::env;
use std::time::Duration;

const VARS: &[&str] = &[
    "BOT_TOKEN",
    "TELEGRAM_API_URL",
    "TELOXIDE_API_URL",
    "LOG_FILE",
    "PROVIDER",
    "OPENAI_API_KEY",
    "OPENAI_BASE_URL",
    "OPENAI_MODEL",
    "OPENAI_IMAGE_GENERATION_MODEL",
    "ANTHROPIC_API_KEY",
    "ANTHROPIC_BASE_URL",
    "ANTHROPIC_MODEL",
    "TEMPERATURE",
    "MAX_RESPONSE_TOKENS",
    "TIMEOUT_SECONDS",
    "SYSTEM_TEXT",
    "CONTEXT_TOKEN_BUDGET",
    "HISTORY_LIMIT",
    "TRANSLATE_MARKDOWN",
    "REDACTION_ENABLED",
    "REDACT_OUTBOUND",
    "REDACT_EMAIL_PATTERN",
    "REDACT_PHONE_PATTERN",
    "REDACT_CREDIT_CARD_PATTERN",
    "REDACT_SSN_PATTERN",
    "REDACT_USER_DEFINED_PATTERN",
    "TELEGRAM_EDIT_INTERVAL_SECS",
    "FINAL_EDIT_TIMEOUT_SECS",
    "THINKING_MESSAGE",
    "IMAGE_FILE_ACCESS_ENABLED",
    "MAX_FILE_SIZE_BYTES",
];

fn clear_env() {
    for name in VARS {
        env::remove_var(name);
    }
}

#[test]
#[serial]
fn test_load_config_with_defaults() {
    clear_env();
    env::set_var("BOT_TOKEN", "test_token");
    env::set_var("OPENAI_API_KEY", "test_key");

    let config = RelayConfig::load(None).unwrap();
    config.validate().unwrap();

    assert_eq!(config.bot_token(), "test_token");
    assert!(config.telegram_api_url().is_none());
    assert_eq!(config.log_file(), "logs/relay-bot.log");

    let p = &config.pipeline;
    assert_eq!(p.temperature, 1.0);
    assert_eq!(p.max_response_tokens, 1024);
    assert_eq!(p.timeout, Duration::from_secs(30));
    assert_eq!(p.system_text, DEFAULT_SYSTEM_TEXT);
    assert_eq!(p.context_token_budget, 4096);
    assert_eq!(p.history_limit, 100);
    assert_eq!(p.translation_mode(), TranslationMode::TelegramHtml);
    assert_eq!(p.edit_interval, Duration::from_secs(2));
    assert_eq!(p.final_edit_timeout, Duration::from_secs(30));
    assert_eq!(p.thinking_message, "Thinking...");
    assert!(!p.image_file_access);
    assert_eq!(p.max_file_size, 20 * 1024 * 1024);
    assert!(!p.redaction.inbound_enabled());
    assert!(!p.redaction.outbound_enabled());
    assert_eq!(p.redaction.rules().active_count(), 4);

    assert_eq!(config.provider.kind, ProviderKind::OpenAi);
    assert_eq!(config.provider.model(), "gpt-4o");
    assert_eq!(config.provider.openai_image_model, "dall-e-3");
}

#[test]
#[serial]
fn test_load_config_with_custom_values() {
    clear_env();
    env::set_var("BOT_TOKEN", "custom_token");
    env::set_var("PROVIDER", "Anthropic");
    env::set_var("ANTHROPIC_API_KEY", "sk-ant");
    env::set_var("ANTHROPIC_MODEL", "claude-test");
    env::set_var("TEMPERATURE", "0.3");
    env::set_var("TELEGRAM_EDIT_INTERVAL_SECS", "1.5");
    env::set_var("TRANSLATE_MARKDOWN", "false");
    env::set_var("REDACTION_ENABLED", "yes");
    env::set_var("REDACT_OUTBOUND", "1");
    env::set_var("REDACT_USER_DEFINED_PATTERN", r"ACME-\d+");
    env::set_var("THINKING_MESSAGE", "…");
    env::set_var("IMAGE_FILE_ACCESS_ENABLED", "true");
    env::set_var("MAX_FILE_SIZE_BYTES", "1024");

    let config = RelayConfig::load(Some("cli_token".to_string())).unwrap();
    config.validate().unwrap();

    assert_eq!(config.bot_token(), "cli_token");
    assert_eq!(config.provider.kind, ProviderKind::Anthropic);
    assert_eq!(config.provider.model(), "claude-test");

    let p = &config.pipeline;
    assert_eq!(p.temperature, 0.3);
    assert_eq!(p.edit_interval, Duration::from_millis(1500));
    assert_eq!(p.translation_mode(), TranslationMode::Passthrough);
    assert!(p.redaction.inbound_enabled());
    assert!(p.redaction.outbound_enabled());
    assert_eq!(p.redaction.rules().active_count(), 5);
    assert_eq!(p.redaction.redact_outbound("id ACME-42"), "id [REDACTED]");
    assert_eq!(p.thinking_message, "…");
    assert_eq!(p.generation_params().temperature, 0.3);
    assert_eq!(p.stream_settings().edit_interval, Duration::from_millis(1500));
    let options = p.relay_options();
    assert!(options.image_file_access);
    assert_eq!(options.max_file_size, 1024);
}

/// **Test: BOT_TOKEN is required when no token is passed.**
#[test]
#[serial]
fn test_missing_bot_token() {
    clear_env();
    let err = RelayConfig::load(None).unwrap_err();
    assert_eq!(err, ConfigError::Missing("BOT_TOKEN".to_string()));
}

/// **Test: The selected provider's key is required; the other one is not.**
#[test]
#[serial]
fn test_provider_key_required() {
    clear_env();
    env::set_var("BOT_TOKEN", "t");
    env::set_var("ANTHROPIC_API_KEY", "sk-ant");
    let config = RelayConfig::load(None).unwrap();
    assert_eq!(
        config.validate().unwrap_err(),
        ConfigError::Missing("OPENAI_API_KEY".to_string())
    );
}

#[test]
#[serial]
fn test_invalid_values_rejected() {
    clear_env();
    env::set_var("BOT_TOKEN", "t");

    env::set_var("TIMEOUT_SECONDS", "soon");
    assert!(matches!(
        RelayConfig::load(None),
        Err(ConfigError::InvalidValue { ref name, .. }) if name == "TIMEOUT_SECONDS"
    ));
    env::remove_var("TIMEOUT_SECONDS");

    env::set_var("PROVIDER", "gemini");
    assert!(matches!(
        RelayConfig::load(None),
        Err(ConfigError::InvalidValue { ref name, .. }) if name == "PROVIDER"
    ));
    env::remove_var("PROVIDER");

    env::set_var("TRANSLATE_MARKDOWN", "maybe");
    assert!(RelayConfig::load(None).is_err());
    env::remove_var("TRANSLATE_MARKDOWN");

    env::set_var("TELEGRAM_EDIT_INTERVAL_SECS", "-1");
    assert!(RelayConfig::load(None).is_err());
    env::remove_var("TELEGRAM_EDIT_INTERVAL_SECS");
}

/// **Test: A malformed redaction pattern fails at load even when redaction is off.**
#[test]
#[serial]
fn test_malformed_pattern_fails_at_load() {
    clear_env();
    env::set_var("BOT_TOKEN", "t");
    env::set_var("REDACT_PHONE_PATTERN", "(unclosed");
    assert!(matches!(
        RelayConfig::load(None),
        Err(ConfigError::InvalidPattern { ref category, .. }) if category == "phone"
    ));
}

/// **Test: An empty or never-matching pattern disables its category.**
#[test]
#[serial]
fn test_disabled_patterns() {
    clear_env();
    env::set_var("BOT_TOKEN", "t");
    env::set_var("REDACT_EMAIL_PATTERN", "");
    env::set_var("REDACT_SSN_PATTERN", "(?!)");
    let config = RelayConfig::load(None).unwrap();
    assert_eq!(config.pipeline.redaction.rules().active_count(), 2);
}

/// **Test: Outbound redaction needs REDACTION_ENABLED.**
#[test]
#[serial]
fn test_outbound_requires_enabled() {
    clear_env();
    env::set_var("BOT_TOKEN", "t");
    env::set_var("REDACT_OUTBOUND", "true");
    let config = RelayConfig::load(None).unwrap();
    assert!(!config.pipeline.redaction.outbound_enabled());
}

#[test]
#[serial]
fn test_invalid_telegram_api_url() {
    clear_env();
    env::set_var("BOT_TOKEN", "t");
    env::set_var("OPENAI_API_KEY", "k");
    env::set_var("TELOXIDE_API_URL", "not a url");
    let config = RelayConfig::load(None).unwrap();
    assert!(config.validate().is_err());
}

/// **Test: Debug output masks the bot token.**
#[test]
#[serial]
fn test_debug_masks_token() {
    clear_env();
    let config = BaseConfig::load(Some("123456789:ABCDEFGHIJKLMNOP".to_string())).unwrap();
    let debug = format!("{:?}", config);
    assert!(!debug.contains("ABCDEFGHIJKLMNOP"));
}
