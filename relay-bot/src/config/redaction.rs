//! Redaction settings from env, compiled once into a [`RedactionPolicy`].

use std::sync::Arc;

use super::env;
use crate::core::ConfigError;
use crate::redaction::{RedactionCategory, RedactionPolicy, RedactionRules};
use tracing::warn;

/// Reads REDACTION_ENABLED, REDACT_OUTBOUND and the per-category patterns.
///
/// Patterns are compiled even when redaction is off, so a malformed one fails at startup.
/// Outbound redaction only applies when REDACTION_ENABLED is on.
pub fn load_redaction_policy() -> Result<RedactionPolicy, ConfigError> {
    let enabled = env::bool_or("REDACTION_ENABLED", false)?;
    let outbound = env::bool_or("REDACT_OUTBOUND", false)?;

    let patterns = RedactionCategory::ALL.iter().map(|category| {
        let pattern = std::env::var(category.env_var())
            .unwrap_or_else(|_| category.default_pattern().to_string());
        (*category, pattern)
    });
    let rules = RedactionRules::from_patterns(patterns)?;

    if outbound && !enabled {
        warn!("REDACT_OUTBOUND is set but REDACTION_ENABLED is off; outbound redaction disabled");
    }
    Ok(RedactionPolicy::new(Arc::new(rules), enabled, enabled && outbound))
}
