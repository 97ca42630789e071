//! Redaction categories, default patterns and compiled rules.

use regex::Regex;
use std::fmt;

use crate::core::ConfigError;

pub const DEFAULT_EMAIL_PATTERN: &str = r"\b[A-Za-z0-9.*%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b";
pub const DEFAULT_CREDIT_CARD_PATTERN: &str = r"\b\d{4}[- ]?\d{4}[- ]?\d{4}[- ]?\d{4}\b";
pub const DEFAULT_PHONE_PATTERN: &str = r"\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b";
pub const DEFAULT_SSN_PATTERN: &str = r"\b\d{3}[- ]?\d{2}[- ]?\d{4}\b";

/// Never-matching lookahead some configurations use to switch a category off.
/// The regex crate has no lookaround, so it is recognised and treated as disabled.
const NEVER_MATCH_IDIOM: &str = "(?!)";

/// Kind of sensitive data a rule targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RedactionCategory {
    Email,
    CreditCard,
    Phone,
    Ssn,
    UserDefined,
}

impl RedactionCategory {
    /// Configured order: each rule runs on the previous rule's output.
    pub const ALL: [RedactionCategory; 5] = [
        RedactionCategory::Email,
        RedactionCategory::CreditCard,
        RedactionCategory::Phone,
        RedactionCategory::Ssn,
        RedactionCategory::UserDefined,
    ];

    pub fn replacement(&self) -> &'static str {
        match self {
            RedactionCategory::Email => "[EMAIL]",
            RedactionCategory::CreditCard => "[CREDIT CARD]",
            RedactionCategory::Phone => "[PHONE]",
            RedactionCategory::Ssn => "[SSN]",
            RedactionCategory::UserDefined => "[REDACTED]",
        }
    }

    /// Environment variable holding this category's pattern.
    pub fn env_var(&self) -> &'static str {
        match self {
            RedactionCategory::Email => "REDACT_EMAIL_PATTERN",
            RedactionCategory::CreditCard => "REDACT_CREDIT_CARD_PATTERN",
            RedactionCategory::Phone => "REDACT_PHONE_PATTERN",
            RedactionCategory::Ssn => "REDACT_SSN_PATTERN",
            RedactionCategory::UserDefined => "REDACT_USER_DEFINED_PATTERN",
        }
    }

    pub fn default_pattern(&self) -> &'static str {
        match self {
            RedactionCategory::Email => DEFAULT_EMAIL_PATTERN,
            RedactionCategory::CreditCard => DEFAULT_CREDIT_CARD_PATTERN,
            RedactionCategory::Phone => DEFAULT_PHONE_PATTERN,
            RedactionCategory::Ssn => DEFAULT_SSN_PATTERN,
            RedactionCategory::UserDefined => "",
        }
    }
}

impl fmt::Display for RedactionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RedactionCategory::Email => "email",
            RedactionCategory::CreditCard => "credit card",
            RedactionCategory::Phone => "phone",
            RedactionCategory::Ssn => "ssn",
            RedactionCategory::UserDefined => "user-defined",
        };
        f.write_str(name)
    }
}

/// How a rule matches. `Disabled` is inert: it never changes the text.
#[derive(Debug, Clone)]
pub enum Matcher {
    Pattern(Regex),
    Disabled,
}

impl Matcher {
    /// Compiles `pattern`; empty patterns and the never-match idiom become [`Matcher::Disabled`].
    pub fn compile(category: RedactionCategory, pattern: &str) -> Result<Self, ConfigError> {
        let trimmed = pattern.trim();
        if trimmed.is_empty() || trimmed == NEVER_MATCH_IDIOM {
            return Ok(Matcher::Disabled);
        }
        Regex::new(trimmed)
            .map(Matcher::Pattern)
            .map_err(|e| ConfigError::InvalidPattern {
                category: category.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, Matcher::Disabled)
    }
}

/// One compiled rule. Immutable after construction.
#[derive(Debug, Clone)]
pub struct RedactionRule {
    pub category: RedactionCategory,
    pub matcher: Matcher,
    pub replacement: String,
}

impl RedactionRule {
    pub fn new(category: RedactionCategory, pattern: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            category,
            matcher: Matcher::compile(category, pattern)?,
            replacement: category.replacement().to_string(),
        })
    }

    pub fn with_replacement(mut self, replacement: impl Into<String>) -> Self {
        self.replacement = replacement.into();
        self
    }
}

/// Ordered rule list. Shared read-only behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct RedactionRules {
    rules: Vec<RedactionRule>,
}

impl RedactionRules {
    pub fn new(rules: Vec<RedactionRule>) -> Self {
        Self { rules }
    }

    /// Every category with its default pattern, in configured order.
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::from_patterns(
            RedactionCategory::ALL
                .iter()
                .map(|c| (*c, c.default_pattern().to_string())),
        )
    }

    pub fn from_patterns(
        patterns: impl IntoIterator<Item = (RedactionCategory, String)>,
    ) -> Result<Self, ConfigError> {
        let rules = patterns
            .into_iter()
            .map(|(category, pattern)| RedactionRule::new(category, &pattern))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[RedactionRule] {
        &self.rules
    }

    /// Number of rules that can change text.
    pub fn active_count(&self) -> usize {
        self.rules.iter().filter(|r| !r.matcher.is_disabled()).count()
    }
}
