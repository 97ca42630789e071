//! # Redaction
//!
//! Replaces sensitive substrings (emails, card numbers, phone numbers, SSNs, a user-defined
//! pattern) before text leaves the process: inbound on history sent to the provider, outbound
//! on rendered replies shown in the chat.
//!
//! Rules are compiled once at startup into [`RedactionRules`] and shared behind an `Arc`.
//! [`redact`] is pure and never fails; a malformed pattern is a [`ConfigError`](crate::core::ConfigError)
//! at load time.

mod rules;

pub use rules::{
    Matcher, RedactionCategory, RedactionRule, RedactionRules, DEFAULT_CREDIT_CARD_PATTERN,
    DEFAULT_EMAIL_PATTERN, DEFAULT_PHONE_PATTERN, DEFAULT_SSN_PATTERN,
};

use regex::NoExpand;
use std::borrow::Cow;
use std::sync::Arc;

/// Applies every rule in order; each rule sees the previous rule's output.
pub fn redact(text: &str, rules: &RedactionRules) -> String {
    let mut current = text.to_string();
    for rule in rules.rules() {
        if let Matcher::Pattern(regex) = &rule.matcher {
            let replaced = match regex.replace_all(&current, NoExpand(rule.replacement.as_str())) {
                Cow::Borrowed(_) => None,
                Cow::Owned(s) => Some(s),
            };
            if let Some(s) = replaced {
                current = s;
            }
        }
    }
    current
}

/// Which directions redaction applies to, plus the shared rules.
#[derive(Debug, Clone)]
pub struct RedactionPolicy {
    rules: Arc<RedactionRules>,
    inbound: bool,
    outbound: bool,
}

impl RedactionPolicy {
    pub fn new(rules: Arc<RedactionRules>, inbound: bool, outbound: bool) -> Self {
        Self {
            rules,
            inbound,
            outbound,
        }
    }

    /// Policy that never changes text.
    pub fn disabled() -> Self {
        Self::new(Arc::new(RedactionRules::default()), false, false)
    }

    pub fn inbound_enabled(&self) -> bool {
        self.inbound
    }

    pub fn outbound_enabled(&self) -> bool {
        self.outbound
    }

    pub fn rules(&self) -> &Arc<RedactionRules> {
        &self.rules
    }

    /// Redacts history text before it is sent to the provider.
    pub fn redact_inbound<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if self.inbound {
            Cow::Owned(redact(text, &self.rules))
        } else {
            Cow::Borrowed(text)
        }
    }

    /// Redacts rendered reply text before it is shown in the chat.
    pub fn redact_outbound<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if self.outbound {
            Cow::Owned(redact(text, &self.rules))
        } else {
            Cow::Borrowed(text)
        }
    }
}

#[cfg(test)]
mod tests;
