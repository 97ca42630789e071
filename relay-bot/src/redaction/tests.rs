//! Redaction tests.

use super::*;
use crate::core::ConfigError;

fn defaults() -> RedactionRules {
    RedactionRules::defaults().unwrap()
}

/// **Test: Text that matches no rule comes back unchanged.**
#[test]
fn test_redact_identity_on_non_matching_text() {
    let rules = defaults();
    for text in ["", "hello world", "version 1.2.3 is out", "**bold** and `code`", "日本語のテキスト"] {
        assert_eq!(redact(text, &rules), text);
    }
}

#[test]
fn test_redact_each_default_category() {
    let rules = defaults();
    assert_eq!(redact("contact a@b.com now", &rules), "contact [EMAIL] now");
    assert_eq!(
        redact("card 4111 1111 1111 1111 ok", &rules),
        "card [CREDIT CARD] ok"
    );
    assert_eq!(redact("call 555-123-4567 today", &rules), "call [PHONE] today");
    assert_eq!(redact("ssn 123-45-6789", &rules), "ssn [SSN]");
}

/// **Test: A rule with a custom replacement uses it.**
#[test]
fn test_redact_custom_replacement() {
    let rule = RedactionRule::new(RedactionCategory::Email, DEFAULT_EMAIL_PATTERN)
        .unwrap()
        .with_replacement("[REDACTED]");
    let rules = RedactionRules::new(vec![rule]);
    assert_eq!(redact("contact a@b.com now", &rules), "contact [REDACTED] now");
}

/// **Test: Replacement text is literal; `$` is not a capture-group reference.**
#[test]
fn test_redact_replacement_is_literal() {
    let rule = RedactionRule::new(RedactionCategory::UserDefined, r"secret-(\d+)")
        .unwrap()
        .with_replacement("$1");
    let rules = RedactionRules::new(vec![rule]);
    assert_eq!(redact("key secret-42", &rules), "key $1");
}

/// **Test: Rules that touch disjoint text give the same result in either order.**
#[test]
fn test_redact_independent_rules_commute() {
    let email = RedactionRule::new(RedactionCategory::Email, DEFAULT_EMAIL_PATTERN).unwrap();
    let ssn = RedactionRule::new(RedactionCategory::Ssn, DEFAULT_SSN_PATTERN).unwrap();
    let forward = RedactionRules::new(vec![email.clone(), ssn.clone()]);
    let backward = RedactionRules::new(vec![ssn, email]);
    let text = "mail x.y@example.org, ssn 123-45-6789.";
    assert_eq!(redact(text, &forward), redact(text, &backward));
    assert_eq!(redact(text, &forward), "mail [EMAIL], ssn [SSN].");
}

/// **Test: Rules compose sequentially; a later rule sees an earlier rule's output.**
#[test]
fn test_redact_is_sequential() {
    let rules = RedactionRules::from_patterns(vec![
        (RedactionCategory::Email, DEFAULT_EMAIL_PATTERN.to_string()),
        (RedactionCategory::UserDefined, r"\[EMAIL\]".to_string()),
    ])
    .unwrap();
    assert_eq!(redact("a@b.com", &rules), "[REDACTED]");
}

/// **Test: Empty and never-match patterns compile to a disabled, inert rule.**
#[test]
fn test_disabled_patterns() {
    for pattern in ["", "   ", "(?!)"] {
        let rule = RedactionRule::new(RedactionCategory::UserDefined, pattern).unwrap();
        assert!(rule.matcher.is_disabled(), "pattern {:?}", pattern);
    }
    let rules = defaults();
    assert_eq!(rules.rules().len(), 5);
    assert_eq!(rules.active_count(), 4);
}

#[test]
fn test_malformed_pattern_is_config_error() {
    let err = RedactionRule::new(RedactionCategory::Phone, "(unclosed").unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidPattern { ref category, .. } if category == "phone"
    ));
}

/// **Test: Directions are independent; a disabled direction is the identity.**
#[test]
fn test_policy_directions() {
    let policy = RedactionPolicy::new(Arc::new(defaults()), true, false);
    assert_eq!(policy.redact_inbound("a@b.com"), "[EMAIL]");
    assert_eq!(policy.redact_outbound("a@b.com"), "a@b.com");

    let disabled = RedactionPolicy::disabled();
    assert_eq!(disabled.redact_inbound("a@b.com"), "a@b.com");
    assert!(!disabled.outbound_enabled());
}

/// **Test: Rules are shared across threads and redact concurrently.**
#[test]
fn test_redact_concurrently() {
    let rules = Arc::new(defaults());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let rules = rules.clone();
            std::thread::spawn(move || redact(&format!("user{}@example.com", i), &rules))
        })
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap(), "[EMAIL]");
    }
}
