//! Typed environment lookups. Unset or blank variables fall back to the default; set but
//! unparseable values are a [`ConfigError::InvalidValue`].

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::core::ConfigError;

/// Value of `name` when set and non-blank.
pub(crate) fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|s| !s.trim().is_empty())
}

pub(crate) fn string_or(name: &str, default: &str) -> String {
    var(name).unwrap_or_else(|| default.to_string())
}

pub(crate) fn parse_or<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match var(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| invalid(name, &raw)),
    }
}

/// Accepts `true/false`, `1/0`, `yes/no`, `on/off` in any case.
pub(crate) fn bool_or(name: &str, default: bool) -> Result<bool, ConfigError> {
    match var(name) {
        None => Ok(default),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(invalid(name, &raw)),
        },
    }
}

/// Seconds as a non-negative float (`1.5` is allowed).
pub(crate) fn secs_or(name: &str, default: Duration) -> Result<Duration, ConfigError> {
    match var(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(|s| Duration::try_from_secs_f64(s).ok())
            .ok_or_else(|| invalid(name, &raw)),
    }
}

pub(crate) fn invalid(name: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
    }
}
