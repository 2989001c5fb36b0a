//! Runtime configuration

use crate::dispatcher::DEFAULT_REQUEST_TIMEOUT;
use crate::typing::DEFAULT_MIN_VISIBLE;
use crate::validator::{Denylist, InputValidator, DEFAULT_MAX_LEN};
use std::str::FromStr;
use std::time::Duration;

/// Configuration for the conversation core
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Maximum message length in characters, after trimming
    pub max_len: usize,
    /// Minimum time the typing indicator stays visible once shown
    pub min_visible: Duration,
    /// Bound on one reply backend call
    pub request_timeout: Duration,
    /// Case-insensitive substrings that make a message inappropriate
    pub denylist: Vec<String>,
    /// Reply backend base URL (e.g. `http://192.168.1.20:8000`); offline when unset
    pub backend_url: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_len: DEFAULT_MAX_LEN,
            min_visible: DEFAULT_MIN_VISIBLE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            denylist: Vec::new(),
            backend_url: None,
        }
    }
}

impl ChatConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unparseable values fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            max_len: parse_or(&lookup, "KIVVY_MAX_LEN", defaults.max_len),
            min_visible: Duration::from_millis(parse_or(
                &lookup,
                "KIVVY_MIN_VISIBLE_MS",
                duration_millis(defaults.min_visible),
            )),
            request_timeout: Duration::from_millis(parse_or(
                &lookup,
                "KIVVY_REQUEST_TIMEOUT_MS",
                duration_millis(defaults.request_timeout),
            )),
            denylist: lookup("KIVVY_DENYLIST").map_or(defaults.denylist, |raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|term| !term.is_empty())
                    .map(String::from)
                    .collect()
            }),
            backend_url: lookup("KIVVY_BACKEND_URL")
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty()),
        }
    }

    pub fn validator(&self) -> InputValidator {
        InputValidator::new(self.max_len, Denylist::new(&self.denylist))
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, %default, "Invalid config value, using default");
            default
        }),
    }
}
