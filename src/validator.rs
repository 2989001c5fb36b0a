//! Input validation applied to raw user text before it reaches the store

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Default maximum message length, in characters
pub const DEFAULT_MAX_LEN: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationError {
    #[error("Message is empty")]
    EmptyInput,
    #[error("Message is longer than {max} characters")]
    TooLong { max: usize },
    #[error("Message contains inappropriate content")]
    Inappropriate,
}

/// Pluggable moderation predicate
pub trait ContentFilter: Send + Sync {
    fn is_inappropriate(&self, text: &str) -> bool;
}

impl<F> ContentFilter for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_inappropriate(&self, text: &str) -> bool {
        self(text)
    }
}

/// Case-insensitive substring denylist
#[derive(Debug, Clone, Default)]
pub struct Denylist {
    terms: Vec<String>,
}

impl Denylist {
    /// Terms match exactly as given, whitespace included. Empty entries are
    /// dropped; they would otherwise match everything.
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms = terms
            .into_iter()
            .filter(|t| !t.as_ref().is_empty())
            .map(|t| t.as_ref().to_lowercase())
            .collect();
        Self { terms }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl ContentFilter for Denylist {
    fn is_inappropriate(&self, text: &str) -> bool {
        if self.terms.is_empty() {
            return false;
        }
        let haystack = text.to_lowercase();
        self.terms.iter().any(|term| haystack.contains(term.as_str()))
    }
}

/// Trims, bounds and screens user input. Deterministic for a given filter.
#[derive(Clone)]
pub struct InputValidator {
    max_len: usize,
    filter: Arc<dyn ContentFilter>,
}

impl fmt::Debug for InputValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputValidator")
            .field("max_len", &self.max_len)
            .finish_non_exhaustive()
    }
}

impl Default for InputValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LEN, Denylist::default())
    }
}

impl InputValidator {
    pub fn new(max_len: usize, filter: impl ContentFilter + 'static) -> Self {
        Self {
            max_len,
            filter: Arc::new(filter),
        }
    }

    /// Returns the trimmed text, otherwise byte-for-byte unchanged
    pub fn validate(&self, raw: &str) -> Result<String, ValidationError> {
        let trimmed = raw.trim();
        let len = trimmed.chars().count();

        if len == 0 {
            return Err(ValidationError::EmptyInput);
        }
        if len > self.max_len {
            return Err(ValidationError::TooLong { max: self.max_len });
        }
        if self.filter.is_inappropriate(trimmed) {
            return Err(ValidationError::Inappropriate);
        }

        Ok(trimmed.to_string())
    }
}
