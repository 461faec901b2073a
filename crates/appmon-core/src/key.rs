//! Metric name escaping.
//!
//! Every name passed to the monitor goes through exactly one `KeyHandler`
//! before it is used as a registry key. Two names that escape to the same
//! string address the same metric.

use regex::Regex;

use crate::error::{MonitorError, Result};

/// Turns an application-chosen metric name into a registry key.
pub trait KeyHandler: Send + Sync {
    fn handle(&self, key: &str) -> Result<String>;
}

/// Passes names through unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct TransparentKeyHandler;

impl KeyHandler for TransparentKeyHandler {
    fn handle(&self, key: &str) -> Result<String> {
        Ok(key.to_string())
    }
}

/// Characters rewritten by [`EscapingKeyHandler`]. These collide with the
/// property syntax of typical exposition backends.
const ESCAPED_CHARS: [char; 7] = [':', '=', ',', '"', '*', '?', '\\'];

/// Rewrites separator and wildcard characters (and whitespace) to `_`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EscapingKeyHandler;

impl KeyHandler for EscapingKeyHandler {
    fn handle(&self, key: &str) -> Result<String> {
        Ok(key
            .chars()
            .map(|c| {
                if c.is_whitespace() || ESCAPED_CHARS.contains(&c) {
                    '_'
                } else {
                    c
                }
            })
            .collect())
    }
}

/// Replaces every match of a regular expression.
#[derive(Debug, Clone)]
pub struct RegexKeyHandler {
    pattern: Regex,
    replacement: String,
}

impl RegexKeyHandler {
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| MonitorError::BadConfig(format!("invalid key pattern {pattern:?}: {e}")))?;
        Ok(Self {
            pattern,
            replacement: replacement.into(),
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

impl KeyHandler for RegexKeyHandler {
    fn handle(&self, key: &str) -> Result<String> {
        // NoExpand: the replacement is taken literally, `$` has no meaning.
        Ok(self
            .pattern
            .replace_all(key, regex::NoExpand(&self.replacement))
            .into_owned())
    }
}

/// Rejects names outside `[A-Za-z0-9._-]+` instead of rewriting them.
#[derive(Debug, Default, Clone, Copy)]
pub struct ValidatingKeyHandler;

impl ValidatingKeyHandler {
    fn is_allowed(c: char) -> bool {
        c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
    }
}

impl KeyHandler for ValidatingKeyHandler {
    fn handle(&self, key: &str) -> Result<String> {
        if key.is_empty() {
            return Err(MonitorError::InvalidKey("empty metric name".into()));
        }
        if let Some(bad) = key.chars().find(|c| !Self::is_allowed(*c)) {
            return Err(MonitorError::InvalidKey(format!(
                "{key:?} contains disallowed character {bad:?}"
            )));
        }
        Ok(key.to_string())
    }
}
