//! Shared error type across appmon crates.

use thiserror::Error;

/// Stable error codes (used by config tooling and test vectors).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Metric name rejected by a key handler.
    InvalidKey,
    /// A pull-style provider could not produce a value.
    Unavailable,
    /// Invalid configuration.
    BadConfig,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Exposition adapter failure.
    Exposition,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidKey => "INVALID_KEY",
            ErrorCode::Unavailable => "UNAVAILABLE",
            ErrorCode::BadConfig => "BAD_CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Exposition => "EXPOSITION",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Unified error type used by core and registry.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("invalid metric key: {0}")]
    InvalidKey(String),
    #[error("value unavailable: {0}")]
    Unavailable(String),
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("exposition: {0}")]
    Exposition(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl MonitorError {
    /// Map to a stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            MonitorError::InvalidKey(_) => ErrorCode::InvalidKey,
            MonitorError::Unavailable(_) => ErrorCode::Unavailable,
            MonitorError::BadConfig(_) => ErrorCode::BadConfig,
            MonitorError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            MonitorError::Exposition(_) => ErrorCode::Exposition,
            MonitorError::Internal(_) => ErrorCode::Internal,
        }
    }
}
