//! Error types for outcome-sessions.

use thiserror::Error;

/// Errors raised by the persistence layer of the session store.
///
/// None of these reach callers of the four session operations; the store
/// logs them and keeps the in-memory table authoritative.
#[derive(Error, Debug)]
pub enum SessionStoreError {
    /// I/O error while reading or writing the durable log.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A durable log line could not be decoded.
    #[error("malformed log line {line}: {reason}")]
    Parse { line: usize, reason: String },

    /// Timestamp field is not a valid RFC 3339 value.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Field contains an unknown or truncated escape sequence.
    #[error("invalid escape sequence in field: {0}")]
    InvalidEscape(String),

    /// Store configuration is not usable.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Convenience Result type for session store operations.
pub type Result<T> = std::result::Result<T, SessionStoreError>;
