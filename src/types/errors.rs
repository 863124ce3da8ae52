//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and provide
//! clear error messages with context.

use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for the bridge.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed invocation input (map to INVALID_ARGUMENT).
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found (map to NOT_FOUND).
    #[error("not found: {0}")]
    NotFound(String),

    /// Internal errors (map to INTERNAL).
    #[error("internal error: {0}")]
    Internal(String),

    /// Caller cancelled the invocation (map to CANCELLED).
    #[error("operation cancelled: {0}")]
    Cancelled(String),

    /// Timeout (map to DEADLINE_EXCEEDED).
    #[error("timeout: {0}")]
    Timeout(String),

    /// Automation engine answered with a non-success status.
    #[error("automation engine returned {status}: {body}")]
    Engine { status: u16, body: String },

    /// Completion endpoint answered with a non-success status.
    #[error("completion endpoint returned {status}: {body}")]
    Completion { status: u16, body: String },

    /// Outbound HTTP transport errors.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Base64 payload decoding errors.
    #[error("decode error: {0}")]
    Decode(#[from] base64::DecodeError),

    /// I/O errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable error code for caller-facing error envelopes.
    pub fn to_error_code(&self) -> &'static str {
        match self {
            Error::Validation(_) | Error::Serialization(_) | Error::Decode(_) => {
                "INVALID_ARGUMENT"
            }
            Error::NotFound(_) => "NOT_FOUND",
            Error::Cancelled(_) => "CANCELLED",
            Error::Timeout(_) => "DEADLINE_EXCEEDED",
            Error::Http(e) if e.is_timeout() => "DEADLINE_EXCEEDED",
            Error::Engine { .. } | Error::Completion { .. } | Error::Http(_) => "UNAVAILABLE",
            Error::Internal(_) | Error::Io(_) => "INTERNAL",
        }
    }
}

// Convenience constructors
impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }
}
