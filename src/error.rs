//! Error types and handling for Gridwatch
//!
//! This module defines the error types used throughout the application.
//! The first three variants form the grid API taxonomy: no response at all,
//! a response with a failing status, and a well-formed response carrying a
//! state code this build does not know.

use thiserror::Error;

/// Result type alias for Gridwatch operations
pub type Result<T> = std::result::Result<T, GridwatchError>;

/// Main error type for Gridwatch
#[derive(Debug, Clone, Error)]
pub enum GridwatchError {
    /// No response was obtained (DNS, connection refused, timeout)
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// A response was received but its status indicates failure
    #[error("API Error: {status} {reason}")]
    Http { status: u16, reason: String },

    /// The response was well-formed but the state code is not recognized
    #[error("Unknown state: {code}")]
    UnknownState { code: i64 },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// HTTP server errors
    #[error("Web server error: {message}")]
    Web { message: String },

    /// Change event delivery errors
    #[error("Event delivery error: {message}")]
    Event { message: String },

    /// Lookup of an unknown monitor
    #[error("Not found: {message}")]
    NotFound { message: String },
}

impl GridwatchError {
    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a new HTTP status error
    pub fn http<S: Into<String>>(status: u16, reason: S) -> Self {
        Self::Http {
            status,
            reason: reason.into(),
        }
    }

    /// Create a new unknown state error
    pub const fn unknown_state(code: i64) -> Self {
        Self::UnknownState { code }
    }

    /// Create a new serialization error
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Create a new web error
    pub fn web<S: Into<String>>(message: S) -> Self {
        Self::Web {
            message: message.into(),
        }
    }

    /// Create a new event delivery error
    pub fn event<S: Into<String>>(message: S) -> Self {
        Self::Event {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Whether this error came from talking to the remote grid API
    pub const fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. }
                | Self::Http { .. }
                | Self::UnknownState { .. }
                | Self::Serialization { .. }
        )
    }
}

impl From<std::io::Error> for GridwatchError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for GridwatchError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<serde_json::Error> for GridwatchError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<reqwest::Error> for GridwatchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::serialization(error_chain(&err))
        } else if err.is_timeout() && !error_chain(&err).contains("timed out") {
            Self::transport(format!("{}: operation timed out", error_chain(&err)))
        } else {
            Self::transport(error_chain(&err))
        }
    }
}

/// `err` followed by every distinct message of its `source()` chain, joined by `": "`
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !text.is_empty() && !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
