//! Error types for magination
//!
//! All public APIs return `Result<T, Error>` where Error is defined here.
//! The crate deliberately does not retry or translate collaborator
//! failures: store and upstream errors propagate as-is, leaving the
//! persisted slots in their last successfully-written state.

use thiserror::Error;

/// The main error type for magination
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid construction-time configuration, e.g. an empty source list.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The durable key-value store failed a read or write.
    #[error("Store error: {message}")]
    Store { message: String },

    /// An upstream query function failed.
    #[error("Upstream query failed: {message}")]
    Upstream { message: String },

    /// A persisted slot could not be encoded or decoded.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A failure that fits none of the categories above.
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create an upstream error
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }

    /// Create an uncategorized error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

/// Result type alias for magination
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("sources must not be empty");
        assert_eq!(
            err.to_string(),
            "Configuration error: sources must not be empty"
        );

        let err = Error::store("read failed");
        assert_eq!(err.to_string(), "Store error: read failed");

        let err = Error::upstream("backend unavailable");
        assert_eq!(err.to_string(), "Upstream query failed: backend unavailable");

        let err = Error::other("connection reset");
        assert_eq!(err.to_string(), "connection reset");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::JsonParse(_)));
    }
}
