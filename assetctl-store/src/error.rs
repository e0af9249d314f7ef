//! Store error types.

use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An environment override could not be parsed.
    #[error("Invalid value for {name}: {value}")]
    InvalidOverride {
        /// Variable name.
        name: String,
        /// Offending value.
        value: String,
    },
}
