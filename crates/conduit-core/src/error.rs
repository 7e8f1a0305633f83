//! Error types for Conduit core values.

use thiserror::Error;

/// Errors produced while parsing or decoding core values.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unable to parse catchpoint, invalid format: {0}")]
    InvalidCatchpoint(String),

    #[error("unable to parse catchpoint round in {label}: {source}")]
    InvalidCatchpointRound {
        label: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("importer was set to a mode ({0}) that wasn't supported")]
    InvalidMode(String),

    #[error("decoding error: {0}")]
    Decoding(#[from] serde_json::Error),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
