//! Error types for node access.

use thiserror::Error;

/// Errors that can occur while talking to the node.
#[derive(Debug, Error)]
pub enum NodeError {
    /// HTTP transport error (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The node answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The configured node address could not be parsed.
    #[error("invalid node address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    /// A response body could not be decoded.
    #[error("decoding error: {0}")]
    Decoding(#[from] conduit_core::CoreError),
}

impl NodeError {
    /// Whether the node reported that the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, NodeError::Status { status: 404, .. })
    }
}

/// Result type for node operations.
pub type Result<T> = std::result::Result<T, NodeError>;
