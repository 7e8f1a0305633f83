//! Error types for the importers.

use std::path::PathBuf;

use thiserror::Error;

use conduit_catchup::CatchupError;
use conduit_core::{CoreError, Round};
use conduit_node::NodeError;

/// Errors that can occur during importer operations.
#[derive(Debug, Error)]
pub enum ImporterError {
    /// The plugin configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The node answered with an empty genesis document.
    #[error("unable to fetch genesis file from API at {address}")]
    Genesis { address: String },

    /// Bringing the node to the target round failed.
    #[error(transparent)]
    Catchup(#[from] CatchupError),

    /// A node call failed.
    #[error("{context}: {source}")]
    Node {
        context: String,
        #[source]
        source: NodeError,
    },

    /// Every attempt to fetch a block failed.
    #[error(
        "failed to get block for round {round} after {attempts} attempts, check node configuration: {last_error}"
    )]
    FetchExhausted {
        round: Round,
        attempts: usize,
        #[source]
        last_error: NodeError,
    },

    /// The follower has not reached the round yet.
    #[error(
        "ledger state delta not found: node round ({node_round}) is behind required round ({round}), ensure follower node has its sync round set to the required round: {source}"
    )]
    DeltaBehind {
        node_round: Round,
        round: Round,
        #[source]
        source: NodeError,
    },

    /// The follower is at or past the round but no longer has its delta.
    #[error(
        "ledger state delta not found: node round ({node_round}), required round ({round}): verify follower node configuration and ensure follower node has its sync round set to the required round, re-deploying the follower node may be necessary: {source}"
    )]
    DeltaMissing {
        node_round: Round,
        round: Round,
        #[source]
        source: NodeError,
    },

    /// A block, delta or genesis could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] CoreError),

    /// Reading an archive file failed.
    #[error("unable to read file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Registering metrics failed.
    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// A block was requested before `init` completed.
    #[error("importer is not initialized")]
    NotInitialized,

    /// Shutdown was requested.
    #[error("importer cancelled")]
    Cancelled,
}

impl ImporterError {
    /// Whether this error stems from cancellation, however deeply nested.
    pub fn is_cancelled(&self) -> bool {
        match self {
            ImporterError::Cancelled => true,
            ImporterError::Catchup(e) => e.is_cancelled(),
            _ => false,
        }
    }

    pub(crate) fn node(context: impl Into<String>, source: NodeError) -> Self {
        ImporterError::Node {
            context: context.into(),
            source,
        }
    }
}

/// Result type for importer operations.
pub type Result<T> = std::result::Result<T, ImporterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_failure_is_not_cancellation() {
        let err = ImporterError::node(
            "unable to fetch genesis",
            NodeError::Status {
                status: 503,
                body: "catching up".into(),
            },
        );
        assert!(matches!(err, ImporterError::Node { .. }));
        assert!(!err.is_cancelled());
        assert_eq!(err.to_string(), "unable to fetch genesis: HTTP 503: catching up");
    }

    #[test]
    fn test_nested_catchup_cancellation() {
        assert!(ImporterError::Catchup(CatchupError::Cancelled).is_cancelled());
        assert!(ImporterError::Cancelled.is_cancelled());
    }
}
