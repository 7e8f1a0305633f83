//! Error types for catchpoint lookup and catchup.

use thiserror::Error;

use conduit_core::{CoreError, Round};
use conduit_node::NodeError;

/// Errors that can occur while resolving a catchpoint from the catalog.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Transport-level error fetching the catalog.
    #[error("failed to fetch catchpoint catalog: {0}")]
    Http(#[from] reqwest::Error),

    /// The catalog host answered with a non-success status.
    #[error("failed to lookup catchpoint label list ({status}): {body}")]
    Status { status: u16, body: String },

    /// A catalog line could not be parsed.
    #[error("malformed catalog entry: {0}")]
    Malformed(#[from] CoreError),

    /// No cataloged catchpoint precedes the target round.
    #[error("no catchpoint label found for round {round} at: {url}")]
    NotFound { round: Round, url: String },
}

/// Errors that can occur while synchronizing the node.
#[derive(Debug, Error)]
pub enum CatchupError {
    /// A node call failed.
    #[error("{context}: {source}")]
    Node {
        context: String,
        #[source]
        source: NodeError,
    },

    /// Catalog lookup failed.
    #[error("unable to lookup catchpoint: {0}")]
    Lookup(#[from] LookupError),

    /// The configured catchpoint is not a valid label.
    #[error("invalid catchpoint: {0}")]
    InvalidCatchpoint(#[from] CoreError),

    /// Both the node and the catchpoint are past the target round. Only an
    /// operator can recover from this.
    #[error(
        "node round {node_round} and catchpoint round {catchpoint_round} are ahead of target round {target_round}"
    )]
    CatchpointAhead {
        node_round: Round,
        catchpoint_round: Round,
        target_round: Round,
    },

    /// Shutdown was requested while waiting on the node.
    #[error("catchup cancelled")]
    Cancelled,
}

impl CatchupError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CatchupError::Cancelled)
    }

    /// Wrap a node error with call context.
    pub(crate) fn node(context: impl Into<String>, source: NodeError) -> Self {
        CatchupError::Node {
            context: context.into(),
            source,
        }
    }
}

/// Result type for catchup operations.
pub type Result<T> = std::result::Result<T, CatchupError>;
