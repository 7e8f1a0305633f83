//! NodeClient trait: the capability set consumed from the backing node.
//!
//! Exactly the operations the catchup coordinator and the block fetcher
//! need. Implementations include the REST client and an in-memory fake.

use async_trait::async_trait;
use bytes::Bytes;

use conduit_core::{Genesis, NodeStatus, Round};

use crate::error::Result;

/// Async interface to a node.
///
/// None of these calls observe cancellation themselves; callers race them
/// against a [`conduit_core::Cancellation`].
#[async_trait]
pub trait NodeClient: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Chain Information
    // ─────────────────────────────────────────────────────────────────────────

    /// Fetch the chain's genesis document.
    async fn genesis(&self) -> Result<Genesis>;

    /// Current node status.
    async fn status(&self) -> Result<NodeStatus>;

    /// Wait until the node has committed a round after `round`, then
    /// return its status.
    ///
    /// The node may give up after its own timeout and return the current
    /// status anyway; callers must check `last_round`.
    async fn status_after_round(&self, round: Round) -> Result<NodeStatus>;

    // ─────────────────────────────────────────────────────────────────────────
    // Block Data
    // ─────────────────────────────────────────────────────────────────────────

    /// Raw encoded block response for `round`.
    async fn raw_block(&self, round: Round) -> Result<Bytes>;

    /// Raw encoded ledger state delta for `round`.
    ///
    /// Only available on a follower node whose sync round allows it.
    async fn raw_delta(&self, round: Round) -> Result<Bytes>;

    // ─────────────────────────────────────────────────────────────────────────
    // Node Control
    // ─────────────────────────────────────────────────────────────────────────

    /// Set the follower node's sync round.
    async fn set_sync_round(&self, round: Round) -> Result<()>;

    /// Start a fast catchup to the catchpoint `label`.
    ///
    /// Requires administrative credentials.
    async fn start_catchpoint_catchup(&self, label: &str) -> Result<()>;
}

#[async_trait]
impl<N: NodeClient + ?Sized> NodeClient for std::sync::Arc<N> {
    async fn genesis(&self) -> Result<Genesis> {
        (**self).genesis().await
    }

    async fn status(&self) -> Result<NodeStatus> {
        (**self).status().await
    }

    async fn status_after_round(&self, round: Round) -> Result<NodeStatus> {
        (**self).status_after_round(round).await
    }

    async fn raw_block(&self, round: Round) -> Result<Bytes> {
        (**self).raw_block(round).await
    }

    async fn raw_delta(&self, round: Round) -> Result<Bytes> {
        (**self).raw_delta(round).await
    }

    async fn set_sync_round(&self, round: Round) -> Result<()> {
        (**self).set_sync_round(round).await
    }

    async fn start_catchpoint_catchup(&self, label: &str) -> Result<()> {
        (**self).start_catchpoint_catchup(label).await
    }
}
