//! Node catchup coordination.
//!
//! Decides whether the backing node can already serve the target round,
//! runs a catchpoint fast catchup when it cannot, and waits for the node
//! to reach the target.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{error, info};

use conduit_core::{Cancellation, Catchpoint, Mode, Round};
use conduit_node::NodeClient;

use crate::error::{CatchupError, Result};
use crate::lookup::{CatalogSource, CatchpointLookupClient, HttpCatalog};

/// How often a running fast catchup is polled.
pub const CATCHUP_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Fast catchup settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CatchupConfig {
    /// Admin API token. Fast catchup is only attempted when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_token: Option<String>,

    /// Explicit catchpoint label. Looked up from the catalog when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catchpoint: Option<String>,
}

impl CatchupConfig {
    pub fn admin_token(&self) -> Option<&str> {
        self.admin_token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn catchpoint(&self) -> Option<&str> {
        self.catchpoint.as_deref().filter(|c| !c.is_empty())
    }
}

/// Decide whether a fast catchup to `catchpoint_round` helps reach
/// `target_round` from `node_round`.
///
/// Returns an error when the node is past the target and the catchpoint
/// cannot bring it back before the target.
pub fn check_rounds(catchpoint_round: Round, node_round: Round, target_round: Round) -> Result<bool> {
    let can_catchup = catchpoint_round < target_round;
    let must_catchup = target_round < node_round;
    let should_catchup = node_round < catchpoint_round;

    if can_catchup && must_catchup {
        info!(
            node_round,
            target_round, catchpoint_round, "catchup required, node round ahead of target round"
        );
        return Ok(true);
    }

    if can_catchup && should_catchup {
        info!(node_round, target_round, catchpoint_round, "catchup requested");
        return Ok(true);
    }

    if !can_catchup && must_catchup {
        let err = CatchupError::CatchpointAhead {
            node_round,
            catchpoint_round,
            target_round,
        };
        error!(%err, "catchup required but no valid catchpoint available");
        return Err(err);
    }

    info!(node_round, target_round, catchpoint_round, "no catchup required");
    Ok(false)
}

/// Brings a node to the point where it can serve a target round.
pub struct NodeCatchupCoordinator<N, S: CatalogSource = HttpCatalog> {
    node: N,
    lookup: CatchpointLookupClient<S>,
    mode: Mode,
    network: String,
    config: CatchupConfig,
    cancel: Cancellation,
}

impl<N: NodeClient, S: CatalogSource> NodeCatchupCoordinator<N, S> {
    pub fn new(node: N, lookup: CatchpointLookupClient<S>, mode: Mode, cancel: Cancellation) -> Self {
        Self {
            node,
            lookup,
            mode,
            network: String::new(),
            config: CatchupConfig::default(),
            cancel,
        }
    }

    /// Network whose catalog is searched for catchpoints.
    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = network.into();
        self
    }

    pub fn with_catchup_config(mut self, config: CatchupConfig) -> Self {
        self.config = config;
        self
    }

    pub fn node(&self) -> &N {
        &self.node
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Synchronization
    // ─────────────────────────────────────────────────────────────────────────

    /// Make the node able to serve `target_round`.
    ///
    /// Does nothing when the node can already serve it. Otherwise runs a
    /// fast catchup if an admin token is configured and a suitable
    /// catchpoint exists, sets the follower sync round, and waits until the
    /// node has committed the target.
    pub async fn synchronize(&self, target_round: Round) -> Result<()> {
        if !self.needs_catchup(target_round).await? {
            info!(target_round, "no catchup required to reach round");
            return Ok(());
        }
        info!(target_round, "catchup required to reach round");

        if let Some(catchpoint) = self.resolve_catchpoint(target_round).await? {
            let status = self
                .call(
                    "received unexpected error failed to get node status",
                    self.node.status(),
                )
                .await?;

            if check_rounds(catchpoint.round(), status.last_round, target_round)? {
                self.fast_catchup(&catchpoint).await?;
            }
        }

        // Setting it earlier fails when the node is ahead of the target.
        if self.mode.is_follower() {
            self.call(
                format!("received unexpected error setting sync round ({target_round})"),
                self.node.set_sync_round(target_round),
            )
            .await?;
        }

        self.wait_for_round(target_round).await
    }

    /// Whether the node is unable to serve `target_round` as is.
    ///
    /// Only cancellation is an error; a failed probe means catchup.
    pub async fn needs_catchup(&self, target_round: Round) -> Result<bool> {
        let probe = match self.mode {
            Mode::Follower if target_round == 0 => {
                info!("no state deltas are ever available for round 0");
                return Ok(true);
            }
            Mode::Follower => self.cancel.run(self.node.raw_delta(target_round)).await,
            Mode::Archival => self.cancel.run(self.node.raw_block(target_round)).await,
        };

        match probe {
            None => Err(CatchupError::Cancelled),
            Some(Ok(_)) => Ok(false),
            Some(Err(e)) => {
                match self.mode {
                    Mode::Follower => {
                        info!(round = target_round, error = %e, "unable to fetch state delta for round")
                    }
                    Mode::Archival => {
                        info!(round = target_round, error = %e, "unable to fetch block for round")
                    }
                }
                Ok(true)
            }
        }
    }

    /// The catchpoint to restore, if fast catchup is possible at all.
    ///
    /// Requires an admin token. A configured label wins over the catalog.
    pub async fn resolve_catchpoint(&self, target_round: Round) -> Result<Option<Catchpoint>> {
        if self.config.admin_token().is_none() {
            info!("no admin token configured, skipping fast catchup");
            return Ok(None);
        }

        if let Some(label) = self.config.catchpoint() {
            return Ok(Some(Catchpoint::parse(label)?));
        }

        match self.cancel.run(self.lookup.lookup(&self.network, target_round)).await {
            None => Err(CatchupError::Cancelled),
            Some(found) => Ok(Some(found?)),
        }
    }

    async fn fast_catchup(&self, catchpoint: &Catchpoint) -> Result<()> {
        let label = catchpoint.label();
        info!(%label, "starting catchpoint catchup");

        self.call(
            format!("received unexpected error failed to start catchpoint catchup with label {label}"),
            self.node.start_catchpoint_catchup(&label),
        )
        .await?;

        self.monitor_catchup().await
    }

    /// Poll the node until its catchpoint catchup finishes.
    async fn monitor_catchup(&self) -> Result<()> {
        let start = Instant::now();

        loop {
            if self
                .cancel
                .run(tokio::time::sleep(CATCHUP_POLL_INTERVAL))
                .await
                .is_none()
            {
                return Err(CatchupError::Cancelled);
            }

            let status = self
                .call(
                    "received unexpected error getting node status",
                    self.node.status(),
                )
                .await?;

            if !status.catchup_in_progress() {
                break;
            }
            info!("catchup phase {}", status.catchup_phase());
        }

        info!(elapsed = ?start.elapsed(), "catchpoint catchup finished");
        Ok(())
    }

    /// Wait until the node has committed `target_round`.
    pub async fn wait_for_round(&self, target_round: Round) -> Result<()> {
        let after = target_round.saturating_sub(1);

        loop {
            let status = self
                .call(
                    "received unexpected error (StatusAfterBlock) waiting for node to catchup",
                    self.node.status_after_round(after),
                )
                .await?;

            if status.last_round >= target_round {
                return Ok(());
            }
            info!(
                node_round = status.last_round,
                target_round, "node has not reached target round yet"
            );
        }
    }

    /// Run a node call against the cancellation signal.
    async fn call<T, F>(&self, context: impl Into<String>, fut: F) -> Result<T>
    where
        F: Future<Output = conduit_node::Result<T>>,
    {
        match self.cancel.run(fut).await {
            None => Err(CatchupError::Cancelled),
            Some(result) => result.map_err(|e| CatchupError::node(context, e)),
        }
    }
}
