//! In-memory implementation of the NodeClient trait.
//!
//! This is primarily for testing. It models the parts of a node that the
//! catchup coordinator and block fetcher observe: a committed round that
//! advances toward a network tip, a window of servable blocks and deltas,
//! a follower sync round, and a fast catchup that completes after a number
//! of status polls. Failures can be scripted per operation.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::json;
use tokio::sync::watch;

use conduit_core::{Catchpoint, Genesis, NodeStatus, Round};

use crate::client::NodeClient;
use crate::error::{NodeError, Result};

/// A recorded call against the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeCall {
    Genesis,
    Status,
    StatusAfterRound(Round),
    RawBlock(Round),
    RawDelta(Round),
    SetSyncRound(Round),
    StartCatchup(String),
}

impl NodeCall {
    fn op(&self) -> NodeOp {
        match self {
            NodeCall::Genesis => NodeOp::Genesis,
            NodeCall::Status => NodeOp::Status,
            NodeCall::StatusAfterRound(_) => NodeOp::StatusAfterRound,
            NodeCall::RawBlock(_) => NodeOp::RawBlock,
            NodeCall::RawDelta(_) => NodeOp::RawDelta,
            NodeCall::SetSyncRound(_) => NodeOp::SetSyncRound,
            NodeCall::StartCatchup(_) => NodeOp::StartCatchup,
        }
    }
}

/// Operation kinds, used to script failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeOp {
    Genesis,
    Status,
    StatusAfterRound,
    RawBlock,
    RawDelta,
    SetSyncRound,
    StartCatchup,
}

/// In-memory node.
///
/// Thread-safe via Mutex; round changes are broadcast on a watch channel so
/// that `status_after_round` can block like the real endpoint.
pub struct MemoryNode {
    inner: Mutex<MemoryNodeInner>,
    round_tx: watch::Sender<Round>,
    wait_timeout: Duration,
}

struct MemoryNodeInner {
    genesis: Genesis,
    follower: bool,

    /// Last committed round.
    last_round: Round,
    /// Oldest round the node can still serve a block for.
    earliest_round: Round,
    /// Highest round the network has produced.
    tip: Round,
    /// Follower sync round, if one has been set.
    sync_round: Option<Round>,
    /// Oldest round a delta is retained for (follower only).
    delta_floor: Round,

    /// Catchpoint being restored and polls left until it completes.
    catchpoint: Option<Catchpoint>,
    catchup_polls: usize,
    catchup_remaining: usize,

    /// Explicit block payloads, overriding the synthetic ones.
    blocks: HashMap<Round, Bytes>,

    failures: HashMap<NodeOp, usize>,
    always_fail: HashMap<NodeOp, bool>,
    calls: Vec<NodeCall>,
}

impl MemoryNode {
    /// A node serving rounds `0..=last_round` in archival mode.
    pub fn archival(last_round: Round) -> Self {
        Self::build(false, last_round)
    }

    /// A follower node at `last_round` with deltas retained from round 1.
    pub fn follower(last_round: Round) -> Self {
        Self::build(true, last_round)
    }

    fn build(follower: bool, last_round: Round) -> Self {
        let (round_tx, _) = watch::channel(last_round);
        Self {
            inner: Mutex::new(MemoryNodeInner {
                genesis: Genesis {
                    network: "testnet".into(),
                    schema_id: "v1.0".into(),
                    proto: "test-proto".into(),
                    ..Default::default()
                },
                follower,
                last_round,
                earliest_round: 0,
                tip: last_round,
                sync_round: None,
                delta_floor: 1,
                catchpoint: None,
                catchup_polls: 2,
                catchup_remaining: 0,
                blocks: HashMap::new(),
                failures: HashMap::new(),
                always_fail: HashMap::new(),
                calls: Vec::new(),
            }),
            round_tx,
            wait_timeout: Duration::from_secs(60),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Builders
    // ─────────────────────────────────────────────────────────────────────────

    /// Only rounds from `earliest` onward are servable.
    pub fn with_earliest_round(self, earliest: Round) -> Self {
        self.lock().earliest_round = earliest;
        self
    }

    /// The network has produced rounds up to `tip`; the node advances
    /// toward it while waited on.
    pub fn with_tip(self, tip: Round) -> Self {
        self.lock().tip = tip;
        self
    }

    /// Deltas are retained from `floor` onward.
    pub fn with_delta_floor(self, floor: Round) -> Self {
        self.lock().delta_floor = floor;
        self
    }

    /// Number of status polls a fast catchup takes. `usize::MAX` never
    /// completes.
    pub fn with_catchup_polls(self, polls: usize) -> Self {
        self.lock().catchup_polls = polls;
        self
    }

    pub fn with_genesis(self, genesis: Genesis) -> Self {
        self.lock().genesis = genesis;
        self
    }

    /// How long `status_after_round` blocks when the node cannot advance.
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scripting and inspection
    // ─────────────────────────────────────────────────────────────────────────

    /// Make the next `count` calls of `op` fail with a 500.
    pub fn fail_next(&self, op: NodeOp, count: usize) {
        *self.lock().failures.entry(op).or_default() += count;
    }

    /// Make every call of `op` fail until cleared.
    pub fn fail_always(&self, op: NodeOp, enabled: bool) {
        self.lock().always_fail.insert(op, enabled);
    }

    /// Serve `body` for `round` instead of a synthetic block, even outside
    /// the servable window.
    pub fn insert_block(&self, round: Round, body: impl Into<Bytes>) {
        self.lock().blocks.insert(round, body.into());
    }

    /// Commit rounds up to `round`.
    pub fn advance_to(&self, round: Round) {
        let mut inner = self.lock();
        inner.tip = inner.tip.max(round);
        inner.last_round = inner.last_round.max(round);
        let last = inner.last_round;
        drop(inner);
        self.round_tx.send_replace(last);
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<NodeCall> {
        self.lock().calls.clone()
    }

    /// Number of calls of `op` made so far.
    pub fn count(&self, op: NodeOp) -> usize {
        self.lock().calls.iter().filter(|c| c.op() == op).count()
    }

    /// Every sync round that was set, in order.
    pub fn sync_rounds(&self) -> Vec<Round> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                NodeCall::SetSyncRound(r) => Some(*r),
                _ => None,
            })
            .collect()
    }

    pub fn last_round(&self) -> Round {
        self.lock().last_round
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryNodeInner> {
        // A poisoned lock only means another test thread panicked.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record the call and apply any scripted failure.
    fn record(&self, call: NodeCall) -> Result<()> {
        let mut inner = self.lock();
        let op = call.op();
        inner.calls.push(call);

        let scripted = match inner.failures.get_mut(&op) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        };
        if scripted || inner.always_fail.get(&op).copied().unwrap_or(false) {
            return Err(NodeError::Status {
                status: 500,
                body: format!("injected failure for {op:?}"),
            });
        }
        Ok(())
    }

    fn publish(&self) {
        let last = self.lock().last_round;
        self.round_tx.send_replace(last);
    }
}

impl MemoryNodeInner {
    /// Highest round the node is allowed to reach.
    fn limit(&self) -> Round {
        match (self.follower, self.sync_round) {
            (true, Some(sync)) => self.tip.min(sync),
            _ => self.tip,
        }
    }

    fn snapshot(&self) -> NodeStatus {
        let mut status = NodeStatus {
            last_round: self.last_round,
            ..Default::default()
        };

        if let Some(cp) = &self.catchpoint {
            let done = (self.catchup_polls - self.catchup_remaining) as u64;
            status.catchpoint = cp.label();
            status.catchpoint_total_accounts = self.catchup_polls as u64;
            status.catchpoint_processed_accounts = done;
        }
        status
    }

    /// One status poll's worth of catchup progress.
    fn step_catchup(&mut self) {
        let Some(round) = self.catchpoint.as_ref().map(Catchpoint::round) else {
            return;
        };

        if self.catchup_remaining == usize::MAX {
            return;
        }

        self.catchup_remaining = self.catchup_remaining.saturating_sub(1);
        if self.catchup_remaining == 0 {
            self.catchpoint = None;
            self.last_round = round;
            self.earliest_round = round;
            self.delta_floor = round.max(1);
            self.tip = self.tip.max(round);
            self.sync_round = None;
        }
    }

    fn synthetic_block(&self, round: Round) -> Bytes {
        let mut block = json!({
            "gen": self.genesis.id(),
            "proto": self.genesis.proto,
            "ts": 1_700_000_000u64 + round,
            "txns": [{"txn": {"type": "pay", "fv": round}}],
        });
        if round > 0 {
            block["rnd"] = json!(round);
            block["prev"] = json!(format!("blk-{}", round - 1));
        }

        let response = if round > 0 {
            json!({"block": block, "cert": {"rnd": round, "step": 2}})
        } else {
            json!({ "block": block })
        };
        Bytes::from(response.to_string())
    }
}

impl Default for MemoryNode {
    fn default() -> Self {
        Self::archival(0)
    }
}

#[async_trait]
impl NodeClient for MemoryNode {
    async fn genesis(&self) -> Result<Genesis> {
        self.record(NodeCall::Genesis)?;
        Ok(self.lock().genesis.clone())
    }

    async fn status(&self) -> Result<NodeStatus> {
        self.record(NodeCall::Status)?;
        let status = {
            let mut inner = self.lock();
            inner.step_catchup();
            inner.snapshot()
        };
        self.publish();
        Ok(status)
    }

    async fn status_after_round(&self, round: Round) -> Result<NodeStatus> {
        self.record(NodeCall::StatusAfterRound(round))?;

        // Advance toward the target if the node is allowed to.
        let mut rx = {
            let mut inner = self.lock();
            if inner.catchpoint.is_none() && inner.last_round <= round {
                let reachable = inner.limit().min(round + 1);
                inner.last_round = inner.last_round.max(reachable);
            }
            self.round_tx.subscribe()
        };
        self.publish();

        let behind = *rx.borrow_and_update() <= round;
        if behind {
            let _ = tokio::time::timeout(self.wait_timeout, rx.wait_for(|r| *r > round)).await;
        }

        Ok(self.lock().snapshot())
    }

    async fn raw_block(&self, round: Round) -> Result<Bytes> {
        self.record(NodeCall::RawBlock(round))?;
        let inner = self.lock();

        if inner.catchpoint.is_some() {
            return Err(NodeError::Status {
                status: 503,
                body: "node is catching up".into(),
            });
        }
        if let Some(body) = inner.blocks.get(&round) {
            return Ok(body.clone());
        }
        if round < inner.earliest_round || round > inner.last_round {
            return Err(NodeError::Status {
                status: 404,
                body: format!("block {round} not available"),
            });
        }

        Ok(inner.synthetic_block(round))
    }

    async fn raw_delta(&self, round: Round) -> Result<Bytes> {
        self.record(NodeCall::RawDelta(round))?;
        let inner = self.lock();

        if !inner.follower {
            return Err(NodeError::Status {
                status: 404,
                body: "deltas are only served in follower mode".into(),
            });
        }
        if round == 0 || round < inner.delta_floor || round > inner.last_round {
            return Err(NodeError::Status {
                status: 404,
                body: format!("failed to retrieve information from the ledger for round {round}"),
            });
        }

        let delta = json!({
            "Accts": {"Accts": [], "AppResources": [], "AssetResources": []},
            "Hdr": {"rnd": round},
            "Totals": {},
        });
        Ok(Bytes::from(delta.to_string()))
    }

    async fn set_sync_round(&self, round: Round) -> Result<()> {
        self.record(NodeCall::SetSyncRound(round))?;
        let mut inner = self.lock();

        if !inner.follower {
            return Err(NodeError::Status {
                status: 400,
                body: "sync round requires follower mode".into(),
            });
        }
        if round < inner.last_round {
            return Err(NodeError::Status {
                status: 400,
                body: format!(
                    "sync round {round} is below the node round {}",
                    inner.last_round
                ),
            });
        }

        inner.sync_round = Some(round);
        Ok(())
    }

    async fn start_catchpoint_catchup(&self, label: &str) -> Result<()> {
        self.record(NodeCall::StartCatchup(label.to_string()))?;
        let catchpoint = Catchpoint::parse(label)?;

        let mut inner = self.lock();
        inner.catchup_remaining = inner.catchup_polls;
        inner.catchpoint = Some(catchpoint);
        Ok(())
    }
}
