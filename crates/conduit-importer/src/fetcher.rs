//! Retrying block retrieval.
//!
//! One call fetches one round: wait for the node to have it, download and
//! decode the block, and in follower mode attach the round's state delta.
//! Transient node failures are retried a fixed number of times.

use std::sync::Arc;

use tokio::time::Instant;
use tracing::error;

use conduit_core::{BlockRecord, Cancellation, LedgerStateDelta, Mode, Round};
use conduit_node::{NodeClient, NodeError};

use crate::error::{ImporterError, Result};
use crate::metrics::{MetricsSink, NoopMetrics};

/// Attempts per round before giving up.
pub const RETRIES: usize = 5;

/// Outcome of a single failed attempt.
enum Attempt {
    /// Worth another try.
    Retry(NodeError),
    /// Stop now.
    Fatal(ImporterError),
}

/// Fetches complete block records from a node.
pub struct RetryingBlockFetcher<N> {
    node: N,
    mode: Mode,
    cancel: Cancellation,
    metrics: Arc<dyn MetricsSink>,
}

impl<N: NodeClient> RetryingBlockFetcher<N> {
    pub fn new(node: N, mode: Mode, cancel: Cancellation) -> Self {
        Self {
            node,
            mode,
            cancel,
            metrics: Arc::new(NoopMetrics),
        }
    }

    /// Report raw block fetch times to `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Switch the sink for subsequent fetches.
    pub fn set_metrics(&mut self, metrics: Arc<dyn MetricsSink>) {
        self.metrics = metrics;
    }

    pub fn node(&self) -> &N {
        &self.node
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Fetch the record for `round`.
    ///
    /// Status and block failures are retried up to [`RETRIES`] times.
    /// Cancellation, undecodable blocks and missing deltas end the call
    /// immediately.
    pub async fn get_block(&self, round: Round) -> Result<BlockRecord> {
        let mut attempt = 0;

        loop {
            let last_error = match self.attempt(round, attempt).await {
                Ok(record) => return Ok(record),
                Err(Attempt::Fatal(err)) => return Err(err),
                Err(Attempt::Retry(err)) => err,
            };

            attempt += 1;
            if attempt == RETRIES {
                let err = ImporterError::FetchExhausted {
                    round,
                    attempts: RETRIES,
                    last_error,
                };
                error!("{err}");
                return Err(err);
            }
        }
    }

    async fn attempt(&self, round: Round, attempt: usize) -> std::result::Result<BlockRecord, Attempt> {
        let status = match self.cancel.run(self.node.status_after_round(round.saturating_sub(1))).await {
            None => return Err(Attempt::Fatal(ImporterError::Cancelled)),
            Some(Err(e)) => {
                error!(error = %e, "error getting status for round {round} (attempt {attempt})");
                return Err(Attempt::Retry(e));
            }
            Some(Ok(status)) => status,
        };

        let start = Instant::now();
        let bytes = match self.cancel.run(self.node.raw_block(round)).await {
            None => return Err(Attempt::Fatal(ImporterError::Cancelled)),
            Some(Err(e)) => {
                error!(error = %e, "error getting block for round {round} (attempt {attempt})");
                return Err(Attempt::Retry(e));
            }
            Some(Ok(bytes)) => bytes,
        };
        self.metrics
            .observe_raw_block_fetch(start.elapsed().as_secs_f64());

        let mut record = BlockRecord::decode(&bytes).map_err(|e| Attempt::Fatal(e.into()))?;

        // Round 0 has no delta.
        if self.mode.is_follower() && round > 0 {
            let delta = self
                .delta(round, status.last_round)
                .await
                .map_err(Attempt::Fatal)?;
            record.delta = Some(delta);
        }

        Ok(record)
    }

    /// Fetch the delta for `round`, not retried.
    async fn delta(&self, round: Round, node_round: Round) -> Result<LedgerStateDelta> {
        let source = match self.cancel.run(self.node.raw_delta(round)).await {
            None => return Err(ImporterError::Cancelled),
            Some(Ok(bytes)) => return Ok(LedgerStateDelta::decode(&bytes)?),
            Some(Err(e)) => e,
        };

        let err = if node_round < round {
            ImporterError::DeltaBehind {
                node_round,
                round,
                source,
            }
        } else {
            ImporterError::DeltaMissing {
                node_round,
                round,
                source,
            }
        };
        error!("{err}");
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_node::{MemoryNode, NodeCall, NodeOp};
    use conduit_testkit::sample_block_json;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<f64>>);

    impl MetricsSink for Recorder {
        fn observe_raw_block_fetch(&self, seconds: f64) {
            self.0.lock().unwrap().push(seconds);
        }
    }

    fn fetcher(node: Arc<MemoryNode>, mode: Mode) -> RetryingBlockFetcher<Arc<MemoryNode>> {
        RetryingBlockFetcher::new(node, mode, Cancellation::new())
    }

    #[tokio::test]
    async fn test_archival_block_has_no_delta() {
        let node = Arc::new(MemoryNode::archival(10));
        let record = fetcher(node.clone(), Mode::Archival).get_block(5).await.unwrap();

        assert_eq!(record.round(), 5);
        assert!(record.delta.is_none());
        assert_eq!(
            node.calls(),
            vec![NodeCall::StatusAfterRound(4), NodeCall::RawBlock(5)]
        );
    }

    #[tokio::test]
    async fn test_follower_block_carries_delta() {
        let node = Arc::new(MemoryNode::follower(10));
        let record = fetcher(node.clone(), Mode::Follower).get_block(5).await.unwrap();

        assert!(record.delta.is_some());
        assert_eq!(node.count(NodeOp::RawDelta), 1);
    }

    #[tokio::test]
    async fn test_follower_round_zero_skips_delta() {
        let node = Arc::new(MemoryNode::follower(10));
        let record = fetcher(node.clone(), Mode::Follower).get_block(0).await.unwrap();

        assert_eq!(record.round(), 0);
        assert!(record.delta.is_none());
        assert_eq!(node.count(NodeOp::RawDelta), 0);
        assert!(node.calls().contains(&NodeCall::StatusAfterRound(0)));
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let node = Arc::new(MemoryNode::archival(10));
        node.fail_next(NodeOp::RawBlock, 2);

        let record = fetcher(node.clone(), Mode::Archival).get_block(7).await.unwrap();
        assert_eq!(record.round(), 7);
        assert_eq!(node.count(NodeOp::RawBlock), 3);
    }

    #[tokio::test]
    async fn test_status_failures_are_retried() {
        let node = Arc::new(MemoryNode::archival(10));
        node.fail_next(NodeOp::StatusAfterRound, 4);

        fetcher(node.clone(), Mode::Archival).get_block(7).await.unwrap();
        assert_eq!(node.count(NodeOp::StatusAfterRound), 5);
        assert_eq!(node.count(NodeOp::RawBlock), 1);
    }

    #[tokio::test]
    async fn test_exhaustion_after_five_attempts() {
        let node = Arc::new(MemoryNode::archival(10));
        node.fail_always(NodeOp::RawBlock, true);

        let err = fetcher(node.clone(), Mode::Archival).get_block(7).await.unwrap_err();
        assert!(matches!(err, ImporterError::FetchExhausted { round: 7, attempts: 5, .. }));
        assert!(err
            .to_string()
            .starts_with("failed to get block for round 7 after 5 attempts, check node configuration: "));
        assert_eq!(node.count(NodeOp::RawBlock), RETRIES);
    }

    #[tokio::test]
    async fn test_decode_failure_is_not_retried() {
        let node = Arc::new(MemoryNode::archival(10));
        node.insert_block(3, "not a block");

        let err = fetcher(node.clone(), Mode::Archival).get_block(3).await.unwrap_err();
        assert!(matches!(err, ImporterError::Decode(_)));
        assert_eq!(node.count(NodeOp::RawBlock), 1);
    }

    #[tokio::test]
    async fn test_delta_behind() {
        let node = Arc::new(MemoryNode::follower(10).with_wait_timeout(Duration::from_millis(10)));
        node.insert_block(12, sample_block_json(12, 1));

        // The block is served, but the node itself is still at round 10.
        let err = fetcher(node.clone(), Mode::Follower).get_block(12).await;
        match err {
            Err(ImporterError::DeltaBehind { node_round, round, .. }) => {
                assert_eq!(node_round, 10);
                assert_eq!(round, 12);
            }
            other => panic!("expected DeltaBehind, got {other:?}"),
        }
        assert_eq!(node.count(NodeOp::RawDelta), 1);
    }

    #[tokio::test]
    async fn test_delta_missing() {
        let node = Arc::new(MemoryNode::follower(10).with_delta_floor(8));

        let err = fetcher(node.clone(), Mode::Follower).get_block(5).await.unwrap_err();
        assert!(matches!(err, ImporterError::DeltaMissing { node_round: 10, round: 5, .. }));
        assert!(err.to_string().contains("re-deploying the follower node may be necessary"));
        assert_eq!(node.count(NodeOp::RawDelta), 1);
        assert_eq!(node.count(NodeOp::RawBlock), 1);
    }

    #[tokio::test]
    async fn test_metrics_observed_on_success_only() {
        let node = Arc::new(MemoryNode::archival(10));
        node.fail_next(NodeOp::RawBlock, 1);
        let recorder = Arc::new(Recorder::default());

        fetcher(node, Mode::Archival)
            .with_metrics(recorder.clone())
            .get_block(4)
            .await
            .unwrap();

        assert_eq!(recorder.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_fetch_stops_at_once() {
        let node = Arc::new(MemoryNode::archival(10));
        let f = fetcher(node.clone(), Mode::Archival);
        f.cancel.cancel();

        let err = f.get_block(4).await.unwrap_err();
        assert!(err.is_cancelled());
        assert!(node.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_waiting_for_round() {
        let node = Arc::new(MemoryNode::archival(10).with_tip(10));
        let f = fetcher(node.clone(), Mode::Archival);

        let trigger = f.cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        // Round 20 is never produced; the wait is cut short.
        let err = f.get_block(20).await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(node.count(NodeOp::StatusAfterRound), 1);
        assert_eq!(node.count(NodeOp::RawBlock), 0);
    }
}
