//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::{Arc, Once};

use serde_json::json;

use conduit_core::{Genesis, Round};
use conduit_node::MemoryNode;

/// A small catalog in the published format.
pub const TESTNET_CATALOG: &str = "\
10000#HFQKCQTDXUKXH7BWVJRBSIDSSTJNVEG5NBRZZDGOUNE4IY6XXK4A
20000#UKPDFX7YVQ2EYYUUWEWBCXTZS3HOCXG3ABBWH6HRL5RNMPZCCDZQ
30000#SJ2EWZL4CCVGOOKJ3NPSTYIPT4WHDHPPMHC3DWJTMQ7HJK7BYRPQ
40000#GLNGXBBRSHF4IVSNTRUKUQCI3OSYWDWJHW3RNCVNJCCHTF2X6RNA
";

static TRACING: Once = Once::new();

/// Install a test-writer subscriber once per process.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

/// Genesis of the fake test network.
pub fn sample_genesis() -> Genesis {
    Genesis {
        network: "testnet".into(),
        schema_id: "v1.0".into(),
        proto: "test-proto".into(),
        ..Default::default()
    }
}

/// A block response for `round` with `txns` payment transactions.
pub fn sample_block_json(round: Round, txns: usize) -> String {
    let payset: Vec<_> = (0..txns)
        .map(|i| json!({"txn": {"type": "pay", "fv": round, "amt": i}}))
        .collect();

    json!({
        "block": {
            "rnd": round,
            "gen": "testnet-v1.0",
            "ts": 1_700_000_000u64 + round,
            "txns": payset,
        },
        "cert": {"rnd": round, "step": 2},
    })
    .to_string()
}

/// Fake nodes in the states the importer has to cope with.
pub struct NodeScenario;

impl NodeScenario {
    /// An archival node at `last_round` that pruned everything before
    /// `earliest_round`.
    pub fn pruned_archival(last_round: Round, earliest_round: Round) -> Arc<MemoryNode> {
        Arc::new(MemoryNode::archival(last_round).with_earliest_round(earliest_round))
    }

    /// A follower at `last_round` on a network that has reached `tip`.
    pub fn lagging_follower(last_round: Round, tip: Round) -> Arc<MemoryNode> {
        Arc::new(MemoryNode::follower(last_round).with_tip(tip))
    }

    /// A node whose fast catchup never finishes.
    pub fn stuck_catchup(last_round: Round, earliest_round: Round) -> Arc<MemoryNode> {
        Arc::new(
            MemoryNode::archival(last_round)
                .with_earliest_round(earliest_round)
                .with_catchup_polls(usize::MAX),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_core::{BlockRecord, Catchpoint};

    #[test]
    fn test_sample_block_decodes() {
        let record = BlockRecord::decode(sample_block_json(42, 3).as_bytes()).unwrap();
        assert_eq!(record.round(), 42);
        assert_eq!(record.payset.len(), 3);
        assert!(record.certificate.is_some());
    }

    #[test]
    fn test_catalog_lines_parse() {
        let rounds: Vec<_> = TESTNET_CATALOG
            .lines()
            .map(|l| Catchpoint::parse(l).unwrap().round())
            .collect();
        assert_eq!(rounds, vec![10000, 20000, 30000, 40000]);
    }

    #[test]
    fn test_sample_genesis_not_empty() {
        assert!(!sample_genesis().is_empty());
        assert_eq!(sample_genesis().id(), "testnet-v1.0");
    }

    #[tokio::test]
    async fn test_pruned_archival() {
        use conduit_node::NodeClient;

        let node = NodeScenario::pruned_archival(100, 90);
        assert!(node.raw_block(95).await.is_ok());
        assert!(node.raw_block(50).await.unwrap_err().is_not_found());
    }
}
