//! Node status as reported by the backing node.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::Round;

/// A polled snapshot of the node. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct NodeStatus {
    /// The last round the node has committed.
    pub last_round: Round,

    /// Nanoseconds since the last round was committed.
    pub time_since_last_round: u64,

    /// Nanoseconds spent in catchup, zero when not catching up.
    pub catchup_time: u64,

    /// The catchpoint currently being restored, empty when none.
    pub catchpoint: String,

    pub catchpoint_total_blocks: u64,
    pub catchpoint_acquired_blocks: u64,
    pub catchpoint_total_accounts: u64,
    pub catchpoint_processed_accounts: u64,
    pub catchpoint_verified_accounts: u64,
}

impl NodeStatus {
    /// Whether a catchpoint catchup is still in progress.
    pub fn catchup_in_progress(&self) -> bool {
        !self.catchpoint.is_empty()
    }

    /// The most advanced catchup phase with progress to report.
    pub fn catchup_phase(&self) -> CatchupPhase {
        if self.catchpoint_acquired_blocks > 0 {
            CatchupPhase::AcquiredBlocks {
                done: self.catchpoint_acquired_blocks,
                total: self.catchpoint_total_blocks,
            }
        } else if self.catchpoint_verified_accounts > 0 {
            CatchupPhase::VerifiedAccounts {
                done: self.catchpoint_verified_accounts,
                total: self.catchpoint_total_accounts,
            }
        } else if self.catchpoint_processed_accounts > 0 {
            CatchupPhase::ProcessedAccounts {
                done: self.catchpoint_processed_accounts,
                total: self.catchpoint_total_accounts,
            }
        } else {
            CatchupPhase::VerifiedBlocks
        }
    }
}

/// Progress of a fast catchup, in the order it is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatchupPhase {
    AcquiredBlocks { done: u64, total: u64 },
    VerifiedAccounts { done: u64, total: u64 },
    ProcessedAccounts { done: u64, total: u64 },
    /// The node does not expose verified-block counters.
    VerifiedBlocks,
}

impl fmt::Display for CatchupPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AcquiredBlocks { done, total } => write!(f, "Acquired Blocks: {done} / {total}"),
            Self::VerifiedAccounts { done, total } => {
                write!(f, "Verified Accounts: {done} / {total}")
            }
            Self::ProcessedAccounts { done, total } => {
                write!(f, "Processed Accounts: {done} / {total}")
            }
            Self::VerifiedBlocks => write!(f, "Verified Blocks"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_decodes_kebab_case() {
        let json = r#"{
            "last-round": 1200,
            "catchpoint": "1000#abc",
            "catchpoint-total-accounts": 50,
            "catchpoint-processed-accounts": 10,
            "stopped-at-unsupported-round": false
        }"#;
        let status: NodeStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.last_round, 1200);
        assert!(status.catchup_in_progress());
        assert_eq!(
            status.catchup_phase(),
            CatchupPhase::ProcessedAccounts { done: 10, total: 50 }
        );
    }

    #[test]
    fn test_phase_priority() {
        let status = NodeStatus {
            catchpoint: "1#a".into(),
            catchpoint_total_blocks: 8,
            catchpoint_acquired_blocks: 3,
            catchpoint_total_accounts: 100,
            catchpoint_verified_accounts: 100,
            catchpoint_processed_accounts: 100,
            ..Default::default()
        };
        assert_eq!(
            status.catchup_phase(),
            CatchupPhase::AcquiredBlocks { done: 3, total: 8 }
        );

        let status = NodeStatus {
            catchpoint_acquired_blocks: 0,
            ..status
        };
        assert_eq!(
            status.catchup_phase(),
            CatchupPhase::VerifiedAccounts { done: 100, total: 100 }
        );
    }

    #[test]
    fn test_phase_defaults_to_verified_blocks() {
        let status = NodeStatus {
            catchpoint: "1#a".into(),
            ..Default::default()
        };
        assert_eq!(status.catchup_phase(), CatchupPhase::VerifiedBlocks);
        assert_eq!(status.catchup_phase().to_string(), "Verified Blocks");
    }

    #[test]
    fn test_no_catchpoint_means_idle() {
        assert!(!NodeStatus::default().catchup_in_progress());
    }
}
