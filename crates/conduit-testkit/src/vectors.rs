//! Named decision vectors.
//!
//! These pin down the catchup decision table and catalog selection so
//! that every component and test agrees on them.

use conduit_core::Round;

/// Outcome of the catchup decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Run a fast catchup.
    Catchup,
    /// Skip fast catchup and let the node replay.
    NoCatchup,
    /// Fatal: both node and catchpoint are past the target.
    CatchpointAhead,
}

/// A catchup decision vector.
#[derive(Debug, Clone)]
pub struct CheckRoundsVector {
    pub name: &'static str,
    pub catchpoint_round: Round,
    pub node_round: Round,
    pub target_round: Round,
    pub expected: Decision,
}

/// All catchup decision vectors.
pub fn check_rounds_vectors() -> Vec<CheckRoundsVector> {
    vec![
        CheckRoundsVector {
            name: "node behind catchpoint",
            catchpoint_round: 100,
            node_round: 50,
            target_round: 200,
            expected: Decision::Catchup,
        },
        CheckRoundsVector {
            name: "node ahead of target, catchpoint usable",
            catchpoint_round: 100,
            node_round: 300,
            target_round: 200,
            expected: Decision::Catchup,
        },
        CheckRoundsVector {
            name: "node and catchpoint ahead of target",
            catchpoint_round: 300,
            node_round: 250,
            target_round: 200,
            expected: Decision::CatchpointAhead,
        },
        CheckRoundsVector {
            name: "node between catchpoint and target",
            catchpoint_round: 100,
            node_round: 150,
            target_round: 200,
            expected: Decision::NoCatchup,
        },
        CheckRoundsVector {
            name: "catchpoint at target is unusable",
            catchpoint_round: 200,
            node_round: 50,
            target_round: 200,
            expected: Decision::NoCatchup,
        },
        CheckRoundsVector {
            name: "node at target",
            catchpoint_round: 100,
            node_round: 200,
            target_round: 200,
            expected: Decision::NoCatchup,
        },
        CheckRoundsVector {
            name: "catchpoint at node round",
            catchpoint_round: 50,
            node_round: 50,
            target_round: 200,
            expected: Decision::NoCatchup,
        },
        CheckRoundsVector {
            name: "catchpoint at target, node ahead",
            catchpoint_round: 200,
            node_round: 201,
            target_round: 200,
            expected: Decision::CatchpointAhead,
        },
        CheckRoundsVector {
            name: "catchpoint past target, node behind",
            catchpoint_round: 300,
            node_round: 50,
            target_round: 200,
            expected: Decision::NoCatchup,
        },
        CheckRoundsVector {
            name: "node past target, catchpoint below target",
            catchpoint_round: 150,
            node_round: 250,
            target_round: 200,
            expected: Decision::Catchup,
        },
    ]
}

/// A catalog selection vector.
#[derive(Debug, Clone)]
pub struct LookupVector {
    pub name: &'static str,
    pub catalog: &'static str,
    pub target_round: Round,
    /// Expected label, or `None` when nothing qualifies.
    pub expected: Option<&'static str>,
}

/// All catalog selection vectors.
pub fn lookup_vectors() -> Vec<LookupVector> {
    const CATALOG: &str = "10#aaa\n20#bbb\n30#ccc\n";

    vec![
        LookupVector {
            name: "between entries",
            catalog: CATALOG,
            target_round: 25,
            expected: Some("20#bbb"),
        },
        LookupVector {
            name: "before first entry",
            catalog: CATALOG,
            target_round: 5,
            expected: None,
        },
        LookupVector {
            name: "past last entry",
            catalog: CATALOG,
            target_round: 31,
            expected: Some("30#ccc"),
        },
        LookupVector {
            name: "exact match is excluded",
            catalog: CATALOG,
            target_round: 30,
            expected: Some("20#bbb"),
        },
        LookupVector {
            name: "blank line ends catalog",
            catalog: "10#aaa\n\n20#bbb\n",
            target_round: 25,
            expected: Some("10#aaa"),
        },
        LookupVector {
            name: "empty catalog",
            catalog: "",
            target_round: 25,
            expected: None,
        },
    ]
}
