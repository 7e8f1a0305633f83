//! # Conduit Testkit
//!
//! Testing utilities for the Conduit importers.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Vectors**: Named catchup decisions and catalog lookups with their expected outcomes
//! - **Generators**: Proptest strategies for rounds, catchpoints, and catalogs
//! - **Fixtures**: Fake-node scenarios, sample blocks, and catalog text
//!
//! ## Vectors
//!
//! Every catchup decision the coordinator can make, by name:
//!
//! ```rust
//! use conduit_testkit::vectors::{check_rounds_vectors, Decision};
//!
//! for vector in check_rounds_vectors() {
//!     if vector.expected == Decision::CatchpointAhead {
//!         println!("{} is fatal", vector.name);
//!     }
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use conduit_testkit::generators::catalog;
//!
//! proptest! {
//!     #[test]
//!     fn best_is_below_target((text, rounds) in catalog(16), target in 0u64..10_000) {
//!         // ...
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use conduit_testkit::fixtures::NodeScenario;
//!
//! // A pruned archival node that cannot serve round 50 any more.
//! let node = NodeScenario::pruned_archival(100, 90);
//! assert_eq!(node.last_round(), 100);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{init_tracing, sample_block_json, sample_genesis, NodeScenario, TESTNET_CATALOG};
pub use generators::{catalog, catchpoint, round_triple};
pub use vectors::{check_rounds_vectors, lookup_vectors, CheckRoundsVector, Decision, LookupVector};
