//! # Conduit Catchup
//!
//! Brings the backing node to a state where it can serve the round the
//! pipeline needs next.
//!
//! ## Overview
//!
//! Before block acquisition starts, [`NodeCatchupCoordinator::synchronize`]
//! probes the node for the target round. If the node cannot serve it, the
//! coordinator picks a catchpoint (configured, or the best one from the
//! network's catalog via [`CatchpointLookupClient`]), decides with
//! [`check_rounds`] whether a fast catchup helps, runs and monitors it,
//! and finally waits for the node to reach the target.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use conduit_catchup::{CatchpointLookupClient, CatchupConfig, NodeCatchupCoordinator};
//! use conduit_core::{Cancellation, Mode};
//! use conduit_node::HttpNodeClient;
//!
//! async fn example() {
//!     let node = HttpNodeClient::new("localhost:4001", "token", None).unwrap();
//!     let lookup = CatchpointLookupClient::http().unwrap();
//!
//!     let coordinator = NodeCatchupCoordinator::new(node, lookup, Mode::Archival, Cancellation::new())
//!         .with_network("mainnet")
//!         .with_catchup_config(CatchupConfig::default());
//!
//!     coordinator.synchronize(1_000_000).await.unwrap();
//! }
//! ```
//!
//! ## Decision Flow
//!
//! ```text
//! needs_catchup? ──no──────────────────────────────────────────► done
//!      │yes
//!      ▼
//! admin token? ──no──────────────────────┐
//!      │yes                              │
//!      ▼                                 │
//! resolve catchpoint → check_rounds ─no──┤
//!      │yes                              │
//!      ▼                                 ▼
//! start catchup → monitor (5s) → [follower: set sync round] → wait for round
//! ```

pub mod coordinator;
pub mod error;
pub mod lookup;

pub use coordinator::{check_rounds, CatchupConfig, NodeCatchupCoordinator, CATCHUP_POLL_INTERVAL};
pub use error::{CatchupError, LookupError, Result};
pub use lookup::{
    best_catchpoint, catalog_url, CatalogSource, CatchpointLookupClient, HttpCatalog,
    StaticCatalog, DEFAULT_CATALOG_URL,
};
