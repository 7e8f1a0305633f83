//! # Conduit Core
//!
//! Shared types for the Conduit block pipeline.
//!
//! This crate contains no networking. It defines the values that flow
//! between the node client, the catchup coordinator and the importer.
//!
//! ## Key Types
//!
//! - [`Round`] - Height of one unit of ledger history
//! - [`BlockRecord`] - Header, payset, certificate and optional state delta for one round
//! - [`NodeStatus`] - A polled snapshot of the backing node
//! - [`Catchpoint`] - A parsed `"<round>#<hash>"` label
//! - [`Mode`] - Archival or follower operation, fixed at init
//! - [`Cancellation`] - Shared shutdown signal observed by every blocking wait

pub mod block;
pub mod cancel;
pub mod error;
pub mod genesis;
pub mod mode;
pub mod status;
pub mod types;

pub use block::{BlockHeader, BlockRecord, Certificate, LedgerStateDelta, SignedTxnInBlock};
pub use cancel::Cancellation;
pub use error::{CoreError, Result};
pub use genesis::Genesis;
pub use mode::Mode;
pub use status::{CatchupPhase, NodeStatus};
pub use types::{Catchpoint, Round};
