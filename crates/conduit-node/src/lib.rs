//! # Conduit Node
//!
//! Access to the backing node that serves blocks, deltas and catchup.
//!
//! ## Overview
//!
//! The node is abstracted behind the [`NodeClient`] trait so that catchup
//! and fetch logic can run against [`MemoryNode`] in tests. The production
//! implementation is [`HttpNodeClient`], which talks to the node's REST API.
//!
//! ## Key Types
//!
//! - [`NodeClient`] - The async capability set the importer consumes
//! - [`HttpNodeClient`] - REST implementation authenticated by API token
//! - [`MemoryNode`] - Scriptable in-memory node for tests
//! - [`NodeError`] - Transport, status and decoding failures
//!
//! ## Usage
//!
//! ```rust,no_run
//! use conduit_node::{HttpNodeClient, NodeClient};
//!
//! async fn example() {
//!     let client = HttpNodeClient::new("localhost:4001", "aaaa", None).unwrap();
//!     let status = client.status().await.unwrap();
//!     println!("node is at round {}", status.last_round);
//! }
//! ```

pub mod client;
pub mod error;
pub mod http;
pub mod memory;

pub use client::NodeClient;
pub use error::{NodeError, Result};
pub use http::{normalize_address, HttpNodeClient, API_TOKEN_HEADER};
pub use memory::{MemoryNode, NodeCall, NodeOp};
