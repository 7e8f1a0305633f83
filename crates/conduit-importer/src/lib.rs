//! # Conduit Importer
//!
//! Block sources for the Conduit pipeline.
//!
//! ## Overview
//!
//! An importer is the first stage of a pipeline. The runner initializes it
//! with the next round it needs, then pulls one [`BlockRecord`] per round:
//!
//! - **[`AlgodImporter`]**: Synchronizes a node (fast catchup, follower sync
//!   round), then fetches blocks with retries and attaches state deltas in
//!   follower mode
//! - **[`FileReader`]**: Reads records from a directory written by the file
//!   exporter
//!
//! ## Key Concepts
//!
//! - **Mode**: Archival nodes serve any round; follower nodes serve state
//!   deltas but only around their sync round, which the importer advances
//!   after each completed record.
//! - **Retries**: Five attempts per round, no backoff. Cancellation is never
//!   retried.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use conduit_core::Cancellation;
//! use conduit_importer::{AlgodImporter, AlgodImporterConfig, Importer, PipelineState};
//!
//! async fn example() {
//!     let mut importer = AlgodImporter::new();
//!     let mut state = PipelineState::starting_at(1_000);
//!
//!     let config: AlgodImporterConfig = serde_json::from_str(
//!         r#"{"netaddr": "localhost:4001", "token": "...", "mode": "follower"}"#,
//!     )
//!     .unwrap();
//!
//!     let genesis = importer.init(Cancellation::new(), &mut state, config).await.unwrap();
//!     println!("importing {}", genesis.network);
//!
//!     let record = importer.get_block(1_000).await.unwrap();
//!     importer.on_complete(&record).await.unwrap();
//!     importer.close().await.unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `conduit_importer::core` - Shared types (BlockRecord, Round, Mode, etc.)
//! - `conduit_importer::node` - Node client trait and implementations
//! - `conduit_importer::catchup` - Catchpoint lookup and catchup coordination

pub mod config;
pub mod error;
pub mod fetcher;
pub mod file;
pub mod importer;
pub mod metrics;

// Re-export component crates
pub use conduit_catchup as catchup;
pub use conduit_core as core;
pub use conduit_node as node;

pub use config::{AlgodImporterConfig, SAMPLE_CONFIG};
pub use error::{ImporterError, Result};
pub use fetcher::{RetryingBlockFetcher, RETRIES};
pub use file::{block_filename, FileReader, FileReaderConfig, DEFAULT_FILENAME_PATTERN};
pub use importer::{
    AlgodImporter, Importer, InitProvider, PipelineState, PluginMetadata, ALGOD_IMPORTER_NAME,
};
pub use metrics::{MetricsSink, NoopMetrics, RawBlockTimer};

pub use conduit_core::{BlockRecord, Cancellation, Genesis, Mode, Round};
