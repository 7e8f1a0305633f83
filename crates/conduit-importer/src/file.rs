//! Importer reading block records from a directory of JSON files.
//!
//! The directory holds a `genesis.json` and one file per round, named by a
//! pattern where `%[1]d` (or `%d`) stands for the round number.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::info;

use conduit_core::{BlockRecord, Cancellation, CoreError, Genesis, Round};

use crate::error::{ImporterError, Result};
use crate::importer::{Importer, InitProvider, PluginMetadata};

/// Plugin name of the file importer.
pub const FILE_READER_NAME: &str = "file_reader";

/// File name pattern used when none is configured.
pub const DEFAULT_FILENAME_PATTERN: &str = "%[1]d_block.json";

/// Name of the genesis file inside the blocks directory.
pub const GENESIS_FILENAME: &str = "genesis.json";

const SAMPLE_CONFIG: &str = r#"# File reader: imports block records written by the file writer.
name: file_reader
config:
  # Directory holding genesis.json and one file per round.
  blocks-dir: "/path/to/block/files"

  # FilenamePattern is the format used to find block files. It uses go
  # string formatting and should accept one number for the round.
  filename-pattern: "%[1]d_block.json"
"#;

/// Configuration of the file importer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FileReaderConfig {
    /// Directory holding the archive.
    #[serde(alias = "block-dir")]
    pub blocks_dir: PathBuf,

    /// Block file name pattern. Empty means [`DEFAULT_FILENAME_PATTERN`].
    #[serde(default)]
    pub filename_pattern: String,
}

/// Substitute `round` into a file name pattern.
pub fn block_filename(pattern: &str, round: Round) -> String {
    let round = round.to_string();
    pattern.replace("%[1]d", &round).replace("%d", &round)
}

/// Reads an archive written by the pipeline's file writer.
#[derive(Debug, Default)]
pub struct FileReader {
    config: FileReaderConfig,
    cancel: Cancellation,
}

impl FileReader {
    pub fn new() -> Self {
        Self::default()
    }

    fn block_path(&self, round: Round) -> PathBuf {
        self.config
            .blocks_dir
            .join(block_filename(&self.config.filename_pattern, round))
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let read = tokio::fs::read(path);
        match self.cancel.run(read).await {
            None => Err(ImporterError::Cancelled),
            Some(result) => result.map_err(|source| ImporterError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

#[async_trait]
impl Importer for FileReader {
    type Config = FileReaderConfig;

    fn metadata(&self) -> PluginMetadata {
        PluginMetadata {
            name: FILE_READER_NAME,
            description: "Importer for fetching blocks from files in a directory created by the 'file_writer' plugin.",
            deprecated: false,
            sample_config: SAMPLE_CONFIG,
        }
    }

    async fn init(
        &mut self,
        cancel: Cancellation,
        _init_provider: &mut dyn InitProvider,
        mut config: FileReaderConfig,
    ) -> Result<Genesis> {
        self.cancel = cancel.child();
        if config.filename_pattern.is_empty() {
            config.filename_pattern = DEFAULT_FILENAME_PATTERN.to_string();
        }
        self.config = config;

        let path = self.config.blocks_dir.join(GENESIS_FILENAME);
        let bytes = self.read(&path).await?;
        Ok(Genesis::decode(&bytes)?)
    }

    async fn get_block(&self, round: Round) -> Result<BlockRecord> {
        let path = self.block_path(round);
        let start = Instant::now();

        let bytes = self.read(&path).await?;
        let record: BlockRecord =
            serde_json::from_slice(&bytes).map_err(|e| ImporterError::Decode(CoreError::from(e)))?;

        info!(round, elapsed = ?start.elapsed(), "block read time");
        Ok(record)
    }

    async fn on_complete(&self, _record: &BlockRecord) -> Result<()> {
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.cancel.cancel();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::PipelineState;
    use conduit_core::{BlockHeader, LedgerStateDelta, SignedTxnInBlock};
    use conduit_testkit::sample_genesis;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_archive(dir: &TempDir, pattern: &str, rounds: &[Round]) {
        let genesis = serde_json::to_vec(&sample_genesis()).unwrap();
        std::fs::write(dir.path().join(GENESIS_FILENAME), genesis).unwrap();

        for &round in rounds {
            let record = BlockRecord {
                header: BlockHeader {
                    round,
                    fields: Default::default(),
                },
                payset: vec![SignedTxnInBlock(json!({"txn": {"type": "pay"}}))],
                delta: Some(LedgerStateDelta(json!({"Hdr": {"rnd": round}}))),
                certificate: None,
            };
            let path = dir.path().join(block_filename(pattern, round));
            std::fs::write(path, serde_json::to_vec(&record).unwrap()).unwrap();
        }
    }

    async fn reader(dir: &TempDir, pattern: &str) -> (FileReader, Genesis) {
        let mut reader = FileReader::new();
        let config = FileReaderConfig {
            blocks_dir: dir.path().to_path_buf(),
            filename_pattern: pattern.to_string(),
        };
        let genesis = reader
            .init(Cancellation::new(), &mut PipelineState::default(), config)
            .await
            .unwrap();
        (reader, genesis)
    }

    #[test]
    fn test_block_filename() {
        assert_eq!(block_filename(DEFAULT_FILENAME_PATTERN, 42), "42_block.json");
        assert_eq!(block_filename("blk-%d.json", 7), "blk-7.json");
    }

    #[test]
    fn test_config_keys() {
        let config: FileReaderConfig =
            serde_json::from_str(r#"{"blocks-dir": "/data", "filename-pattern": "%d.json"}"#).unwrap();
        assert_eq!(config.blocks_dir, PathBuf::from("/data"));
        assert_eq!(config.filename_pattern, "%d.json");

        let config: FileReaderConfig = serde_json::from_str(r#"{"block-dir": "/data"}"#).unwrap();
        assert_eq!(config.blocks_dir, PathBuf::from("/data"));
    }

    #[tokio::test]
    async fn test_reads_genesis_and_blocks_with_default_pattern() {
        let dir = TempDir::new().unwrap();
        write_archive(&dir, DEFAULT_FILENAME_PATTERN, &[1, 2]);

        let (reader, genesis) = reader(&dir, "").await;
        assert_eq!(genesis, sample_genesis());

        let record = reader.get_block(2).await.unwrap();
        assert_eq!(record.round(), 2);
        assert_eq!(record.payset.len(), 1);
        assert!(record.delta.is_some());
    }

    #[tokio::test]
    async fn test_custom_pattern() {
        let dir = TempDir::new().unwrap();
        write_archive(&dir, "round-%d.json", &[9]);

        let (reader, _) = reader(&dir, "round-%d.json").await;
        assert_eq!(reader.get_block(9).await.unwrap().round(), 9);
    }

    #[tokio::test]
    async fn test_missing_block_names_file() {
        let dir = TempDir::new().unwrap();
        write_archive(&dir, DEFAULT_FILENAME_PATTERN, &[]);

        let (reader, _) = reader(&dir, "").await;
        let err = reader.get_block(5).await.unwrap_err();
        assert!(matches!(err, ImporterError::Io { .. }));
        assert!(err.to_string().contains("5_block.json"));
    }

    #[tokio::test]
    async fn test_missing_genesis() {
        let dir = TempDir::new().unwrap();
        let mut reader = FileReader::new();
        let config = FileReaderConfig {
            blocks_dir: dir.path().to_path_buf(),
            filename_pattern: String::new(),
        };

        let err = reader
            .init(Cancellation::new(), &mut PipelineState::default(), config)
            .await
            .unwrap_err();
        assert!(err.to_string().contains(GENESIS_FILENAME));
    }

    #[tokio::test]
    async fn test_closed_reader_stops() {
        let dir = TempDir::new().unwrap();
        write_archive(&dir, DEFAULT_FILENAME_PATTERN, &[1]);

        let (reader, _) = reader(&dir, "").await;
        reader.close().await.unwrap();
        assert!(reader.get_block(1).await.unwrap_err().is_cancelled());
    }
}
