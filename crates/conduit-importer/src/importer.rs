//! The importer surface exposed to the pipeline runner, and the algod
//! importer behind it.

use std::sync::Arc;

use async_trait::async_trait;
use prometheus::core::Collector;
use serde::de::DeserializeOwned;
use tracing::info;

use conduit_catchup::{CatalogSource, CatchpointLookupClient, HttpCatalog, NodeCatchupCoordinator};
use conduit_core::{BlockRecord, Cancellation, Genesis, Mode, Round};
use conduit_node::{HttpNodeClient, NodeClient, NodeError};

use crate::config::{AlgodImporterConfig, SAMPLE_CONFIG};
use crate::error::{ImporterError, Result};
use crate::fetcher::RetryingBlockFetcher;
use crate::metrics::{MetricsSink, NoopMetrics, RawBlockTimer};

/// Plugin name of the algod importer.
pub const ALGOD_IMPORTER_NAME: &str = "algod";

/// Static description of an importer plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginMetadata {
    pub name: &'static str,
    pub description: &'static str,
    pub deprecated: bool,
    pub sample_config: &'static str,
}

/// Pipeline state made available to importers at init.
pub trait InitProvider: Send + Sync {
    /// Genesis the pipeline was started with, if known.
    fn genesis(&self) -> Option<&Genesis>;

    fn set_genesis(&mut self, genesis: Genesis);

    /// The next round the pipeline expects.
    fn next_db_round(&self) -> Round;
}

/// A plain [`InitProvider`] for runners without persistent state.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    pub genesis: Option<Genesis>,
    pub next_round: Round,
}

impl PipelineState {
    pub fn starting_at(next_round: Round) -> Self {
        Self {
            genesis: None,
            next_round,
        }
    }
}

impl InitProvider for PipelineState {
    fn genesis(&self) -> Option<&Genesis> {
        self.genesis.as_ref()
    }

    fn set_genesis(&mut self, genesis: Genesis) {
        self.genesis = Some(genesis);
    }

    fn next_db_round(&self) -> Round {
        self.next_round
    }
}

/// A block source driven by the pipeline runner.
///
/// The runner calls `init` once, then `get_block` with strictly increasing
/// rounds, `on_complete` after each record is processed downstream, and
/// finally `close`.
#[async_trait]
pub trait Importer: Send + Sync {
    type Config: DeserializeOwned + Send;

    fn metadata(&self) -> PluginMetadata;

    /// Prepare the source to serve `init_provider.next_db_round()` and
    /// return the chain's genesis.
    async fn init(
        &mut self,
        cancel: Cancellation,
        init_provider: &mut dyn InitProvider,
        config: Self::Config,
    ) -> Result<Genesis>;

    async fn get_block(&self, round: Round) -> Result<BlockRecord>;

    /// Called once `record` has been fully processed.
    async fn on_complete(&self, record: &BlockRecord) -> Result<()>;

    /// Stop all in-flight and future work.
    async fn close(&self) -> Result<()>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Algod importer
// ─────────────────────────────────────────────────────────────────────────────

struct Connected {
    fetcher: RetryingBlockFetcher<Arc<dyn NodeClient>>,
}

/// Imports blocks from an algod node's REST API.
pub struct AlgodImporter {
    node: Option<Arc<dyn NodeClient>>,
    catalog: Option<Arc<dyn CatalogSource>>,
    metrics: Arc<dyn MetricsSink>,
    cancel: Cancellation,
    connected: Option<Connected>,
}

impl AlgodImporter {
    pub fn new() -> Self {
        Self {
            node: None,
            catalog: None,
            metrics: Arc::new(NoopMetrics),
            cancel: Cancellation::new(),
            connected: None,
        }
    }

    /// Use `node` instead of connecting to the configured address.
    pub fn with_node(mut self, node: Arc<dyn NodeClient>) -> Self {
        self.node = Some(node);
        self
    }

    /// Read catchpoint catalogs from `catalog` instead of over HTTP.
    pub fn with_catalog(mut self, catalog: Arc<dyn CatalogSource>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Create the raw block histogram for `subsystem`, start reporting to
    /// it, and return its collectors for registration.
    ///
    /// May be called before or after `init`.
    pub fn provide_metrics(&mut self, subsystem: &str) -> Result<Vec<Box<dyn Collector>>> {
        let timer = RawBlockTimer::new(subsystem)?;
        let collectors = timer.collectors();
        self.metrics = Arc::new(timer);
        if let Some(connected) = &mut self.connected {
            connected.fetcher.set_metrics(self.metrics.clone());
        }
        Ok(collectors)
    }

    /// Mode resolved at init. `None` before init.
    pub fn mode(&self) -> Option<Mode> {
        self.connected.as_ref().map(|c| c.fetcher.mode())
    }

    fn connected(&self) -> Result<&Connected> {
        self.connected.as_ref().ok_or(ImporterError::NotInitialized)
    }

    fn connect(&self, config: &AlgodImporterConfig) -> Result<Arc<dyn NodeClient>> {
        if let Some(node) = &self.node {
            return Ok(node.clone());
        }

        let client = HttpNodeClient::new(
            &config.netaddr,
            config.token.clone(),
            config.catchup_config.admin_token().map(str::to_string),
        )
        .map_err(|e| match e {
            NodeError::InvalidAddress { .. } => ImporterError::Config(e.to_string()),
            e => ImporterError::node("unable to create node client", e),
        })?;
        Ok(Arc::new(client))
    }

    fn lookup(&self, config: &AlgodImporterConfig) -> Result<CatchpointLookupClient<Arc<dyn CatalogSource>>> {
        let source: Arc<dyn CatalogSource> = match &self.catalog {
            Some(catalog) => catalog.clone(),
            None => Arc::new(HttpCatalog::new().map_err(conduit_catchup::CatchupError::from)?),
        };

        let lookup = CatchpointLookupClient::new(source);
        Ok(match &config.catchpoint_catalog_url {
            Some(url) => lookup.with_base_url(url.clone()),
            None => lookup,
        })
    }
}

impl Default for AlgodImporter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Importer for AlgodImporter {
    type Config = AlgodImporterConfig;

    fn metadata(&self) -> PluginMetadata {
        PluginMetadata {
            name: ALGOD_IMPORTER_NAME,
            description: "Importer for fetching blocks from an algod REST API.",
            deprecated: false,
            sample_config: SAMPLE_CONFIG,
        }
    }

    async fn init(
        &mut self,
        cancel: Cancellation,
        init_provider: &mut dyn InitProvider,
        config: AlgodImporterConfig,
    ) -> Result<Genesis> {
        self.cancel = cancel.child();
        let mode = config.mode()?;
        let node = self.connect(&config)?;

        let genesis = match self.cancel.run(node.genesis()).await {
            None => return Err(ImporterError::Cancelled),
            Some(result) => result.map_err(|e| ImporterError::node("unable to fetch genesis", e))?,
        };
        if genesis.is_empty() {
            return Err(ImporterError::Genesis {
                address: config.netaddr,
            });
        }

        let target = init_provider.next_db_round();
        info!(network = %genesis.network, %mode, target, "synchronizing node");

        let coordinator =
            NodeCatchupCoordinator::new(node.clone(), self.lookup(&config)?, mode, self.cancel.clone())
                .with_network(genesis.network.clone())
                .with_catchup_config(config.catchup_config);
        coordinator.synchronize(target).await?;

        let fetcher = RetryingBlockFetcher::new(node, mode, self.cancel.clone())
            .with_metrics(self.metrics.clone());
        self.connected = Some(Connected { fetcher });

        Ok(genesis)
    }

    async fn get_block(&self, round: Round) -> Result<BlockRecord> {
        self.connected()?.fetcher.get_block(round).await
    }

    async fn on_complete(&self, record: &BlockRecord) -> Result<()> {
        let fetcher = &self.connected()?.fetcher;
        if !fetcher.mode().is_follower() {
            return Ok(());
        }

        let sync_round = record.round() + 1;
        match self.cancel.run(fetcher.node().set_sync_round(sync_round)).await {
            None => Err(ImporterError::Cancelled),
            Some(result) => result
                .map_err(|e| ImporterError::node(format!("unable to set sync round ({sync_round})"), e)),
        }
    }

    async fn close(&self) -> Result<()> {
        self.cancel.cancel();
        Ok(())
    }
}
