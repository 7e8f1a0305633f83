//! Catchpoint catalog lookup.
//!
//! Each network publishes a newline-delimited catalog of catchpoint labels,
//! one `"<round>#<hash>"` per line in ascending round order. The lookup
//! picks the best label that does not reach the target round.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use conduit_core::{Catchpoint, Round};

use crate::error::LookupError;

/// Public catalog host used when none is configured.
pub const DEFAULT_CATALOG_URL: &str = "https://algorand-catchpoints.s3.us-east-2.amazonaws.com";

const CATALOG_TIMEOUT: Duration = Duration::from_secs(30);

/// Result type for lookup operations.
pub type Result<T> = std::result::Result<T, LookupError>;

/// URL of the consolidated catalog for `network` under `base`.
pub fn catalog_url(base: &str, network: &str) -> String {
    format!(
        "{}/consolidated/{}_catchpoints.txt",
        base.trim_end_matches('/'),
        network
    )
}

/// Pick the last catchpoint whose round is strictly below `target`.
///
/// Lines are read in order until a blank line or the end of input. The
/// scan stops at the first round at or past the target. A line that is
/// not a valid label is an error.
pub fn best_catchpoint(catalog: &str, target: Round) -> Result<Option<Catchpoint>> {
    let mut best = None;

    for line in catalog.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            break;
        }

        let catchpoint = Catchpoint::parse(line)?;
        if catchpoint.round() >= target {
            break;
        }
        best = Some(catchpoint);
    }

    Ok(best)
}

/// Source of catalog documents.
///
/// Implementations may use HTTP or serve canned text for tests.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch the catalog at `url` as text.
    async fn fetch(&self, url: &str) -> Result<String>;
}

#[async_trait]
impl<S: CatalogSource + ?Sized> CatalogSource for std::sync::Arc<S> {
    async fn fetch(&self, url: &str) -> Result<String> {
        (**self).fetch(url).await
    }
}

/// Fetches catalogs over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: Client,
}

impl HttpCatalog {
    pub fn new() -> Result<Self> {
        let client = Client::builder().timeout(CATALOG_TIMEOUT).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CatalogSource for HttpCatalog {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(LookupError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

/// Serves fixed catalog text per URL.
///
/// An unknown URL answers 404, like a missing object in the bucket.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    documents: HashMap<String, String>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for the catalog of `network` under `base`.
    pub fn with_catalog(mut self, base: &str, network: &str, body: impl Into<String>) -> Self {
        self.documents.insert(catalog_url(base, network), body.into());
        self
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| LookupError::Status {
                status: 404,
                body: format!("<Error><Code>NoSuchKey</Code><Key>{url}</Key></Error>"),
            })
    }
}

/// Resolves catchpoint labels from a network's catalog.
#[derive(Debug, Clone)]
pub struct CatchpointLookupClient<S: CatalogSource = HttpCatalog> {
    source: S,
    base_url: String,
}

impl CatchpointLookupClient<HttpCatalog> {
    /// A client for the public catalog over HTTP.
    pub fn http() -> Result<Self> {
        Ok(Self::new(HttpCatalog::new()?))
    }
}

impl<S: CatalogSource> CatchpointLookupClient<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            base_url: DEFAULT_CATALOG_URL.to_string(),
        }
    }

    /// Use a different catalog host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Best catchpoint for `network` strictly below `target`.
    pub async fn lookup(&self, network: &str, target: Round) -> Result<Catchpoint> {
        let url = catalog_url(&self.base_url, network);
        debug!(%url, target, "fetching catchpoint catalog");

        let catalog = self.source.fetch(&url).await?;
        best_catchpoint(&catalog, target)?.ok_or(LookupError::NotFound { round: target, url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const CATALOG: &str = "10#aaa\n20#bbb\n30#ccc\n";

    /// Serve one canned response; returns the base URL and the request text.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).to_string();

            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: text/plain\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request
        });

        (format!("http://{addr}"), handle)
    }

    fn client() -> CatchpointLookupClient<StaticCatalog> {
        let source = StaticCatalog::new().with_catalog(DEFAULT_CATALOG_URL, "testnet", CATALOG);
        CatchpointLookupClient::new(source)
    }

    #[test]
    fn test_catalog_url() {
        assert_eq!(
            catalog_url("https://host.example/", "mainnet"),
            "https://host.example/consolidated/mainnet_catchpoints.txt"
        );
    }

    #[test]
    fn test_best_match_without_going_over() {
        let best = best_catchpoint(CATALOG, 25).unwrap().unwrap();
        assert_eq!(best.label(), "20#bbb");
    }

    #[test]
    fn test_exact_round_is_not_selected() {
        let best = best_catchpoint(CATALOG, 20).unwrap().unwrap();
        assert_eq!(best.label(), "10#aaa");
    }

    #[test]
    fn test_target_past_last_entry() {
        let best = best_catchpoint(CATALOG, 31).unwrap().unwrap();
        assert_eq!(best.label(), "30#ccc");
    }

    #[test]
    fn test_target_before_first_entry() {
        assert!(best_catchpoint(CATALOG, 5).unwrap().is_none());
        assert!(best_catchpoint(CATALOG, 10).unwrap().is_none());
    }

    #[test]
    fn test_blank_line_ends_catalog() {
        let best = best_catchpoint("10#aaa\n\n20#bbb\n", 100).unwrap().unwrap();
        assert_eq!(best.label(), "10#aaa");
    }

    #[test]
    fn test_malformed_line_is_error() {
        let err = best_catchpoint("10#aaa\nnot-a-label\n", 100).unwrap_err();
        assert!(matches!(err, LookupError::Malformed(_)));
    }

    #[test]
    fn test_malformed_line_after_stop_is_ignored() {
        let best = best_catchpoint("10#aaa\n20#bbb\ngarbage\n", 15).unwrap().unwrap();
        assert_eq!(best.label(), "10#aaa");
    }

    #[tokio::test]
    async fn test_lookup() {
        let label = client().lookup("testnet", 25).await.unwrap();
        assert_eq!(label.to_string(), "20#bbb");
    }

    #[tokio::test]
    async fn test_lookup_not_found() {
        let err = client().lookup("testnet", 5).await.unwrap_err();
        assert!(matches!(err, LookupError::NotFound { round: 5, .. }));
        assert!(err.to_string().contains("testnet_catchpoints.txt"));
    }

    #[tokio::test]
    async fn test_lookup_status_error_carries_body() {
        let err = client().lookup("betanet", 25).await.unwrap_err();
        match err {
            LookupError::Status { status, body } => {
                assert_eq!(status, 404);
                assert!(body.contains("NoSuchKey"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_http_catalog_scan() {
        let (base, server) = serve_once("200 OK", CATALOG).await;
        let client = CatchpointLookupClient::new(HttpCatalog::new().unwrap()).with_base_url(base);

        let label = client.lookup("testnet", 25).await.unwrap();
        assert_eq!(label.label(), "20#bbb");

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /consolidated/testnet_catchpoints.txt "));
    }

    #[tokio::test]
    async fn test_http_catalog_status_error_carries_body() {
        let body = "<Error><Code>NoSuchKey</Code></Error>";
        let (base, server) = serve_once("404 Not Found", body).await;
        let client = CatchpointLookupClient::new(HttpCatalog::new().unwrap()).with_base_url(base);

        let err = client.lookup("betanet", 25).await.unwrap_err();
        match err {
            LookupError::Status { status, body: text } => {
                assert_eq!(status, 404);
                assert_eq!(text, body);
            }
            other => panic!("expected status error, got {other:?}"),
        }
        server.await.unwrap();
    }
}
