//! REST implementation of the NodeClient trait.
//!
//! Every request carries the API token in the `X-Algo-API-Token` header.
//! Starting a fast catchup is an administrative call and uses the admin
//! token instead.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Response, Url};
use tracing::info;

use conduit_core::{CoreError, Genesis, NodeStatus, Round};

use crate::client::NodeClient;
use crate::error::{NodeError, Result};

/// Header used by the node to authenticate API calls.
pub const API_TOKEN_HEADER: &str = "X-Algo-API-Token";

/// Upper bound on a single request. Longer than the node's own
/// wait-for-block timeout so that long polls end on the node's side.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Parse a configured node address, prefixing `http://` when no scheme is
/// given.
pub fn normalize_address(address: &str) -> Result<Url> {
    let address = if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        let prefixed = format!("http://{address}");
        info!(address = %prefixed, "added http prefix to node address");
        prefixed
    };

    let url = Url::parse(&address).map_err(|e| NodeError::InvalidAddress {
        address: address.clone(),
        reason: e.to_string(),
    })?;

    if url.cannot_be_a_base() {
        return Err(NodeError::InvalidAddress {
            address,
            reason: "address cannot be used as a base URL".into(),
        });
    }

    Ok(url)
}

/// Client for the node's REST API.
#[derive(Debug, Clone)]
pub struct HttpNodeClient {
    client: Client,
    base: Url,
    token: String,
    admin_token: Option<String>,
}

impl HttpNodeClient {
    /// Create a client for the node at `address`.
    pub fn new(
        address: &str,
        token: impl Into<String>,
        admin_token: Option<String>,
    ) -> Result<Self> {
        let base = normalize_address(address)?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base,
            token: token.into(),
            admin_token,
        })
    }

    /// The normalized base URL.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Build the URL for an API path. Segments are percent-escaped.
    fn endpoint<I>(&self, segments: I) -> Result<Url>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| NodeError::InvalidAddress {
                address: self.base.to_string(),
                reason: "address cannot be used as a base URL".into(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get(&self, url: Url) -> Result<Bytes> {
        let response = self
            .client
            .get(url)
            .header(API_TOKEN_HEADER, &self.token)
            .send()
            .await?;
        read_body(response).await
    }

    async fn post(&self, url: Url, token: &str) -> Result<Bytes> {
        let response = self
            .client
            .post(url)
            .header(API_TOKEN_HEADER, token)
            .send()
            .await?;
        read_body(response).await
    }

    async fn get_status(&self, url: Url) -> Result<NodeStatus> {
        let body = self.get(url).await?;
        serde_json::from_slice(&body).map_err(|e| NodeError::Decoding(CoreError::from(e)))
    }
}

/// Return the body of a successful response, or the status and body of a
/// failed one.
async fn read_body(response: Response) -> Result<Bytes> {
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        return Err(NodeError::Status {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).trim().to_string(),
        });
    }

    Ok(body)
}

#[async_trait]
impl NodeClient for HttpNodeClient {
    async fn genesis(&self) -> Result<Genesis> {
        let body = self.get(self.endpoint(["genesis"])?).await?;
        Ok(Genesis::decode(&body)?)
    }

    async fn status(&self) -> Result<NodeStatus> {
        self.get_status(self.endpoint(["v2", "status"])?).await
    }

    async fn status_after_round(&self, round: Round) -> Result<NodeStatus> {
        let round = round.to_string();
        let url = self.endpoint(["v2", "status", "wait-for-block-after", round.as_str()])?;
        self.get_status(url).await
    }

    async fn raw_block(&self, round: Round) -> Result<Bytes> {
        let round = round.to_string();
        let mut url = self.endpoint(["v2", "blocks", round.as_str()])?;
        url.query_pairs_mut().append_pair("format", "json");
        self.get(url).await
    }

    async fn raw_delta(&self, round: Round) -> Result<Bytes> {
        let round = round.to_string();
        let mut url = self.endpoint(["v2", "deltas", round.as_str()])?;
        url.query_pairs_mut().append_pair("format", "json");
        self.get(url).await
    }

    async fn set_sync_round(&self, round: Round) -> Result<()> {
        let round = round.to_string();
        let url = self.endpoint(["v2", "ledger", "sync", round.as_str()])?;
        self.post(url, &self.token).await?;
        Ok(())
    }

    async fn start_catchpoint_catchup(&self, label: &str) -> Result<()> {
        let url = self.endpoint(["v2", "catchup", label])?;
        let token = self.admin_token.as_deref().unwrap_or(&self.token);
        self.post(url, token).await?;
        Ok(())
    }
}
