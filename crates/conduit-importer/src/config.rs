//! Algod importer configuration.

use serde::{Deserialize, Serialize};

use conduit_catchup::CatchupConfig;
use conduit_core::Mode;

use crate::error::{ImporterError, Result};

/// Sample configuration shown to operators.
pub const SAMPLE_CONFIG: &str = r#"# Algod importer: fetches blocks from an algod REST API.
name: algod
config:
  # The mode of operation, either "archival" or "follower".
  # * archival mode allows you to start processing on any round but does not
  #   contain the ledger state delta objects required for the postgres writer.
  # * follower mode allows you to use a lightweight non-archival node as the
  #   data source. In addition, it will provide ledger state delta objects to
  #   the processors and exporter.
  mode: "follower"

  # Algod API address.
  netaddr: "http://url:port"

  # Algod API token.
  token: ""

  # Algod catchpoint catchup arguments
  catchup-config:
    # Algod Admin API Token. Set the admin token to use fast catchup during
    # startup. The importer will only use fast catchup if the admin token is
    # set and the node is behind the catchpoint round.
    admin-token: ""
    # The catchpoint to use when running fast catchup. If this is set it
    # overrides the automatic lookup. Labels are of the form
    # "<round>#<hash>".
    catchpoint: ""
"#;

/// Configuration of the algod importer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AlgodImporterConfig {
    /// Node address. `http://` is assumed when no scheme is given.
    pub netaddr: String,

    /// Node API token.
    #[serde(default)]
    pub token: String,

    /// `archival` (default) or `follower`.
    #[serde(default)]
    pub mode: String,

    #[serde(default)]
    pub catchup_config: CatchupConfig,

    /// Host serving the catchpoint catalogs, when not the public one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catchpoint_catalog_url: Option<String>,
}

impl AlgodImporterConfig {
    pub fn new(netaddr: impl Into<String>) -> Self {
        Self {
            netaddr: netaddr.into(),
            ..Default::default()
        }
    }

    /// The configured mode. An empty mode means archival.
    pub fn mode(&self) -> Result<Mode> {
        Mode::parse(&self.mode).map_err(|e| ImporterError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kebab_case_keys() {
        let json = r#"{
            "netaddr": "localhost:4001",
            "token": "abc",
            "mode": "follower",
            "catchup-config": {"admin-token": "admin", "catchpoint": "100#X"},
            "catchpoint-catalog-url": "http://mirror.local"
        }"#;

        let config: AlgodImporterConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.netaddr, "localhost:4001");
        assert_eq!(config.mode().unwrap(), Mode::Follower);
        assert_eq!(config.catchup_config.admin_token(), Some("admin"));
        assert_eq!(config.catchup_config.catchpoint(), Some("100#X"));
        assert_eq!(config.catchpoint_catalog_url.as_deref(), Some("http://mirror.local"));
    }

    #[test]
    fn test_mode_defaults_to_archival() {
        let config: AlgodImporterConfig =
            serde_json::from_str(r#"{"netaddr": "localhost:4001"}"#).unwrap();
        assert_eq!(config.mode().unwrap(), Mode::Archival);
        assert_eq!(config.catchup_config, CatchupConfig::default());
    }

    #[test]
    fn test_unsupported_mode() {
        let mut config = AlgodImporterConfig::new("localhost:4001");
        config.mode = "bogus".into();

        let err = config.mode().unwrap_err();
        assert!(matches!(err, ImporterError::Config(_)));
        assert!(err.to_string().contains("(bogus)"));
    }

    #[test]
    fn test_sample_config_mentions_every_key() {
        for key in ["mode:", "netaddr:", "token:", "catchup-config:", "admin-token:", "catchpoint:"] {
            assert!(SAMPLE_CONFIG.contains(key), "{key}");
        }
    }
}
