//! Genesis record of a chain.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// The chain's genesis file.
///
/// Decoding is lenient: the node's genesis document carries fields this
/// type does not model, and they are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Genesis {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alloc: Vec<Value>,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub comment: String,

    #[serde(rename = "devmode", skip_serializing_if = "std::ops::Not::not")]
    pub dev_mode: bool,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub fees: String,

    /// Genesis schema identifier, e.g. `v1.0`.
    #[serde(rename = "id")]
    pub schema_id: String,

    /// Network name, e.g. `mainnet`. Used to locate the catchpoint catalog.
    pub network: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub proto: String,

    #[serde(rename = "rwd", skip_serializing_if = "String::is_empty")]
    pub rewards_pool: String,

    #[serde(skip_serializing_if = "is_zero")]
    pub timestamp: i64,
}

impl Genesis {
    /// Decode a genesis document.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Whether the document decoded to nothing at all.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// `<network>-<id>`, the identifier blocks carry in their header.
    pub fn id(&self) -> String {
        format!("{}-{}", self.network, self.schema_id)
    }
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}
