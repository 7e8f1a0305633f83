//! Block records: the unit of output handed to the pipeline runner.
//!
//! Header fields, transactions, certificates and state deltas are carried
//! opaquely. Only the header round is interpreted.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::types::Round;

/// Immutable block header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// The round this header belongs to. Absent for the genesis round.
    #[serde(rename = "rnd", default, skip_serializing_if = "is_zero")]
    pub round: Round,

    /// All other header fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// A signed transaction as it appears inside a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignedTxnInBlock(pub Value);

/// Vote certificate attached to a block by the node.
pub type Certificate = Map<String, Value>;

/// Ledger state changes attributable to exactly one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerStateDelta(pub Value);

impl LedgerStateDelta {
    /// Decode a delta from the node's JSON encoding.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Everything the pipeline receives for one round.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    /// The block header.
    #[serde(rename = "block", default)]
    pub header: BlockHeader,

    /// The transactions carried by the block.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payset: Vec<SignedTxnInBlock>,

    /// State delta for the round (follower mode only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<LedgerStateDelta>,

    /// Vote certificate. Non-deterministic: a node stops collecting votes
    /// once the threshold is reached.
    #[serde(rename = "cert", default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<Certificate>,
}

/// Wire shape of the node's block response: `{"block": {...,"txns":[...]}, "cert": {...}}`.
#[derive(Deserialize)]
struct BlockResponse {
    block: EncodedBlock,
    #[serde(default)]
    cert: Option<Certificate>,
}

#[derive(Deserialize)]
struct EncodedBlock {
    #[serde(rename = "txns", default)]
    payset: Vec<SignedTxnInBlock>,
    #[serde(flatten)]
    header: BlockHeader,
}

impl BlockRecord {
    /// Decode header, payset and certificate from a raw block response.
    ///
    /// The delta is never part of the block response; it is attached
    /// separately by the caller.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let response: BlockResponse = serde_json::from_slice(bytes)?;
        Ok(Self {
            header: response.block.header,
            payset: response.block.payset,
            delta: None,
            certificate: response.cert,
        })
    }

    /// The round this record belongs to.
    pub fn round(&self) -> Round {
        self.header.round
    }

    /// Whether the block carries no transactions.
    pub fn is_empty(&self) -> bool {
        self.payset.is_empty()
    }
}

fn is_zero(round: &Round) -> bool {
    *round == 0
}
