//! Round and catchpoint definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// A round number: one unit of ledger history (a block height).
pub type Round = u64;

/// A catchpoint label of the form `"<round>#<hash>"`.
///
/// The hash is carried verbatim; only the round is interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Catchpoint {
    round: Round,
    hash: String,
}

impl Catchpoint {
    pub fn new(round: Round, hash: impl Into<String>) -> Self {
        Self {
            round,
            hash: hash.into(),
        }
    }

    /// Parse a catchpoint label.
    pub fn parse(label: &str) -> Result<Self, CoreError> {
        let mut parts = label.split('#');
        let (Some(round), Some(hash), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(CoreError::InvalidCatchpoint(label.to_string()));
        };

        let round = round
            .parse::<u64>()
            .map_err(|source| CoreError::InvalidCatchpointRound {
                label: label.to_string(),
                source,
            })?;

        Ok(Self {
            round,
            hash: hash.to_string(),
        })
    }

    /// The round this catchpoint restores state to.
    pub const fn round(&self) -> Round {
        self.round
    }

    /// The content hash portion of the label.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// The full label, as sent to the node.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Catchpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.round, self.hash)
    }
}

impl FromStr for Catchpoint {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Catchpoint {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Catchpoint> for String {
    fn from(cp: Catchpoint) -> Self {
        cp.to_string()
    }
}
