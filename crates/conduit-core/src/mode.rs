//! Operating mode of the backing node.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// How the backing node serves history. Chosen once at init.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// The node serves history on its own. No sync round, no deltas.
    #[default]
    Archival,
    /// An external controller drives the node through its sync round,
    /// which unlocks per-round state deltas.
    Follower,
}

impl Mode {
    pub const ARCHIVAL: &'static str = "archival";
    pub const FOLLOWER: &'static str = "follower";

    /// Parse a configured mode. An empty string selects [`Mode::Archival`]
    /// for compatibility with configurations that predate the option.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "" | Self::ARCHIVAL => Ok(Self::Archival),
            Self::FOLLOWER => Ok(Self::Follower),
            other => Err(CoreError::InvalidMode(other.to_string())),
        }
    }

    pub fn is_follower(self) -> bool {
        self == Self::Follower
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Archival => Self::ARCHIVAL,
            Self::Follower => Self::FOLLOWER,
        }
    }
}

impl FromStr for Mode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
