//! Conflict strategies
//!
//! A strategy only matters when a file changed on both sides since the
//! last sync. The configuration carries it as a label which is parsed once.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConflictError;

/// What to do when both the local and the remote copy changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStrategy {
    /// Leave both copies alone and keep the manifest entry as is
    Ignore,
    /// Upload the local copy over the remote one
    KeepLocal,
    /// Download the remote copy over the local one
    KeepRemote,
    /// Whichever copy was modified last wins; a tie goes to the remote copy
    KeepLatest,
}

impl ConflictStrategy {
    /// Every strategy, in label order
    pub const ALL: [ConflictStrategy; 4] = [
        ConflictStrategy::Ignore,
        ConflictStrategy::KeepLocal,
        ConflictStrategy::KeepRemote,
        ConflictStrategy::KeepLatest,
    ];

    /// Configuration label of this strategy
    pub fn label(&self) -> &'static str {
        match self {
            ConflictStrategy::Ignore => "ignore",
            ConflictStrategy::KeepLocal => "keep_local",
            ConflictStrategy::KeepRemote => "keep_remote",
            ConflictStrategy::KeepLatest => "keep_latest",
        }
    }

    fn valid_labels() -> String {
        Self::ALL
            .iter()
            .map(ConflictStrategy::label)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ConflictStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ConflictStrategy {
    type Err = ConflictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.label() == s)
            .ok_or_else(|| ConflictError::InvalidStrategy {
                label: s.to_string(),
                valid: Self::valid_labels(),
            })
    }
}
