//! Manifest entries
//!
//! The manifest maps each synced relative path to the timestamps both sides
//! had when they last agreed on the file's content.

use serde::{Deserialize, Serialize};

use super::timestamp::Timestamp;

/// Last-known-good timestamps of one synced file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Local mtime right after the last sync of this path
    pub local_modified: Timestamp,
    /// Remote modification (or creation) time right after the last sync
    pub remote_modified: Timestamp,
}

impl ManifestEntry {
    pub fn new(local_modified: Timestamp, remote_modified: Timestamp) -> Self {
        Self {
            local_modified,
            remote_modified,
        }
    }
}
