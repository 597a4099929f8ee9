//! Listing partition
//!
//! Splits the resolved remote listing and the local listing into files
//! present on both sides, only remotely, and only locally. Paths are compared
//! by exact string equality; renames show up as one deletion plus one
//! creation.

use std::collections::HashSet;

use drivesync_core::domain::RemoteItem;

/// The three disjoint partitions of a run
#[derive(Debug, Clone, Default)]
pub struct Diff {
    /// Remote items whose path also exists locally
    pub both: Vec<RemoteItem>,
    /// Remote items with no local counterpart
    pub remote_ahead: Vec<RemoteItem>,
    /// Local paths with no remote counterpart
    pub local_ahead: Vec<String>,
}

impl Diff {
    /// Partitions `remote` (paths already resolved) against `local`
    pub fn compute(remote: Vec<RemoteItem>, local: Vec<String>) -> Self {
        let local_set: HashSet<&str> = local.iter().map(String::as_str).collect();
        let remote_set: HashSet<String> = remote
            .iter()
            .map(|item| item.path_or_name().to_string())
            .collect();

        let (both, remote_ahead): (Vec<_>, Vec<_>) = remote
            .into_iter()
            .partition(|item| local_set.contains(item.path_or_name()));

        let local_ahead = local
            .iter()
            .filter(|path| !remote_set.contains(path.as_str()))
            .cloned()
            .collect();

        Self {
            both,
            remote_ahead,
            local_ahead,
        }
    }

    /// Number of files the local side is missing
    pub fn behind(&self) -> usize {
        self.remote_ahead.len()
    }

    /// Number of files the remote side is missing
    pub fn ahead(&self) -> usize {
        self.local_ahead.len()
    }
}
