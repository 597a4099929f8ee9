//! Local store port (driven/secondary port)
//!
//! This module defines the interface for the local side of the sync: a
//! directory tree addressed by `/`-separated paths relative to the sync root.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because filesystem errors are adapter-specific.
//! - Metadata is read lazily per path instead of being part of the listing,
//!   since most files only need their mtime when they are in both listings.

use std::path::PathBuf;

use crate::domain::Timestamp;

/// Suffix of files that are written next to their final location and then
/// renamed into place
///
/// Adapters append it when staging a download or a manifest write; a file
/// carrying it is never part of the synced tree.
pub const STAGING_SUFFIX: &str = ".drivesync-part";

/// True if `path` names a staging file rather than user content
pub fn is_staging_file(path: &str) -> bool {
    path.ends_with(STAGING_SUFFIX)
}

/// Port trait for local filesystem operations
#[async_trait::async_trait]
pub trait ILocalStore: Send + Sync {
    /// Lists every regular file below the root as relative paths
    ///
    /// Directories and staging files (see [`is_staging_file`]) are not
    /// listed. Whether symlinked directories are
    /// followed is up to the implementation's configuration.
    async fn list_files(&self) -> anyhow::Result<Vec<String>>;

    /// Last modification time of `path`
    async fn modified(&self, path: &str) -> anyhow::Result<Timestamp>;

    /// Size of `path` in bytes
    async fn size(&self, path: &str) -> anyhow::Result<u64>;

    /// Deletes the file at `path`
    async fn remove(&self, path: &str) -> anyhow::Result<()>;

    /// Creates the directory `path` and its ancestors if missing
    async fn ensure_directory(&self, path: &str) -> anyhow::Result<()>;

    /// Absolute filesystem location of `path`
    fn absolute(&self, path: &str) -> anyhow::Result<PathBuf>;
}
