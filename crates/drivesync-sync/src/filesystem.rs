//! Local filesystem adapter (secondary/driven adapter)
//!
//! Implements [`ILocalStore`] over a sync root directory using `tokio::fs`.
//! Paths crossing the port are relative, `/`-separated and validated before
//! they are joined onto the root, so no operation can escape it.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use drivesync_core::domain::{newtypes::validate_relative_path, timestamp, Timestamp};
use drivesync_core::ports::{is_staging_file, ILocalStore};
use tracing::{debug, instrument, warn};

/// Adapter that bridges the [`ILocalStore`] port to a directory tree
#[derive(Debug, Clone)]
pub struct LocalFileSystemAdapter {
    root: PathBuf,
    follow_symlinks: bool,
}

impl LocalFileSystemAdapter {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, follow_symlinks: bool) -> Self {
        Self {
            root: root.into(),
            follow_symlinks,
        }
    }

    /// The sync root
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn relative_of(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let segments: Option<Vec<&str>> = rel.iter().map(|s| s.to_str()).collect();
        Some(segments?.join("/"))
    }
}

#[async_trait::async_trait]
impl ILocalStore for LocalFileSystemAdapter {
    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn list_files(&self) -> anyhow::Result<Vec<String>> {
        if !tokio::fs::try_exists(&self.root).await? {
            debug!("creating missing sync root");
            tokio::fs::create_dir_all(&self.root)
                .await
                .with_context(|| format!("creating sync root {}", self.root.display()))?;
        }

        let mut files = Vec::new();
        let mut visited = HashSet::new();
        let mut pending = vec![self.root.clone()];
        if let Ok(canonical) = tokio::fs::canonicalize(&self.root).await {
            visited.insert(canonical);
        }

        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir)
                .await
                .with_context(|| format!("reading directory {}", dir.display()))?;

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let file_type = entry.file_type().await?;

                let (is_dir, is_file) = if file_type.is_symlink() {
                    match tokio::fs::metadata(&path).await {
                        Ok(target) => (target.is_dir() && self.follow_symlinks, target.is_file()),
                        Err(e) => {
                            debug!(path = %path.display(), error = %e, "skipping dangling symlink");
                            continue;
                        }
                    }
                } else {
                    (file_type.is_dir(), file_type.is_file())
                };

                if is_dir {
                    let canonical = tokio::fs::canonicalize(&path).await?;
                    if visited.insert(canonical) {
                        pending.push(path);
                    } else {
                        debug!(path = %path.display(), "directory already visited");
                    }
                } else if is_file {
                    match self.relative_of(&path) {
                        Some(rel) if is_staging_file(&rel) => {
                            debug!(path = %rel, "skipping staging file");
                        }
                        Some(rel) => files.push(rel),
                        None => warn!(path = %path.display(), "skipping non UTF-8 path"),
                    }
                }
            }
        }

        files.sort();
        debug!(count = files.len(), "local listing complete");
        Ok(files)
    }

    #[instrument(skip(self))]
    async fn modified(&self, path: &str) -> anyhow::Result<Timestamp> {
        let abs = self.absolute(path)?;
        let metadata = tokio::fs::metadata(&abs)
            .await
            .with_context(|| format!("stat {}", abs.display()))?;
        Ok(timestamp::from_system_time(metadata.modified()?))
    }

    async fn size(&self, path: &str) -> anyhow::Result<u64> {
        let abs = self.absolute(path)?;
        Ok(tokio::fs::metadata(&abs).await?.len())
    }

    #[instrument(skip(self))]
    async fn remove(&self, path: &str) -> anyhow::Result<()> {
        let abs = self.absolute(path)?;
        match tokio::fs::remove_file(&abs).await {
            Ok(()) => {
                debug!("file removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("file already absent");
                Ok(())
            }
            Err(e) => Err(e).with_context(|| format!("removing {}", abs.display())),
        }
    }

    #[instrument(skip(self))]
    async fn ensure_directory(&self, path: &str) -> anyhow::Result<()> {
        let abs = if path.is_empty() {
            self.root.clone()
        } else {
            self.absolute(path)?
        };
        tokio::fs::create_dir_all(&abs).await?;
        Ok(())
    }

    fn absolute(&self, path: &str) -> anyhow::Result<PathBuf> {
        validate_relative_path(path)?;
        Ok(path.split('/').fold(self.root.clone(), |acc, seg| acc.join(seg)))
    }
}
