//! Manifest store
//!
//! Persists, per synced relative path, the local and remote modification
//! times observed right after the last successful sync of that path. A path
//! has an entry exactly when both sides are believed to hold the same
//! content generation.
//!
//! The document is a single JSON object:
//!
//! ```json
//! { "docs/a.txt": { "local_modified": "2024-03-01T12:00:00Z",
//!                   "remote_modified": "2024-03-01T11:59:58.120Z" } }
//! ```
//!
//! Every mutation is written through immediately (temp file + rename) so an
//! interrupted run loses at most the item in flight.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use drivesync_core::domain::{ManifestEntry, Timestamp};
use drivesync_core::ports::STAGING_SUFFIX;

use crate::ignore::IgnorePolicy;
use crate::SyncError;

/// In-memory view of the manifest bound to its file
#[derive(Debug)]
pub struct ManifestStore {
    path: PathBuf,
    entries: BTreeMap<String, ManifestEntry>,
}

impl ManifestStore {
    /// Loads the manifest at `path`, creating an empty one if it is missing
    ///
    /// Entries matching `ignore` are dropped from the loaded view.
    ///
    /// # Errors
    /// Fails if the file cannot be read or created, or is not a manifest document
    #[instrument(skip(ignore), fields(path = %path.display()))]
    pub async fn load(path: &Path, ignore: &IgnorePolicy) -> Result<Self, SyncError> {
        let store = Self::read(path, ignore).await?;
        if !tokio::fs::try_exists(path).await? {
            info!("Creating empty manifest");
            store.persist().await?;
        }
        Ok(store)
    }

    /// Loads the manifest without touching the filesystem if it is missing
    pub async fn read(path: &Path, ignore: &IgnorePolicy) -> Result<Self, SyncError> {
        let entries: BTreeMap<String, ManifestEntry> = match tokio::fs::read(path).await {
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| SyncError::CorruptManifest {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        let total = entries.len();
        let entries: BTreeMap<_, _> = entries
            .into_iter()
            .filter(|(p, _)| !ignore.is_ignored(p))
            .collect();
        debug!(total, kept = entries.len(), "Manifest loaded");

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Entry for `path`, if the path was synced before
    pub fn get(&self, path: &str) -> Option<&ManifestEntry> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in path order
    pub fn entries(&self) -> &BTreeMap<String, ManifestEntry> {
        &self.entries
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Inserts or replaces the entry for `path` and persists
    pub async fn record(
        &mut self,
        path: &str,
        local_modified: Timestamp,
        remote_modified: Timestamp,
    ) -> Result<(), SyncError> {
        debug!(path, %local_modified, %remote_modified, "Recording manifest entry");
        self.entries.insert(
            path.to_string(),
            ManifestEntry::new(local_modified, remote_modified),
        );
        self.persist().await
    }

    /// Removes the entry for `path` and persists
    pub async fn forget(&mut self, path: &str) -> Result<(), SyncError> {
        if self.entries.remove(path).is_some() {
            debug!(path, "Forgetting manifest entry");
            self.persist().await?;
        }
        Ok(())
    }

    async fn persist(&self) -> Result<(), SyncError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let data = serde_json::to_vec_pretty(&self.entries).map_err(|e| {
            SyncError::CorruptManifest {
                path: self.path.clone(),
                reason: e.to_string(),
            }
        })?;

        let tmp_path = {
            let mut p = self.path.as_os_str().to_owned();
            p.push(STAGING_SUFFIX);
            PathBuf::from(p)
        };
        tokio::fs::write(&tmp_path, data).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use drivesync_core::config::{FilterConfig, InclusionMode};
    use drivesync_core::domain::timestamp::parse_rfc3339;
    use tempfile::TempDir;

    use super::*;

    fn ts(s: &str) -> Timestamp {
        parse_rfc3339(s).unwrap()
    }

    #[tokio::test]
    async fn test_load_missing_creates_empty_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state").join("manifest.json");

        let store = ManifestStore::load(&path, &IgnorePolicy::none()).await.unwrap();
        assert!(store.is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_read_missing_does_not_create() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manifest.json");

        let store = ManifestStore::read(&path, &IgnorePolicy::none()).await.unwrap();
        assert!(store.is_empty());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_record_then_load_roundtrips_timestamps() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manifest.json");
        let local = ts("2024-05-01T10:00:00.123456+02:00");
        let remote = ts("2024-05-01T08:00:01.5Z");

        let mut store = ManifestStore::load(&path, &IgnorePolicy::none()).await.unwrap();
        store.record("docs/a.txt", local, remote).await.unwrap();

        let reloaded = ManifestStore::load(&path, &IgnorePolicy::none()).await.unwrap();
        let entry = reloaded.get("docs/a.txt").unwrap();
        assert_eq!(entry.local_modified, local);
        assert_eq!(entry.remote_modified, remote);
        assert_eq!(entry.local_modified.offset(), local.offset());
    }

    #[tokio::test]
    async fn test_forget_is_persisted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manifest.json");
        let t = ts("2024-01-01T00:00:00Z");

        let mut store = ManifestStore::load(&path, &IgnorePolicy::none()).await.unwrap();
        store.record("a", t, t).await.unwrap();
        store.record("b", t, t).await.unwrap();
        store.forget("a").await.unwrap();

        let reloaded = ManifestStore::read(&path, &IgnorePolicy::none()).await.unwrap();
        assert!(!reloaded.contains("a"));
        assert!(reloaded.contains("b"));
        assert_eq!(reloaded.len(), 1);
    }

    #[tokio::test]
    async fn test_ignored_entries_are_filtered_on_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manifest.json");
        std::fs::write(
            &path,
            r#"{
  "keep.txt": {"local_modified": "2024-01-01T00:00:00Z", "remote_modified": "2024-01-01T00:00:00Z"},
  "skip.tmp": {"local_modified": "2024-01-01T00:00:00Z", "remote_modified": "2024-01-01T00:00:00Z"}
}"#,
        )
        .unwrap();
        let policy = IgnorePolicy::from_config(&FilterConfig {
            inclusion: InclusionMode::Blacklist,
            blacklist: vec!["*.tmp".into()],
            exceptions: vec![],
            whitelist: vec![],
        })
        .unwrap();

        let store = ManifestStore::load(&path, &policy).await.unwrap();
        assert!(store.contains("keep.txt"));
        assert!(!store.contains("skip.tmp"));
    }

    #[tokio::test]
    async fn test_corrupt_manifest_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manifest.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let err = ManifestStore::load(&path, &IgnorePolicy::none())
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::CorruptManifest { .. }));
    }

    #[tokio::test]
    async fn test_no_temp_file_left_behind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manifest.json");
        let t = ts("2024-01-01T00:00:00Z");

        let mut store = ManifestStore::load(&path, &IgnorePolicy::none()).await.unwrap();
        store.record("x", t, t).await.unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["manifest.json".to_string()]);
    }
}
