//! Remote path resolution
//!
//! The remote listing is flat: each item only knows the ids of its parents.
//! [`PathResolver`] turns an item into a `/`-separated path by walking the
//! first-parent chain, and turns a directory path back into a folder,
//! creating the missing ones on the way.
//!
//! Folders are memoized by id for the duration of a run. The cache is
//! seeded from the listing and grows when an ancestor has to be fetched
//! individually or a folder is created.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, trace, warn};

use drivesync_core::domain::{RemoteId, RemoteItem};
use drivesync_core::ports::IRemoteStore;

/// Folder cache plus the resolution algorithms built on it
pub struct PathResolver {
    remote: Arc<dyn IRemoteStore>,
    folders: HashMap<RemoteId, RemoteItem>,
    /// Cache insertion order, used to pick the first of same-named siblings
    order: Vec<RemoteId>,
}

impl PathResolver {
    pub fn new(remote: Arc<dyn IRemoteStore>) -> Self {
        Self {
            remote,
            folders: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Adds a folder to the cache; an id already cached keeps its first entry
    pub fn cache_folder(&mut self, folder: RemoteItem) {
        if !self.folders.contains_key(&folder.id) {
            self.order.push(folder.id.clone());
            self.folders.insert(folder.id.clone(), folder);
        }
    }

    /// Number of cached folders
    pub fn cached_count(&self) -> usize {
        self.folders.len()
    }

    /// Looks a folder up in the cache, fetching and caching it on a miss
    async fn folder(&mut self, id: &RemoteId) -> Result<Option<RemoteItem>> {
        if let Some(folder) = self.folders.get(id) {
            trace!(%id, "Folder cache hit");
            return Ok(Some(folder.clone()));
        }

        debug!(%id, "Folder cache miss, fetching");
        let fetched = self
            .remote
            .get_item(id)
            .await
            .with_context(|| format!("Failed to fetch folder {id}"))?;
        if let Some(folder) = &fetched {
            self.cache_folder(folder.clone());
        }
        Ok(fetched)
    }

    /// Full path of `item` below the drive root
    ///
    /// An item without parents resolves to its own name. The top-level
    /// folder contributes no segment. If an ancestor cannot be found, or the
    /// chain loops, the item is reported as orphaned and the partial path
    /// built so far is returned.
    pub async fn resolve(&mut self, item: &RemoteItem) -> String {
        let mut segments = vec![item.name.clone()];
        let mut visited = HashSet::new();
        let mut next = item.first_parent().cloned();

        while let Some(parent_id) = next {
            if !visited.insert(parent_id.clone()) {
                warn!(id = %item.id, name = %item.name, parent = %parent_id, "Parent chain loops, using partial path");
                break;
            }

            let parent = match self.folder(&parent_id).await {
                Ok(Some(parent)) => parent,
                Ok(None) => {
                    warn!(id = %item.id, name = %item.name, parent = %parent_id, "Orphaned item: parent folder not found");
                    break;
                }
                Err(err) => {
                    warn!(id = %item.id, name = %item.name, parent = %parent_id, error = %err, "Orphaned item: parent folder unavailable");
                    break;
                }
            };

            if !parent.parents.is_empty() {
                segments.push(parent.name.clone());
            }
            next = parent.first_parent().cloned();
        }

        segments.reverse();
        segments.join("/")
    }

    /// The user's top-level folder
    ///
    /// Uses the cached parent-less folder if there is one, otherwise fetches
    /// it through the `root` alias and caches it.
    pub async fn root(&mut self) -> Result<RemoteItem> {
        if let Some(root) = self
            .order
            .iter()
            .filter_map(|id| self.folders.get(id))
            .find(|f| f.is_root())
        {
            return Ok(root.clone());
        }

        let root = self
            .remote
            .get_item(&RemoteId::root_alias())
            .await
            .context("Failed to fetch root folder")?
            .context("Remote store has no root folder")?;
        debug!(id = %root.id, name = %root.name, "Root folder fetched");
        self.cache_folder(root.clone());
        Ok(root)
    }

    /// First cached folder named `name` whose first parent is `parent`
    fn child_folder(&self, parent: &RemoteId, name: &str) -> Option<&RemoteItem> {
        self.order
            .iter()
            .filter_map(|id| self.folders.get(id))
            .find(|f| f.is_folder() && f.name == name && f.first_parent() == Some(parent))
    }

    /// Folder at `directory` (relative, `/`-separated), creating missing levels
    pub async fn resolve_or_create(&mut self, directory: &str) -> Result<RemoteItem> {
        let mut current = self.root().await?;

        for segment in directory.split('/').filter(|s| !s.is_empty()) {
            current = match self.child_folder(&current.id, segment) {
                Some(existing) => existing.clone(),
                None => {
                    info!(name = segment, parent = %current.id, "Creating remote folder");
                    let created = self
                        .remote
                        .create_folder(segment, &current.id)
                        .await
                        .with_context(|| format!("Failed to create folder '{segment}'"))?;
                    self.cache_folder(created.clone());
                    created
                }
            };
        }

        Ok(current)
    }
}
