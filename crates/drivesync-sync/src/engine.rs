//! Two-way synchronization engine
//!
//! The [`SyncEngine`] reconciles the remote drive with the local root using
//! the manifest as the record of the last agreed state.
//!
//! ## Sync Flow
//!
//! 1. **List**: page through the remote listing, keep the user's own items,
//!    cache folders and resolve file paths; walk the local root
//! 2. **Filter**: apply the ignore policy to both listings and the manifest
//! 3. **Plan**: partition into `both`, `remote_ahead` and `local_ahead` and
//!    turn each item into at most one [`SyncAction`]
//! 4. **Apply**: execute the actions in order, updating the manifest after
//!    every successful one
//!
//! Planning never mutates anything, so [`SyncEngine::plan`] doubles as the
//! dry run. Failures local to one item are collected in the result and the
//! run continues; listing and manifest failures abort it.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use drivesync_conflict::{ConflictResolver, Decision, VersionTimes};
use drivesync_core::config::Config;
use drivesync_core::domain::{RemoteItem, Timestamp};
use drivesync_core::ports::{is_staging_file, ILocalStore, IRemoteStore, ListFilter};

use crate::diff::Diff;
use crate::ignore::IgnorePolicy;
use crate::manifest::ManifestStore;
use crate::path_resolver::PathResolver;
use crate::SyncError;

/// Summary of a completed synchronization run
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncResult {
    /// New remote files downloaded
    pub downloaded: u32,
    /// Local copies replaced by a newer remote version
    pub updated_local: u32,
    /// New local files uploaded
    pub uploaded: u32,
    /// Remote copies replaced by a newer local version
    pub updated_remote: u32,
    /// Local files removed because they were deleted remotely
    pub deleted_local: u32,
    /// Remote files trashed because they were deleted locally
    pub trashed_remote: u32,
    /// Files present on both sides recorded without transfer
    pub baselined: u32,
    /// Files changed on both sides and left alone
    pub conflicts_skipped: u32,
    /// Errors encountered during the run (non-fatal)
    pub errors: Vec<String>,
    /// Wall-clock duration of the run in milliseconds
    pub duration_ms: u64,
}

impl SyncResult {
    /// Number of actions that changed either side
    pub fn transfers(&self) -> u32 {
        self.downloaded
            + self.updated_local
            + self.uploaded
            + self.updated_remote
            + self.deleted_local
            + self.trashed_remote
    }
}

/// One planned step of a run
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SyncAction {
    /// Present on both sides without a manifest entry: record as agreed
    Baseline { item: RemoteItem },
    /// Local copy changed since the last sync: upload it
    Push { item: RemoteItem },
    /// Remote copy changed since the last sync: download it
    Pull { item: RemoteItem },
    /// Both copies changed and the strategy leaves them alone
    SkipConflict { item: RemoteItem, misconfigured: bool },
    /// New remote file
    Download { item: RemoteItem },
    /// Synced file deleted locally: trash the remote copy
    TrashRemote { item: RemoteItem },
    /// New local file
    Upload { path: String },
    /// Synced file deleted remotely: delete the local copy
    DeleteLocal { path: String },
}

impl SyncAction {
    /// Relative path the action applies to
    pub fn path(&self) -> &str {
        match self {
            Self::Baseline { item }
            | Self::Push { item }
            | Self::Pull { item }
            | Self::SkipConflict { item, .. }
            | Self::Download { item }
            | Self::TrashRemote { item } => item.path_or_name(),
            Self::Upload { path } | Self::DeleteLocal { path } => path,
        }
    }

    /// Short machine-readable name of the action
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Baseline { .. } => "baseline",
            Self::Push { .. } => "push",
            Self::Pull { .. } => "pull",
            Self::SkipConflict { .. } => "skip_conflict",
            Self::Download { .. } => "download",
            Self::TrashRemote { .. } => "trash_remote",
            Self::Upload { .. } => "upload",
            Self::DeleteLocal { .. } => "delete_local",
        }
    }
}

/// Everything a run would do, computed without side effects
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncPlan {
    /// Remote files considered after filtering
    pub remote_files: usize,
    /// Local files considered after filtering
    pub local_files: usize,
    /// Remote files with no local counterpart
    pub behind: usize,
    /// Local files with no remote counterpart
    pub ahead: usize,
    /// Actions in execution order
    pub actions: Vec<SyncAction>,
    /// Items that could not be planned
    pub errors: Vec<String>,
}

impl SyncPlan {
    /// Returns true if applying the plan would not touch anything
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Listing, manifest and resolver state carried from planning into execution
struct Prepared {
    plan: SyncPlan,
    manifest: ManifestStore,
    resolver: PathResolver,
}

/// Manifest-assisted two-way synchronization engine
///
/// ## Dependencies
///
/// - `remote`: Remote drive (listing, transfers, trash)
/// - `local`: Local tree below the sync root
/// - `config`: Sync options, conflict strategy, filters and content-type overrides
pub struct SyncEngine {
    remote: Arc<dyn IRemoteStore>,
    local: Arc<dyn ILocalStore>,
    resolver: ConflictResolver,
    ignore: IgnorePolicy,
    manifest_path: PathBuf,
    sync_shared_in_drive: bool,
    allow_remote_deletion: bool,
    content_type_overrides: BTreeMap<String, String>,
}

impl SyncEngine {
    /// Creates a new `SyncEngine`
    ///
    /// # Errors
    /// Returns [`SyncError::InvalidPattern`] if a filter glob is malformed.
    /// An unknown conflict strategy is not an error here; it only disables
    /// resolution of files changed on both sides.
    pub fn new(
        remote: Arc<dyn IRemoteStore>,
        local: Arc<dyn ILocalStore>,
        config: &Config,
    ) -> Result<Self, SyncError> {
        Ok(Self {
            remote,
            local,
            resolver: ConflictResolver::from_label(&config.conflicts.update_conflict_strategy),
            ignore: IgnorePolicy::from_config(&config.filter)?,
            manifest_path: config.sync.manifest_path.clone(),
            sync_shared_in_drive: config.sync.sync_shared_in_drive,
            allow_remote_deletion: config.sync.allow_remote_deletion,
            content_type_overrides: config.remote.content_type_overrides.clone(),
        })
    }

    /// Computes what a run would do without changing anything
    ///
    /// # Errors
    /// Returns an error if either listing fails or the manifest is unreadable
    #[tracing::instrument(skip(self))]
    pub async fn plan(&self) -> Result<SyncPlan> {
        Ok(self.prepare(false).await?.plan)
    }

    /// Runs a full synchronization
    ///
    /// # Errors
    /// Returns an error if either listing fails or the manifest cannot be
    /// loaded. Failures of single items are reported in
    /// [`SyncResult::errors`].
    #[tracing::instrument(skip(self))]
    pub async fn sync(&self) -> Result<SyncResult> {
        let start = std::time::Instant::now();
        info!("Starting sync run");

        let Prepared {
            plan,
            mut manifest,
            mut resolver,
        } = self.prepare(true).await?;

        let mut result = SyncResult {
            errors: plan.errors,
            ..SyncResult::default()
        };

        for action in &plan.actions {
            match self.apply(action, &mut manifest, &mut resolver).await {
                Ok(()) => tally(&mut result, action),
                Err(err) => {
                    let msg = format!("Failed to {} '{}': {err:#}", action.kind(), action.path());
                    warn!(%msg);
                    result.errors.push(msg);
                }
            }
        }

        result.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            downloaded = result.downloaded,
            updated_local = result.updated_local,
            uploaded = result.uploaded,
            updated_remote = result.updated_remote,
            deleted_local = result.deleted_local,
            trashed_remote = result.trashed_remote,
            baselined = result.baselined,
            conflicts_skipped = result.conflicts_skipped,
            errors = result.errors.len(),
            duration_ms = result.duration_ms,
            "Sync run complete"
        );

        Ok(result)
    }

    /// Lists, filters, loads the manifest and plans
    ///
    /// With `create_manifest` a missing manifest file is created; otherwise
    /// nothing is written.
    async fn prepare(&self, create_manifest: bool) -> Result<Prepared> {
        let mut resolver = PathResolver::new(Arc::clone(&self.remote));
        let remote_files = self.list_remote(&mut resolver).await?;

        let local_files: Vec<String> = self
            .local
            .list_files()
            .await
            .context("Failed to list local files")?
            .into_iter()
            .filter(|path| !self.ignore.is_ignored(path))
            .collect();

        let manifest = if create_manifest {
            ManifestStore::load(&self.manifest_path, &self.ignore).await
        } else {
            ManifestStore::read(&self.manifest_path, &self.ignore).await
        }
        .context("Failed to load manifest")?;

        let mut plan = SyncPlan {
            remote_files: remote_files.len(),
            local_files: local_files.len(),
            ..SyncPlan::default()
        };

        let diff = Diff::compute(remote_files, local_files);
        plan.behind = diff.behind();
        plan.ahead = diff.ahead();
        info!(
            "Local folder is {} files behind and {} files ahead of remote",
            plan.behind, plan.ahead
        );

        self.plan_both(diff.both, &manifest, &mut plan).await;
        self.plan_remote_ahead(diff.remote_ahead, &manifest, &mut plan);
        self.plan_local_ahead(diff.local_ahead, &manifest, &mut plan);

        debug!(
            actions = plan.actions.len(),
            errors = plan.errors.len(),
            "Plan computed"
        );

        Ok(Prepared {
            plan,
            manifest,
            resolver,
        })
    }

    /// Pages through the remote listing and returns the user's files with
    /// resolved, unignored paths
    ///
    /// Folders are seeded into `resolver` as a side effect.
    async fn list_remote(&self, resolver: &mut PathResolver) -> Result<Vec<RemoteItem>> {
        let mut items = Vec::new();
        let mut token: Option<String> = None;
        let mut pages = 0u32;

        loop {
            let page = self
                .remote
                .list_page(ListFilter::untrashed(), token.as_deref())
                .await
                .context("Failed to list remote files")?;
            pages += 1;
            token = page.continuation().map(str::to_string);
            items.extend(page.items);
            if token.is_none() {
                break;
            }
        }
        debug!(pages, items = items.len(), "Remote listing complete");

        let mut files = Vec::new();
        for item in items {
            if !item.belongs_to_user(self.sync_shared_in_drive) {
                trace!(id = %item.id, name = %item.name, "Skipping item not owned by user");
            } else if item.is_folder() {
                resolver.cache_folder(item);
            } else if item.is_native_document() {
                trace!(id = %item.id, name = %item.name, mime = %item.mime_type, "Skipping native document");
            } else {
                files.push(item);
            }
        }
        debug!(
            folders = resolver.cached_count(),
            files = files.len(),
            "Remote items classified"
        );

        let mut resolved = Vec::with_capacity(files.len());
        for mut item in files {
            let path = resolver.resolve(&item).await;
            if self.ignore.is_ignored(&path) || is_staging_file(&path) {
                trace!(%path, "Ignoring remote file");
                continue;
            }
            item.path = Some(path);
            resolved.push(item);
        }
        Ok(resolved)
    }

    async fn plan_both(&self, both: Vec<RemoteItem>, manifest: &ManifestStore, plan: &mut SyncPlan) {
        for item in both {
            let path = item.path_or_name().to_string();

            let Some(entry) = manifest.get(&path) else {
                plan.actions.push(SyncAction::Baseline { item });
                continue;
            };

            let times = match self.version_times(&item, entry.local_modified, entry.remote_modified).await {
                Ok(times) => times,
                Err(err) => {
                    let msg = format!("Cannot compare '{path}': {err:#}");
                    warn!(%msg);
                    plan.errors.push(msg);
                    continue;
                }
            };

            match self.resolver.decide(&times) {
                Decision::Unchanged => {}
                Decision::Push => plan.actions.push(SyncAction::Push { item }),
                Decision::Pull => plan.actions.push(SyncAction::Pull { item }),
                Decision::Ignored => plan.actions.push(SyncAction::SkipConflict {
                    item,
                    misconfigured: false,
                }),
                Decision::Unresolved => plan.actions.push(SyncAction::SkipConflict {
                    item,
                    misconfigured: true,
                }),
            }
        }
    }

    async fn version_times(
        &self,
        item: &RemoteItem,
        stored_local: Timestamp,
        stored_remote: Timestamp,
    ) -> Result<VersionTimes> {
        Ok(VersionTimes {
            latest_local: self.local.modified(item.path_or_name()).await?,
            latest_remote: remote_modified(item)?,
            stored_local,
            stored_remote,
        })
    }

    fn plan_remote_ahead(&self, items: Vec<RemoteItem>, manifest: &ManifestStore, plan: &mut SyncPlan) {
        for item in items {
            if !manifest.contains(item.path_or_name()) {
                plan.actions.push(SyncAction::Download { item });
            } else if self.allow_remote_deletion {
                plan.actions.push(SyncAction::TrashRemote { item });
            } else {
                debug!(path = item.path_or_name(), "Deleted locally, remote deletion disabled");
            }
        }
    }

    fn plan_local_ahead(&self, paths: Vec<String>, manifest: &ManifestStore, plan: &mut SyncPlan) {
        for path in paths {
            if manifest.contains(&path) {
                plan.actions.push(SyncAction::DeleteLocal { path });
            } else {
                plan.actions.push(SyncAction::Upload { path });
            }
        }
    }

    async fn apply(
        &self,
        action: &SyncAction,
        manifest: &mut ManifestStore,
        resolver: &mut PathResolver,
    ) -> Result<()> {
        match action {
            SyncAction::Baseline { item } => {
                let path = item.path_or_name();
                let remote = remote_modified(item)?;
                let local = self.local.modified(path).await?;
                debug!(path, "Recording baseline");
                manifest.record(path, local, remote).await?;
            }
            SyncAction::Push { item } => {
                let path = item.path_or_name();
                info!(path, id = %item.id, "Uploading changed file");
                let source = self.local.absolute(path)?;
                let updated = self
                    .remote
                    .update_file(&item.id, &source, self.content_type_for(&item.mime_type))
                    .await?;
                let remote = remote_modified(&updated).or_else(|_| remote_modified(item))?;
                let local = self.local.modified(path).await?;
                manifest.record(path, local, remote).await?;
            }
            SyncAction::Pull { item } | SyncAction::Download { item } => {
                let path = item.path_or_name();
                let remote = remote_modified(item)?;
                info!(path, id = %item.id, "Downloading file");
                let destination = self.local.absolute(path)?;
                if let Some((dir, _)) = path.rsplit_once('/') {
                    self.local.ensure_directory(dir).await?;
                }
                self.remote.download(&item.id, &destination).await?;
                let local = self.local.modified(path).await?;
                manifest.record(path, local, remote).await?;
            }
            SyncAction::SkipConflict { item, misconfigured } => {
                if *misconfigured {
                    warn!(
                        path = item.path_or_name(),
                        "Changed on both sides, no valid conflict strategy configured"
                    );
                } else {
                    info!(path = item.path_or_name(), "Changed on both sides, ignoring");
                }
            }
            SyncAction::TrashRemote { item } => {
                let path = item.path_or_name();
                info!(path, id = %item.id, "Trashing remote file deleted locally");
                self.remote.trash(&item.id).await?;
                manifest.forget(path).await?;
            }
            SyncAction::Upload { path } => {
                info!(%path, "Uploading new file");
                let source = self.local.absolute(path)?;
                let (parent, name) = match path.rsplit_once('/') {
                    Some((dir, name)) => (Some(resolver.resolve_or_create(dir).await?.id), name),
                    None => (None, path.as_str()),
                };
                let created = self
                    .remote
                    .create_file(name, parent.as_ref(), &source)
                    .await?;
                let remote = remote_modified(&created)?;
                let local = self.local.modified(path).await?;
                manifest.record(path, local, remote).await?;
            }
            SyncAction::DeleteLocal { path } => {
                info!(%path, "Deleting local file removed remotely");
                self.local.remove(path).await?;
                manifest.forget(path).await?;
            }
        }
        Ok(())
    }

    /// Content type sent when updating a file of type `mime`
    fn content_type_for<'a>(&'a self, mime: &'a str) -> &'a str {
        self.content_type_overrides
            .get(mime)
            .map(String::as_str)
            .unwrap_or(mime)
    }
}

fn remote_modified(item: &RemoteItem) -> Result<Timestamp> {
    item.effective_modified()
        .with_context(|| format!("remote item {} has no modification time", item.id))
}

fn tally(result: &mut SyncResult, action: &SyncAction) {
    match action {
        SyncAction::Baseline { .. } => result.baselined += 1,
        SyncAction::Push { .. } => result.updated_remote += 1,
        SyncAction::Pull { .. } => result.updated_local += 1,
        SyncAction::SkipConflict { .. } => result.conflicts_skipped += 1,
        SyncAction::Download { .. } => result.downloaded += 1,
        SyncAction::TrashRemote { .. } => result.trashed_remote += 1,
        SyncAction::Upload { .. } => result.uploaded += 1,
        SyncAction::DeleteLocal { .. } => result.deleted_local += 1,
    }
}

#[cfg(test)]
mod tests {
    use drivesync_core::domain::RemoteId;

    use super::*;

    fn item(path: &str) -> RemoteItem {
        RemoteItem {
            id: RemoteId::new("f1".into()).unwrap(),
            name: path.rsplit('/').next().unwrap_or(path).into(),
            parents: vec![],
            mime_type: "text/plain".into(),
            owned_by_me: true,
            shared_with_me: false,
            modified: None,
            created: None,
            path: Some(path.into()),
        }
    }

    #[test]
    fn test_action_path_and_kind() {
        let push = SyncAction::Push {
            item: item("docs/a.txt"),
        };
        assert_eq!(push.path(), "docs/a.txt");
        assert_eq!(push.kind(), "push");

        let upload = SyncAction::Upload {
            path: "b.txt".into(),
        };
        assert_eq!(upload.path(), "b.txt");
        assert_eq!(upload.kind(), "upload");
    }

    #[test]
    fn test_action_serializes_with_tag() {
        let action = SyncAction::DeleteLocal {
            path: "old.txt".into(),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["action"], "delete_local");
        assert_eq!(json["path"], "old.txt");
    }

    #[test]
    fn test_tally_counts_each_kind() {
        let mut result = SyncResult::default();
        tally(&mut result, &SyncAction::Download { item: item("a") });
        tally(&mut result, &SyncAction::Pull { item: item("b") });
        tally(&mut result, &SyncAction::Upload { path: "c".into() });
        tally(&mut result, &SyncAction::SkipConflict { item: item("d"), misconfigured: false });
        assert_eq!(result.downloaded, 1);
        assert_eq!(result.updated_local, 1);
        assert_eq!(result.uploaded, 1);
        assert_eq!(result.conflicts_skipped, 1);
        assert_eq!(result.transfers(), 3);
    }

    #[test]
    fn test_missing_remote_time_is_an_error() {
        assert!(remote_modified(&item("a")).is_err());
    }

    #[test]
    fn test_sync_result_default() {
        let result = SyncResult::default();
        assert_eq!(result.transfers(), 0);
        assert!(result.errors.is_empty());
        assert_eq!(result.duration_ms, 0);
    }
}
