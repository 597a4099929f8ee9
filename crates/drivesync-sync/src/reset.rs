//! Reset: remove the local mirror and all sync state
//!
//! Bulk deletion refuses paths that look like a filesystem root or the
//! user's home directory, so a misconfigured root can never wipe either.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::SyncError;

/// Returns true if `path` may be deleted recursively
///
/// Empty paths, `/`, the home directory and any of its ancestors are unsafe.
/// Both paths are compared as written with `.` and `..` folded away, and by
/// their real location when they exist, so neither `~/Drive/..` nor a
/// symlink to home gets through.
pub fn safe_to_delete(path: &Path, home: &Path) -> bool {
    let raw = path.to_string_lossy();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return false;
    }

    let homes = resolved_forms(home);
    resolved_forms(Path::new(trimmed)).iter().all(|candidate| {
        candidate.parent().is_some() && !homes.iter().any(|h| h.starts_with(candidate))
    })
}

/// Lexically normalised form of `path`, plus its canonical form if it exists
fn resolved_forms(path: &Path) -> Vec<PathBuf> {
    let mut forms = vec![normalize(path)];
    if let Ok(real) = std::fs::canonicalize(path) {
        forms.push(real);
    }
    forms
}

/// Folds `.` and `..` without touching the filesystem
///
/// `..` never climbs above the start of the path, so `a/../..` is empty.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// What a reset removed
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResetReport {
    /// Paths that existed and were deleted
    pub removed: Vec<PathBuf>,
    /// Paths that were already absent
    pub missing: Vec<PathBuf>,
}

/// Deletes the local root directory and the given state files
///
/// Every target is checked before anything is deleted; one unsafe target
/// aborts the whole reset.
///
/// # Errors
/// [`SyncError::UnsafePath`] for the first unsafe target, or the first I/O
/// failure other than "not found"
#[instrument(skip(state_files), fields(root = %root.display()))]
pub async fn reset(
    root: &Path,
    state_files: &[PathBuf],
    home: &Path,
) -> Result<ResetReport, SyncError> {
    for target in std::iter::once(root).chain(state_files.iter().map(PathBuf::as_path)) {
        if !safe_to_delete(target, home) {
            warn!(path = %target.display(), "Refusing reset of unsafe path");
            return Err(SyncError::UnsafePath(target.to_path_buf()));
        }
    }

    let mut report = ResetReport::default();

    match tokio::fs::remove_dir_all(root).await {
        Ok(()) => report.removed.push(root.to_path_buf()),
        Err(e) if e.kind() == ErrorKind::NotFound => report.missing.push(root.to_path_buf()),
        Err(e) => return Err(e.into()),
    }

    for file in state_files {
        match tokio::fs::remove_file(file).await {
            Ok(()) => report.removed.push(file.clone()),
            Err(e) if e.kind() == ErrorKind::NotFound => report.missing.push(file.clone()),
            Err(e) => return Err(e.into()),
        }
    }

    info!(
        removed = report.removed.len(),
        missing = report.missing.len(),
        "Reset complete"
    );
    Ok(report)
}
