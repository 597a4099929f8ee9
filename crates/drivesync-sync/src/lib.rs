//! DriveSync Sync - Manifest-assisted two-way synchronization
//!
//! Provides:
//! - Three-way diff between the remote listing, the local listing and the manifest
//! - Remote path resolution with on-demand folder creation
//! - Conflict-aware update decisions
//! - Single-instance locking and guarded bulk deletion
//!
//! ## Modules
//!
//! - [`engine`] - Sync orchestrator: listing, planning and applying actions
//! - [`diff`] - Partition of remote and local listings
//! - [`path_resolver`] - Parent-chain walking over a folder cache
//! - [`manifest`] - Write-through JSON manifest of last-synced timestamps
//! - [`ignore`] - Blacklist / whitelist glob filtering
//! - [`lock`] - Per-user PID lock file with stale detection
//! - [`reset`] - Safe removal of the local mirror and its state
//! - [`filesystem`] - Local filesystem adapter

pub mod diff;
pub mod engine;
pub mod filesystem;
pub mod ignore;
pub mod lock;
pub mod manifest;
pub mod path_resolver;
pub mod reset;

use std::path::PathBuf;

use thiserror::Error;

pub use engine::{SyncAction, SyncEngine, SyncPlan, SyncResult};

/// Errors that can occur during synchronization operations
#[derive(Debug, Error)]
pub enum SyncError {
    /// An I/O error occurred during file operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// The manifest file exists but is not a valid manifest document
    #[error("Corrupt manifest {path}: {reason}")]
    CorruptManifest { path: PathBuf, reason: String },

    /// Another sync run holds the lock
    #[error("Another sync is already running (pid {pid}, lock {path})")]
    AlreadyRunning { pid: i32, path: PathBuf },

    /// A lock file was just created by another run and has no PID yet
    #[error("Lock {0} is held by a run that is still starting")]
    LockUnreadable(PathBuf),

    /// A glob pattern in the filter configuration is malformed
    #[error("Invalid ignore pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Refused to delete a path that looks like a root or home directory
    #[error("Refusing to delete unsafe path: {0}")]
    UnsafePath(PathBuf),

    /// A domain-level error propagated from drivesync-core
    #[error("Domain error: {0}")]
    DomainError(#[from] drivesync_core::domain::errors::DomainError),
}
