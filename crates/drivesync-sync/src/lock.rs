//! Single-instance lock
//!
//! A run holds a per-user lock file containing its PID for its whole
//! duration. The PID is written to a private temporary file first and
//! hard-linked into place, so the lock never exists without its content.
//! A lock whose PID no longer names a live process is stale and is taken
//! over. The file is removed when the [`SyncLock`] guard drops.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};

use crate::SyncError;

/// Acquisition attempts before giving up on a lock that keeps reappearing
const MAX_ATTEMPTS: u32 = 3;

/// Age after which a lock without a readable PID counts as abandoned
const UNREADABLE_GRACE: Duration = Duration::from_secs(30);

/// RAII guard for the lock file
#[derive(Debug)]
pub struct SyncLock {
    path: PathBuf,
}

/// What an existing lock file says about its holder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Holder {
    Live(i32),
    Stale,
    Unknown,
}

impl SyncLock {
    /// Per-user lock location in the system temp directory
    pub fn default_path() -> PathBuf {
        // SAFETY: getuid has no preconditions and cannot fail.
        let uid = unsafe { libc::getuid() };
        std::env::temp_dir().join(format!("drivesync-{uid}.lock"))
    }

    /// Takes the lock at `path`
    ///
    /// # Errors
    /// [`SyncError::AlreadyRunning`] if a live process holds it,
    /// [`SyncError::LockUnreadable`] if a fresh lock has no readable PID, or
    /// an I/O error if the file cannot be created
    pub fn acquire(path: &Path) -> Result<Self, SyncError> {
        let own_pid = std::process::id() as i32;

        for _ in 0..MAX_ATTEMPTS {
            match publish(path, own_pid) {
                Ok(()) => {
                    debug!(path = %path.display(), pid = own_pid, "Lock acquired");
                    return Ok(Self {
                        path: path.to_path_buf(),
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => match inspect(path, own_pid) {
                    Holder::Live(pid) => {
                        return Err(SyncError::AlreadyRunning {
                            pid,
                            path: path.to_path_buf(),
                        });
                    }
                    Holder::Unknown => {
                        return Err(SyncError::LockUnreadable(path.to_path_buf()));
                    }
                    Holder::Stale => {
                        warn!(path = %path.display(), "Removing stale lock");
                        match std::fs::remove_file(path) {
                            Ok(()) => {}
                            Err(e) if e.kind() == ErrorKind::NotFound => {}
                            Err(e) => return Err(e.into()),
                        }
                    }
                },
                Err(e) => return Err(e.into()),
            }
        }

        Err(SyncError::IoError(std::io::Error::new(
            ErrorKind::WouldBlock,
            format!("could not acquire lock {}", path.display()),
        )))
    }

    /// Location of the held lock file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SyncLock {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Lock released"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove lock file"),
        }
    }
}

/// Creates `path` holding `pid` in one step
///
/// Fails with [`ErrorKind::AlreadyExists`] if the lock is held.
fn publish(path: &Path, pid: i32) -> std::io::Result<()> {
    let staging = {
        let mut p = path.as_os_str().to_owned();
        p.push(format!(".{pid}.tmp"));
        PathBuf::from(p)
    };

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&staging)?;
    let linked = write!(file, "{pid}")
        .and_then(|()| file.sync_all())
        .and_then(|()| std::fs::hard_link(&staging, path));
    if let Err(e) = std::fs::remove_file(&staging) {
        debug!(path = %staging.display(), error = %e, "Failed to remove staging lock file");
    }
    linked
}

fn inspect(path: &Path, own_pid: i32) -> Holder {
    match read_pid(path) {
        Some(pid) if pid != own_pid && process_alive(pid) => Holder::Live(pid),
        Some(_) => Holder::Stale,
        None if older_than(path, UNREADABLE_GRACE) => Holder::Stale,
        None => Holder::Unknown,
    }
}

fn read_pid(path: &Path) -> Option<i32> {
    std::fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// True if `path` was last modified more than `age` ago
///
/// A file that vanished counts as old.
fn older_than(path: &Path, age: Duration) -> bool {
    let modified = match std::fs::metadata(path).and_then(|m| m.modified()) {
        Ok(modified) => modified,
        Err(_) => return true,
    };
    SystemTime::now()
        .duration_since(modified)
        .map(|elapsed| elapsed > age)
        .unwrap_or(false)
}

/// Returns true if a process with `pid` exists
fn process_alive(pid: i32) -> bool {
    if pid <= 0 {
        return false;
    }
    // SAFETY: signal 0 performs only the existence and permission check.
    let rc = unsafe { libc::kill(pid, 0) };
    rc == 0 || std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}
