//! Ignore policy
//!
//! Decides which relative paths take part in the sync. The same policy is
//! applied to the remote listing, the local listing and the manifest.
//!
//! Patterns use shell glob syntax where `*` also matches `/`, so `docs/*`
//! covers everything below `docs` at any depth.

use glob::Pattern;
use tracing::trace;

use drivesync_core::config::{FilterConfig, InclusionMode};

use crate::SyncError;

/// Compiled blacklist / whitelist
#[derive(Debug, Clone)]
pub struct IgnorePolicy {
    mode: InclusionMode,
    blacklist: Vec<Pattern>,
    exceptions: Vec<Pattern>,
    whitelist: Vec<Pattern>,
}

impl IgnorePolicy {
    /// Compiles the filter section of the configuration
    ///
    /// # Errors
    /// Returns [`SyncError::InvalidPattern`] for the first malformed glob
    pub fn from_config(filter: &FilterConfig) -> Result<Self, SyncError> {
        Ok(Self {
            mode: filter.inclusion,
            blacklist: compile(&filter.blacklist)?,
            exceptions: compile(&filter.exceptions)?,
            whitelist: compile(&filter.whitelist)?,
        })
    }

    /// A policy that ignores nothing
    pub fn none() -> Self {
        Self {
            mode: InclusionMode::Blacklist,
            blacklist: Vec::new(),
            exceptions: Vec::new(),
            whitelist: Vec::new(),
        }
    }

    /// Returns true if `path` must be left out of the sync
    pub fn is_ignored(&self, path: &str) -> bool {
        let ignored = match self.mode {
            InclusionMode::Whitelist => !matches_any(&self.whitelist, path),
            InclusionMode::Blacklist => {
                matches_any(&self.blacklist, path) && !matches_any(&self.exceptions, path)
            }
        };
        if ignored {
            trace!(path, "Ignored by filter");
        }
        ignored
    }
}

impl Default for IgnorePolicy {
    fn default() -> Self {
        Self::none()
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>, SyncError> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| SyncError::InvalidPattern {
                pattern: p.clone(),
                reason: e.to_string(),
            })
        })
        .collect()
}

fn matches_any(patterns: &[Pattern], path: &str) -> bool {
    patterns.iter().any(|p| p.matches(path))
}
