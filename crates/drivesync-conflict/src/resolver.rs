//! Update decisions for files present on both sides
//!
//! Given the current local and remote modification times and the ones stored
//! in the manifest at the last sync, decide whether to push, pull or do
//! nothing. Only the "both changed" case consults the strategy.

use tracing::{error, trace};

use drivesync_core::domain::{is_after, Timestamp};

use crate::error::ConflictError;
use crate::strategy::ConflictStrategy;

/// The four timestamps a decision is made from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionTimes {
    pub latest_local: Timestamp,
    pub latest_remote: Timestamp,
    pub stored_local: Timestamp,
    pub stored_remote: Timestamp,
}

impl VersionTimes {
    pub fn local_changed(&self) -> bool {
        is_after(&self.latest_local, &self.stored_local)
    }

    pub fn remote_changed(&self) -> bool {
        is_after(&self.latest_remote, &self.stored_remote)
    }
}

/// Action chosen for a file present on both sides
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Neither side changed
    Unchanged,
    /// Upload the local copy
    Push,
    /// Download the remote copy
    Pull,
    /// Both sides changed and the strategy says to leave them
    Ignored,
    /// Both sides changed but no valid strategy is configured
    Unresolved,
}

/// Decides between push and pull using the configured strategy
#[derive(Debug, Clone)]
pub struct ConflictResolver {
    strategy: Result<ConflictStrategy, ConflictError>,
}

impl ConflictResolver {
    pub fn new(strategy: ConflictStrategy) -> Self {
        Self {
            strategy: Ok(strategy),
        }
    }

    /// Creates a resolver from a configuration label
    ///
    /// An unknown label is kept as an error: every decision that needs the
    /// strategy becomes [`Decision::Unresolved`], all others work normally.
    pub fn from_label(label: &str) -> Self {
        let strategy = label.parse::<ConflictStrategy>();
        if let Err(e) = &strategy {
            error!(error = %e, "Conflicting updates will be skipped");
        }
        Self { strategy }
    }

    /// The configured strategy, or the parse error
    pub fn strategy(&self) -> Result<ConflictStrategy, &ConflictError> {
        self.strategy.as_ref().copied()
    }

    /// Decide what to do with one file
    pub fn decide(&self, times: &VersionTimes) -> Decision {
        let decision = match (times.local_changed(), times.remote_changed()) {
            (true, true) => self.resolve_both_changed(times),
            (true, false) => Decision::Push,
            (false, true) => Decision::Pull,
            (false, false) => Decision::Unchanged,
        };
        trace!(?times, ?decision, "Update decision");
        decision
    }

    fn resolve_both_changed(&self, times: &VersionTimes) -> Decision {
        match &self.strategy {
            Ok(ConflictStrategy::Ignore) => Decision::Ignored,
            Ok(ConflictStrategy::KeepLocal) => Decision::Push,
            Ok(ConflictStrategy::KeepRemote) => Decision::Pull,
            Ok(ConflictStrategy::KeepLatest) => {
                if times.latest_local > times.latest_remote {
                    Decision::Push
                } else {
                    Decision::Pull
                }
            }
            Err(_) => Decision::Unresolved,
        }
    }
}
