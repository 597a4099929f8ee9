//! Sync command - Synchronize the local folder with Google Drive
//!
//! Provides the `drivesync sync` CLI command which:
//! 1. Takes the single-instance lock
//! 2. Loads (or bootstraps) the configuration and the access token
//! 3. Creates the Drive and filesystem adapters
//! 4. Runs the SyncEngine, or only plans with `--dry-run`, and displays results
//!
//! SIGINT and SIGTERM stop the run between requests; the lock is released
//! and the process exits with status 130.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use drivesync_core::config::Config;
use drivesync_drive::DriveRemoteStore;
use drivesync_sync::filesystem::LocalFileSystemAdapter;
use drivesync_sync::lock::SyncLock;
use drivesync_sync::{SyncEngine, SyncPlan, SyncResult};

use super::{access_token, Context};
use crate::output::{format_duration_ms, plural, OutputFormatter};

/// Exit status after SIGINT/SIGTERM
const INTERRUPTED: u8 = 130;

#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Show what would be done without making changes
    #[arg(long)]
    pub dry_run: bool,
}

impl SyncCommand {
    /// Wires up the adapters, runs the engine and displays the outcome
    pub async fn execute(&self, ctx: &Context) -> Result<ExitCode> {
        let formatter = ctx.formatter();

        let lock_path = SyncLock::default_path();
        let _lock = SyncLock::acquire(&lock_path)?;

        let config = ctx.load_config(true)?;
        info!(config_path = %ctx.config_path.display(), root = %config.sync.root.display(), "Loaded configuration");
        check_config(&config)?;

        let token = access_token(&config.remote.token_file)?;
        let remote = DriveRemoteStore::from_config(token, &config.remote)?;
        let local = LocalFileSystemAdapter::new(&config.sync.root, config.sync.follow_symlinks);
        let engine = SyncEngine::new(Arc::new(remote), Arc::new(local), &config)
            .context("Invalid filter configuration")?;

        let shutdown = CancellationToken::new();
        tokio::spawn(shutdown_signal(shutdown.clone()));

        if self.dry_run {
            let plan = tokio::select! {
                plan = engine.plan() => plan?,
                _ = shutdown.cancelled() => return Ok(interrupted(&*formatter)),
            };
            print_plan(ctx, &*formatter, &plan)?;
        } else {
            formatter.info("Starting synchronization...");
            let result = tokio::select! {
                result = engine.sync() => result?,
                _ = shutdown.cancelled() => return Ok(interrupted(&*formatter)),
            };
            print_result(ctx, &*formatter, &result)?;
        }

        Ok(ExitCode::SUCCESS)
    }
}

/// Rejects configuration problems that make a run meaningless
///
/// An unknown conflict strategy is only reported: the run proceeds and
/// leaves files changed on both sides alone.
fn check_config(config: &Config) -> Result<()> {
    let mut fatal = Vec::new();
    for e in config.validate() {
        if e.field == "conflicts.update_conflict_strategy" {
            error!(%e, "Conflicting updates will not be resolved");
        } else {
            fatal.push(e.to_string());
        }
    }
    if !fatal.is_empty() {
        anyhow::bail!("Invalid configuration: {}", fatal.join("; "));
    }
    Ok(())
}

fn interrupted(formatter: &dyn OutputFormatter) -> ExitCode {
    formatter.warn("Interrupted, stopping");
    ExitCode::from(INTERRUPTED)
}

/// Cancels `token` on SIGINT or SIGTERM
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

fn print_plan(ctx: &Context, formatter: &dyn OutputFormatter, plan: &SyncPlan) -> Result<()> {
    if ctx.is_json() {
        let json = serde_json::to_value(plan).context("Failed to serialize plan")?;
        formatter.print_json(&json);
        return Ok(());
    }

    formatter.info(&format!(
        "Local folder is {} behind and {} ahead of remote",
        plural(plan.behind as u64, "file"),
        plural(plan.ahead as u64, "file")
    ));
    if plan.is_empty() {
        formatter.success("Dry run: already up to date");
    } else {
        formatter.success(&format!(
            "Dry run: {} planned (no changes made)",
            plural(plan.actions.len() as u64, "action")
        ));
        for action in &plan.actions {
            formatter.info(&format!("{:<14} {}", action.kind(), action.path()));
        }
    }
    for err in &plan.errors {
        formatter.warn(err);
    }
    Ok(())
}

fn print_result(ctx: &Context, formatter: &dyn OutputFormatter, result: &SyncResult) -> Result<()> {
    if ctx.is_json() {
        let json = serde_json::to_value(result).context("Failed to serialize result")?;
        formatter.print_json(&json);
        return Ok(());
    }

    let duration = format_duration_ms(result.duration_ms);
    if result.transfers() == 0 && result.errors.is_empty() {
        formatter.success("Already up to date");
    } else {
        formatter.success(&format!("Sync completed in {duration}"));
    }

    for (label, count) in [
        ("Downloaded:       ", result.downloaded),
        ("Updated locally:  ", result.updated_local),
        ("Uploaded:         ", result.uploaded),
        ("Updated remotely: ", result.updated_remote),
        ("Deleted locally:  ", result.deleted_local),
        ("Trashed remotely: ", result.trashed_remote),
        ("Baselined:        ", result.baselined),
    ] {
        if count > 0 {
            formatter.info(&format!("{label}{}", plural(count, "file")));
        }
    }
    if result.conflicts_skipped > 0 {
        formatter.warn(&format!(
            "{} changed on both sides left untouched",
            plural(result.conflicts_skipped, "file")
        ));
    }

    if !result.errors.is_empty() {
        formatter.error(&format!(
            "{} occurred:",
            plural(result.errors.len() as u64, "error")
        ));
        for err in &result.errors {
            formatter.info(&format!("  - {}", err));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use drivesync_core::config::ConfigBuilder;

    use super::*;

    #[test]
    fn test_unknown_strategy_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigBuilder::new()
            .sync_root(dir.path().join("Drive"))
            .update_conflict_strategy("newest_wins")
            .build();
        assert!(check_config(&config).is_ok());
    }

    #[test]
    fn test_invalid_remote_settings_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigBuilder::new()
            .sync_root(dir.path().join("Drive"))
            .remote_timeout_secs(0)
            .build();
        let err = check_config(&config).unwrap_err();
        assert!(err.to_string().contains("remote.timeout_secs"));
    }
}
