//! Reset command - Remove the local mirror and all sync state
//!
//! Deletes the sync root, the manifest and the token file. Paths that look
//! like `/` or the home directory are refused before anything is deleted.

use std::io::{BufRead, Write};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use clap::Args;
use tracing::info;

use drivesync_sync::lock::SyncLock;
use drivesync_sync::reset::reset;

use super::{home_dir, Context};

#[derive(Debug, Args)]
pub struct ResetCommand {
    /// Do not ask for confirmation
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl ResetCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<ExitCode> {
        let formatter = ctx.formatter();

        // A running sync would recreate what is being deleted.
        let _lock = SyncLock::acquire(&SyncLock::default_path())?;

        let config = ctx.load_config(false)?;
        let home = home_dir()?;
        let root = &config.sync.root;
        let state_files = vec![
            config.sync.manifest_path.clone(),
            config.remote.token_file.clone(),
        ];

        if !self.yes && !confirm(root)? {
            formatter.info("Reset cancelled");
            return Ok(ExitCode::SUCCESS);
        }

        info!(root = %root.display(), "Resetting");
        let report = reset(root, &state_files, &home).await?;

        if ctx.is_json() {
            let json = serde_json::to_value(&report).context("Failed to serialize report")?;
            formatter.print_json(&json);
        } else {
            formatter.success("Reset complete");
            for path in &report.removed {
                formatter.info(&format!("Removed {}", path.display()));
            }
        }
        Ok(ExitCode::SUCCESS)
    }
}

/// Asks on the terminal before deleting `root`
fn confirm(root: &Path) -> Result<bool> {
    eprint!(
        "This deletes {} and all sync state, including the stored token. Continue? [y/N] ",
        root.display()
    );
    std::io::stderr().flush()?;

    let mut answer = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("no"));
        assert!(!is_yes("yep"));
    }
}
