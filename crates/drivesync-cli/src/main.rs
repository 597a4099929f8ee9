//! DriveSync CLI - Command-line interface for DriveSync
//!
//! Provides commands for:
//! - Synchronizing the local folder with Google Drive (`sync`)
//! - Removing the local mirror and all sync state (`reset`)
//! - Viewing and editing the configuration (`config`)

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    completions::CompletionsCommand, config::ConfigCommand, reset::ResetCommand,
    sync::SyncCommand, Context,
};
use drivesync_core::config::Config;
use output::{get_formatter, OutputFormat};

#[derive(Debug, Parser)]
#[command(name = "drivesync", version, about = "Two-way Google Drive folder sync")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Synchronize the local folder with Google Drive
    Sync(SyncCommand),
    /// Delete the local folder, the manifest and the stored token
    Reset(ResetCommand),
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Generate shell completions
    Completions(CompletionsCommand),
}

/// Picks the log filter: `RUST_LOG` wins, then `-v`, then the configured level
fn log_filter(verbose: u8, quiet: bool, configured: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let level = match verbose {
        0 if quiet => "warn",
        0 => configured,
        1 => "debug",
        _ => "trace",
    };
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let configured_level = Config::load_or_default(&config_path).logging.level;

    // Logs go to stderr so that --json output on stdout stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.verbose, cli.quiet, &configured_level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    let ctx = Context {
        format,
        quiet: cli.quiet,
        config_path,
    };

    let outcome = match &cli.command {
        Commands::Sync(cmd) => cmd.execute(&ctx).await,
        Commands::Reset(cmd) => cmd.execute(&ctx).await,
        Commands::Config(cmd) => cmd.execute(&ctx).await,
        Commands::Completions(cmd) => cmd.execute(&ctx).await,
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            get_formatter(format, cli.quiet).error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
