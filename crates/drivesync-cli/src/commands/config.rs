//! Config command - View and manage DriveSync configuration
//!
//! Provides the `drivesync config` CLI command which:
//! 1. Shows the current configuration (YAML or JSON)
//! 2. Sets individual configuration values via dot-notation keys
//! 3. Validates the configuration file and reports errors
//! 4. Prints the configuration file location
//! 5. Writes a default configuration file

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use clap::Subcommand;
use tracing::info;

use drivesync_core::config::{Config, InclusionMode};

use super::Context;

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "conflicts.update_conflict_strategy")
        key: String,
        /// New value
        value: String,
    },
    /// Validate configuration file
    Validate,
    /// Print the configuration file location
    Path,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Keys accepted by `config set`, with a short description
const SUPPORTED_KEYS: &[(&str, &str)] = &[
    ("sync.root", "Local sync folder"),
    ("sync.manifest_path", "Manifest file location"),
    ("sync.follow_symlinks", "true|false"),
    ("sync.sync_shared_in_drive", "true|false"),
    ("sync.allow_remote_deletion", "true|false"),
    ("conflicts.update_conflict_strategy", "ignore|keep_local|keep_remote|keep_latest"),
    ("filter.inclusion", "blacklist|whitelist"),
    ("filter.blacklist", "Comma-separated glob patterns"),
    ("filter.exceptions", "Comma-separated glob patterns"),
    ("filter.whitelist", "Comma-separated glob patterns"),
    ("remote.base_url", "API host"),
    ("remote.token_file", "Access token file"),
    ("remote.timeout_secs", "Request timeout in seconds"),
    ("remote.retries", "Retries of transient failures"),
    ("remote.page_size", "Listing page size (1-1000)"),
    ("remote.content_type_overrides.<mime>", "Upload content type; empty removes"),
    ("logging.level", "trace|debug|info|warn|error"),
];

impl ConfigCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<ExitCode> {
        let ok = match self {
            ConfigCommand::Show => execute_show(ctx)?,
            ConfigCommand::Set { key, value } => execute_set(ctx, key, value)?,
            ConfigCommand::Validate => execute_validate(ctx)?,
            ConfigCommand::Path => execute_path(ctx)?,
            ConfigCommand::Init { force } => execute_init(ctx, *force)?,
        };
        Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
    }
}

fn execute_show(ctx: &Context) -> Result<bool> {
    let formatter = ctx.formatter();
    let config = ctx.load_config(false)?;

    info!(config_path = %ctx.config_path.display(), "Showing configuration");

    if ctx.is_json() {
        let json =
            serde_json::to_value(&config).context("Failed to serialize configuration to JSON")?;
        formatter.print_json(&json);
    } else {
        formatter.success(&format!("Configuration ({})", ctx.config_path.display()));
        formatter.info("");
        for line in config.to_yaml()?.lines() {
            formatter.info(line);
        }
    }
    Ok(true)
}

fn execute_set(ctx: &Context, key: &str, value: &str) -> Result<bool> {
    let formatter = ctx.formatter();
    let path = &ctx.config_path;

    // Edit the file as written; `~` stays unexpanded.
    let mut config = if path.exists() {
        Config::load(path)
            .with_context(|| format!("Failed to read configuration {}", path.display()))?
    } else {
        Config::default()
    };

    info!(key = %key, value = %value, "Setting configuration value");

    if let Err(e) = apply_config_value(&mut config, key, value) {
        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": false,
                "key": key,
                "value": value,
                "error": e.to_string(),
            }));
        } else {
            formatter.error(&format!("Failed to set '{}': {}", key, e));
            formatter.info("");
            formatter.info("Supported keys:");
            for (name, help) in SUPPORTED_KEYS {
                formatter.info(&format!("  {name:<40} - {help}"));
            }
        }
        return Ok(false);
    }

    // The root may legitimately not exist yet.
    let errors: Vec<String> = config
        .validate()
        .into_iter()
        .filter(|e| e.field != "sync.root")
        .map(|e| e.to_string())
        .collect();
    if !errors.is_empty() {
        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": false,
                "key": key,
                "value": value,
                "errors": errors,
            }));
        } else {
            formatter.error(&format!("Invalid value for '{}': {}", key, errors.join("; ")));
        }
        return Ok(false);
    }

    config.save(path).context("Failed to write configuration file")?;

    if ctx.is_json() {
        formatter.print_json(&serde_json::json!({
            "success": true,
            "key": key,
            "value": value,
            "config_path": path.display().to_string(),
        }));
    } else {
        formatter.success(&format!("Set {} = {}", key, value));
        formatter.info(&format!("Saved to {}", path.display()));
    }
    Ok(true)
}

fn execute_validate(ctx: &Context) -> Result<bool> {
    let formatter = ctx.formatter();
    let path = &ctx.config_path;

    if !path.exists() {
        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "valid": false,
                "config_path": path.display().to_string(),
                "errors": ["Configuration file not found. Using defaults."],
            }));
        } else {
            formatter.info(&format!("Configuration file not found at {}", path.display()));
            formatter.info("Using default configuration. Run 'drivesync config init' to create one.");
        }
        return Ok(true);
    }

    let config = match ctx.load_config(false) {
        Ok(config) => config,
        Err(e) => {
            if ctx.is_json() {
                formatter.print_json(&serde_json::json!({
                    "valid": false,
                    "config_path": path.display().to_string(),
                    "errors": [format!("{e:#}")],
                }));
            } else {
                formatter.error(&format!("{e:#}"));
            }
            return Ok(false);
        }
    };

    info!(config_path = %path.display(), "Validating configuration");
    let errors = config.validate();

    if ctx.is_json() {
        let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        formatter.print_json(&serde_json::json!({
            "valid": errors.is_empty(),
            "config_path": path.display().to_string(),
            "errors": error_strings,
        }));
    } else if errors.is_empty() {
        formatter.success("Configuration is valid");
        formatter.info(&format!("File: {}", path.display()));
    } else {
        formatter.error(&format!(
            "Configuration has {} error{}:",
            errors.len(),
            if errors.len() == 1 { "" } else { "s" }
        ));
        formatter.info(&format!("File: {}", path.display()));
        formatter.info("");
        for error in &errors {
            formatter.info(&format!("  {} - {}", error.field, error.message));
        }
    }

    Ok(errors.is_empty())
}

fn execute_path(ctx: &Context) -> Result<bool> {
    if ctx.is_json() {
        ctx.formatter().print_json(&serde_json::json!({
            "config_path": ctx.config_path.display().to_string(),
            "exists": ctx.config_path.exists(),
        }));
    } else {
        // Plain so it can be used in scripts.
        println!("{}", ctx.config_path.display());
    }
    Ok(true)
}

fn execute_init(ctx: &Context, force: bool) -> Result<bool> {
    let formatter = ctx.formatter();
    let path = &ctx.config_path;

    if path.exists() && !force {
        formatter.error(&format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ));
        return Ok(false);
    }

    Config::default()
        .save(path)
        .context("Failed to write configuration file")?;
    formatter.success(&format!("Wrote default configuration to {}", path.display()));
    Ok(true)
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => anyhow::bail!("Expected true or false, got '{}'", value),
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Apply a dot-notation key/value pair to a Config struct
///
/// See [`SUPPORTED_KEYS`] for the accepted keys.
fn apply_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    if let Some(mime) = key.strip_prefix("remote.content_type_overrides.") {
        if mime.is_empty() {
            anyhow::bail!("Missing mime type in '{}'", key);
        }
        if value.is_empty() {
            config.remote.content_type_overrides.remove(mime);
        } else {
            config
                .remote
                .content_type_overrides
                .insert(mime.to_string(), value.to_string());
        }
        return Ok(());
    }

    match key {
        // --- sync ---
        "sync.root" => config.sync.root = PathBuf::from(value),
        "sync.manifest_path" => config.sync.manifest_path = PathBuf::from(value),
        "sync.follow_symlinks" => config.sync.follow_symlinks = parse_bool(value)?,
        "sync.sync_shared_in_drive" => config.sync.sync_shared_in_drive = parse_bool(value)?,
        "sync.allow_remote_deletion" => config.sync.allow_remote_deletion = parse_bool(value)?,

        // --- conflicts ---
        "conflicts.update_conflict_strategy" => {
            config.conflicts.update_conflict_strategy = value.to_string();
        }

        // --- filter ---
        "filter.inclusion" => {
            config.filter.inclusion = match value {
                "blacklist" => InclusionMode::Blacklist,
                "whitelist" => InclusionMode::Whitelist,
                _ => anyhow::bail!("Expected blacklist or whitelist, got '{}'", value),
            };
        }
        "filter.blacklist" => config.filter.blacklist = parse_list(value),
        "filter.exceptions" => config.filter.exceptions = parse_list(value),
        "filter.whitelist" => config.filter.whitelist = parse_list(value),

        // --- remote ---
        "remote.base_url" => config.remote.base_url = value.to_string(),
        "remote.token_file" => config.remote.token_file = PathBuf::from(value),
        "remote.timeout_secs" => {
            config.remote.timeout_secs = value
                .parse::<u64>()
                .context("Expected a positive integer for remote.timeout_secs")?;
        }
        "remote.retries" => {
            config.remote.retries = value
                .parse::<u32>()
                .context("Expected a positive integer for remote.retries")?;
        }
        "remote.page_size" => {
            config.remote.page_size = value
                .parse::<u32>()
                .context("Expected a positive integer for remote.page_size")?;
        }

        // --- logging ---
        "logging.level" => config.logging.level = value.to_string(),

        _ => {
            anyhow::bail!("Unknown configuration key: '{}'", key);
        }
    }

    Ok(())
}
