//! CLI subcommands and the state they share

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use tracing::warn;

use drivesync_core::config::Config;

use crate::output::{get_formatter, OutputFormat, OutputFormatter};

pub mod completions;
pub mod config;
pub mod reset;
pub mod sync;

/// Environment variable that overrides the token file
pub const ACCESS_TOKEN_ENV: &str = "DRIVESYNC_ACCESS_TOKEN";

/// Global options every subcommand receives
#[derive(Debug, Clone)]
pub struct Context {
    pub format: OutputFormat,
    pub quiet: bool,
    /// Config file in use (`--config` or the default location)
    pub config_path: PathBuf,
}

impl Context {
    pub fn formatter(&self) -> Box<dyn OutputFormatter> {
        get_formatter(self.format, self.quiet)
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Loads the config file with `~` expanded
    ///
    /// With `bootstrap`, a missing file is first created with the defaults.
    /// A file that exists but cannot be parsed is always an error.
    pub fn load_config(&self, bootstrap: bool) -> Result<Config> {
        let home = home_dir()?;
        let config = if self.config_path.exists() {
            Config::load(&self.config_path).with_context(|| {
                format!("Failed to read configuration {}", self.config_path.display())
            })?
        } else if bootstrap {
            warn!(path = %self.config_path.display(), "No configuration found, writing defaults");
            let config = Config::default();
            config
                .save(&self.config_path)
                .context("Failed to write default configuration")?;
            config
        } else {
            Config::default()
        };
        Ok(config.expand_paths(&home))
    }
}

pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().context("Cannot determine the home directory")
}

/// Reads the access token from the environment or the token file
pub fn access_token(token_file: &Path) -> Result<String> {
    access_token_from(std::env::var(ACCESS_TOKEN_ENV).ok(), token_file)
}

fn access_token_from(env_value: Option<String>, token_file: &Path) -> Result<String> {
    if let Some(token) = env_value.map(|t| t.trim().to_string()) {
        if !token.is_empty() {
            return Ok(token);
        }
    }

    let content = std::fs::read_to_string(token_file).with_context(|| {
        format!(
            "No access token: set {ACCESS_TOKEN_ENV} or write one to {}",
            token_file.display()
        )
    })?;
    let token = content.trim();
    if token.is_empty() {
        anyhow::bail!("Token file {} is empty", token_file.display());
    }
    Ok(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(config_path: PathBuf) -> Context {
        Context {
            format: OutputFormat::Human,
            quiet: true,
            config_path,
        }
    }

    #[test]
    fn test_env_token_wins() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("token");
        std::fs::write(&file, "from-file").unwrap();

        let token = access_token_from(Some(" from-env \n".into()), &file).unwrap();
        assert_eq!(token, "from-env");
    }

    #[test]
    fn test_token_file_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("token");
        std::fs::write(&file, "ya29.token\n").unwrap();

        assert_eq!(access_token_from(Some(String::new()), &file).unwrap(), "ya29.token");
        assert_eq!(access_token_from(None, &file).unwrap(), "ya29.token");
    }

    #[test]
    fn test_missing_or_empty_token_fails() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("token");
        assert!(access_token_from(None, &file).is_err());

        std::fs::write(&file, "  \n").unwrap();
        assert!(access_token_from(None, &file).is_err());
    }

    #[test]
    fn test_bootstrap_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        ctx(path.clone()).load_config(true).unwrap();
        assert!(path.exists());
        assert!(Config::load(&path).is_ok());
    }

    #[test]
    fn test_missing_config_without_bootstrap_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let config = ctx(path.clone()).load_config(false).unwrap();
        assert!(!path.exists());
        assert_eq!(config.conflicts.update_conflict_strategy, "keep_latest");
    }

    #[test]
    fn test_unparseable_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "sync: [not, a, map").unwrap();

        assert!(ctx(path).load_config(true).is_err());
    }
}
