//! Configuration module for DriveSync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for DriveSync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    pub conflicts: ConflictsConfig,
    pub filter: FilterConfig,
    pub remote: RemoteConfig,
    pub logging: LoggingConfig,
}

/// Synchronization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Root directory for the local drive mirror.
    pub root: PathBuf,
    /// Location of the JSON manifest of last-synced timestamps.
    pub manifest_path: PathBuf,
    /// Descend into symlinked directories when listing local files.
    pub follow_symlinks: bool,
    /// Also sync items shared with the user that were added to their drive.
    pub sync_shared_in_drive: bool,
    /// Trash remote files whose local copy was deleted since the last sync.
    pub allow_remote_deletion: bool,
}

/// Conflict resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictsConfig {
    /// Strategy used when both sides changed: `ignore`, `keep_local`,
    /// `keep_remote`, or `keep_latest`.
    pub update_conflict_strategy: String,
}

/// Which ignore list is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InclusionMode {
    /// Everything is synced except paths matching `blacklist`.
    Blacklist,
    /// Only paths matching `whitelist` are synced.
    Whitelist,
}

/// Path filtering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub inclusion: InclusionMode,
    /// Glob patterns excluded in blacklist mode.
    pub blacklist: Vec<String>,
    /// Glob patterns rescued from the blacklist.
    pub exceptions: Vec<String>,
    /// Glob patterns included in whitelist mode.
    pub whitelist: Vec<String>,
}

/// Remote drive connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the Drive REST API.
    pub base_url: String,
    /// File holding a bearer access token. `DRIVESYNC_ACCESS_TOKEN` takes precedence.
    pub token_file: PathBuf,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Attempts after the first one for transient failures.
    pub retries: u32,
    /// Number of items requested per listing page.
    pub page_size: u32,
    /// Content types substituted before updating an existing remote file.
    pub content_type_overrides: BTreeMap<String, String>,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Loading and saving
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/drivesync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("drivesync")
            .join("config.yaml")
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Write the configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    /// Replace a leading `~` in every path setting with `home`.
    pub fn expand_paths(mut self, home: &Path) -> Self {
        self.sync.root = expand_tilde(&self.sync.root, home);
        self.sync.manifest_path = expand_tilde(&self.sync.manifest_path, home);
        self.remote.token_file = expand_tilde(&self.remote.token_file, home);
        self
    }
}

/// Expand a leading `~` component of `path` to `home`.
pub fn expand_tilde(path: &Path, home: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for SyncConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("drivesync");
        Self {
            root: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("~"))
                .join("Drive"),
            manifest_path: data_dir.join("manifest.json"),
            follow_symlinks: false,
            sync_shared_in_drive: false,
            allow_remote_deletion: false,
        }
    }
}

impl Default for ConflictsConfig {
    fn default() -> Self {
        Self {
            update_conflict_strategy: "keep_latest".to_string(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            inclusion: InclusionMode::Blacklist,
            blacklist: Vec::new(),
            exceptions: Vec::new(),
            whitelist: Vec::new(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        let mut content_type_overrides = BTreeMap::new();
        // Drive rejects in-place updates of plain text bodies.
        content_type_overrides.insert("text/plain".to_string(), "application/json".to_string());
        Self {
            base_url: "https://www.googleapis.com".to_string(),
            token_file: dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("~/.config"))
                .join("drivesync")
                .join("token"),
            timeout_secs: 60,
            retries: 3,
            page_size: 1000,
            content_type_overrides,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"remote.timeout_secs"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
pub const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid values for `conflicts.update_conflict_strategy`.
pub const VALID_CONFLICT_STRATEGIES: &[&str] = &["ignore", "keep_local", "keep_remote", "keep_latest"];

/// Largest page size the Drive listing endpoint accepts.
const MAX_PAGE_SIZE: u32 = 1000;

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- sync ---
        if self.sync.root.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "sync.root".into(),
                message: "must not be empty".into(),
            });
        } else if self.sync.root.exists() && !self.sync.root.is_dir() {
            errors.push(ValidationError {
                field: "sync.root".into(),
                message: format!("not a directory: {}", self.sync.root.display()),
            });
        }
        if self.sync.manifest_path.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "sync.manifest_path".into(),
                message: "must not be empty".into(),
            });
        }

        // --- conflicts ---
        if !VALID_CONFLICT_STRATEGIES.contains(&self.conflicts.update_conflict_strategy.as_str()) {
            errors.push(ValidationError {
                field: "conflicts.update_conflict_strategy".into(),
                message: format!(
                    "invalid strategy '{}'; valid options: {}",
                    self.conflicts.update_conflict_strategy,
                    VALID_CONFLICT_STRATEGIES.join(", ")
                ),
            });
        }

        // --- filter ---
        if self.filter.inclusion == InclusionMode::Whitelist && self.filter.whitelist.is_empty() {
            errors.push(ValidationError {
                field: "filter.whitelist".into(),
                message: "whitelist mode with no patterns excludes every file".into(),
            });
        }
        for (field, patterns) in [
            ("filter.blacklist", &self.filter.blacklist),
            ("filter.exceptions", &self.filter.exceptions),
            ("filter.whitelist", &self.filter.whitelist),
        ] {
            for pattern in patterns {
                if let Err(e) = glob::Pattern::new(pattern) {
                    errors.push(ValidationError {
                        field: field.into(),
                        message: format!("invalid pattern '{pattern}': {e}"),
                    });
                }
            }
        }

        // --- remote ---
        if !(self.remote.base_url.starts_with("https://")
            || self.remote.base_url.starts_with("http://"))
        {
            errors.push(ValidationError {
                field: "remote.base_url".into(),
                message: format!("must be an http(s) URL, got '{}'", self.remote.base_url),
            });
        }
        if self.remote.timeout_secs == 0 {
            errors.push(ValidationError {
                field: "remote.timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.remote.page_size == 0 || self.remote.page_size > MAX_PAGE_SIZE {
            errors.push(ValidationError {
                field: "remote.page_size".into(),
                message: format!("must be in range 1..={MAX_PAGE_SIZE}"),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use drivesync_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = ConfigBuilder::new()
///     .sync_root(PathBuf::from("/home/user/Drive"))
///     .update_conflict_strategy("keep_local")
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- sync ---

    pub fn sync_root(mut self, root: PathBuf) -> Self {
        self.config.sync.root = root;
        self
    }

    pub fn manifest_path(mut self, path: PathBuf) -> Self {
        self.config.sync.manifest_path = path;
        self
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.config.sync.follow_symlinks = follow;
        self
    }

    pub fn sync_shared_in_drive(mut self, shared: bool) -> Self {
        self.config.sync.sync_shared_in_drive = shared;
        self
    }

    pub fn allow_remote_deletion(mut self, allow: bool) -> Self {
        self.config.sync.allow_remote_deletion = allow;
        self
    }

    // --- conflicts ---

    pub fn update_conflict_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.config.conflicts.update_conflict_strategy = strategy.into();
        self
    }

    // --- filter ---

    pub fn inclusion(mut self, mode: InclusionMode) -> Self {
        self.config.filter.inclusion = mode;
        self
    }

    pub fn blacklist(mut self, patterns: Vec<String>) -> Self {
        self.config.filter.blacklist = patterns;
        self
    }

    pub fn exceptions(mut self, patterns: Vec<String>) -> Self {
        self.config.filter.exceptions = patterns;
        self
    }

    pub fn whitelist(mut self, patterns: Vec<String>) -> Self {
        self.config.filter.whitelist = patterns;
        self
    }

    // --- remote ---

    pub fn remote_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.remote.base_url = url.into();
        self
    }

    pub fn remote_token_file(mut self, path: PathBuf) -> Self {
        self.config.remote.token_file = path;
        self
    }

    pub fn remote_timeout_secs(mut self, seconds: u64) -> Self {
        self.config.remote.timeout_secs = seconds;
        self
    }

    pub fn remote_retries(mut self, retries: u32) -> Self {
        self.config.remote.retries = retries;
        self
    }

    pub fn remote_page_size(mut self, size: u32) -> Self {
        self.config.remote.page_size = size;
        self
    }

    pub fn content_type_override(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.config
            .remote
            .content_type_overrides
            .insert(from.into(), to.into());
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
