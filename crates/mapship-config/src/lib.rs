//! Configuration file handling for mapship.
//!
//! Settings come from four layers, highest precedence first: command-line
//! flags ([`CliOverrides`]), environment variables, an optional
//! `.mapship.toml` in the project root, and built-in defaults.
//!
//! # Example
//!
//! ```
//! use mapship_config::{CliOverrides, resolve_config};
//! use std::path::Path;
//!
//! let config = resolve_config(Path::new("."), None, &CliOverrides::default())
//!     .expect("load config");
//! assert!(config.retry.max_attempts > 0);
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use mapship_retry::RetryConfig;
use mapship_transport::{DEFAULT_TIMEOUT, TransportOptions};
use serde::{Deserialize, Serialize};

/// Default configuration file name
pub const CONFIG_FILE: &str = ".mapship.toml";

/// Overrides the retry interval, in whole milliseconds.
pub const RETRY_INTERVAL_ENV: &str = "MAPSHIP_RETRY_INTERVAL_MS";

/// Overrides the request timeout, in whole milliseconds.
pub const TIMEOUT_ENV: &str = "MAPSHIP_TIMEOUT_MS";

/// Get the config file path for a directory
pub fn config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE)
}

/// Complete mapship configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

/// `[upload]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Origin (or full URL) of the ingestion service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Replace an existing source map matching the same criteria.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overwrite: Option<bool>,
}

/// `[network]` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
        }
    }
}

/// Values supplied on the command line. `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub endpoint: Option<String>,
    pub overwrite: Option<bool>,
    pub max_attempts: Option<u32>,
    pub retry_interval: Option<Duration>,
    pub timeout: Option<Duration>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.upload.endpoint.as_deref()
    }

    pub fn overwrite(&self) -> Option<bool> {
        self.upload.overwrite
    }

    /// Apply `MAPSHIP_RETRY_INTERVAL_MS` and `MAPSHIP_TIMEOUT_MS`.
    ///
    /// Values that do not parse as whole milliseconds are ignored.
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(ms) = lookup(RETRY_INTERVAL_ENV).and_then(|v| parse_millis(&v)) {
            self.retry.interval = ms;
        }
        if let Some(ms) = lookup(TIMEOUT_ENV).and_then(|v| parse_millis(&v)) {
            self.network.timeout = ms;
        }
        self
    }

    /// Layer command-line values on top of this config.
    pub fn with_cli(mut self, cli: &CliOverrides) -> Self {
        if let Some(endpoint) = &cli.endpoint {
            self.upload.endpoint = Some(endpoint.clone());
        }
        if let Some(overwrite) = cli.overwrite {
            self.upload.overwrite = Some(overwrite);
        }
        if let Some(max_attempts) = cli.max_attempts {
            self.retry.max_attempts = max_attempts;
        }
        if let Some(interval) = cli.retry_interval {
            self.retry.interval = interval;
        }
        if let Some(timeout) = cli.timeout {
            self.network.timeout = timeout;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            bail!("retry.max_attempts must be greater than 0");
        }
        if self.network.timeout.is_zero() {
            bail!("network.timeout must be greater than 0");
        }
        if let Some(endpoint) = &self.upload.endpoint
            && endpoint.trim().is_empty()
        {
            bail!("upload.endpoint must not be empty");
        }
        Ok(())
    }

    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            timeout: self.network.timeout,
            retry: self.retry.clone(),
        }
    }
}

fn parse_millis(raw: &str) -> Option<Duration> {
    raw.trim().parse::<u64>().ok().map(Duration::from_millis)
}

/// Load configuration from a directory. A missing file yields defaults.
pub fn load_config(dir: &Path) -> Result<Config> {
    let path = config_path(dir);
    if !path.exists() {
        return Ok(Config::default());
    }
    load_config_from_file(&path)
}

/// Load configuration from a specific file path, which must exist.
pub fn load_config_from_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    Ok(config)
}

/// Load, layer and validate the effective configuration.
///
/// `explicit` (from `--config`) replaces the `.mapship.toml` lookup in
/// `project_root`.
pub fn resolve_config(
    project_root: &Path,
    explicit: Option<&Path>,
    cli: &CliOverrides,
) -> Result<Config> {
    let base = match explicit {
        Some(path) => load_config_from_file(path)?,
        None => load_config(project_root)?,
    };
    let config = base.with_env().with_cli(cli);
    config.validate().context("invalid configuration")?;
    Ok(config)
}
