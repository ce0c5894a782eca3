//! Sync configuration.
//!
//! Resolution order, later wins: TOML file → environment → CLI overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variables recognised by `apply_env`.
pub const ENV_INPUT_DIR: &str = "LOCAL_DATA_DIR";
pub const ENV_LOG_DIR: &str = "LOG_DIR";
pub const ENV_BUCKET: &str = "S3_BUCKET";
pub const ENV_PREFIX: &str = "S3_PREFIX_ROOT";
pub const ENV_DRY_RUN: &str = "DRY_RUN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{var} is not a boolean: {value}")]
    InvalidBool { var: String, value: String },

    #[error("missing required setting: {0}")]
    Missing(&'static str),
}

/// Everything a sync run needs to know.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncConfig {
    /// Directory holding `archived_<SYMBOL>_results.csv` files.
    pub input_dir: PathBuf,

    /// Where the log file and run reports go. No file logging if unset.
    pub log_dir: Option<PathBuf>,

    /// `s3://bucket`, bare bucket name, `file:///path`, or `memory://`.
    pub bucket: String,

    /// Root under which `<SYMBOL>/<date>` partitions live.
    pub prefix: String,

    /// Clean, filter and enrich, but preview instead of committing.
    pub dry_run: bool,

    /// Rows shown per file in a dry-run preview.
    pub preview_rows: usize,

    /// Rayon worker threads for enrichment and encoding. 0 = rayon default.
    pub workers: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::new(),
            log_dir: None,
            bucket: String::new(),
            prefix: String::new(),
            dry_run: false,
            preview_rows: 5,
            workers: 0,
        }
    }
}

/// Values supplied on the command line. `None` leaves the setting alone.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub input_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub bucket: Option<String>,
    pub prefix: Option<String>,
    pub dry_run: Option<bool>,
}

impl SyncConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|var| std::env::var(var).ok())
    }

    /// Apply overrides from any variable source. Empty values are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_INPUT_DIR) {
            self.input_dir = PathBuf::from(v);
        }
        if let Some(v) = get(ENV_LOG_DIR) {
            self.log_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = get(ENV_BUCKET) {
            self.bucket = v;
        }
        if let Some(v) = get(ENV_PREFIX) {
            self.prefix = v;
        }
        if let Some(v) = get(ENV_DRY_RUN) {
            self.dry_run = parse_bool(ENV_DRY_RUN, &v)?;
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(v) = overrides.input_dir {
            self.input_dir = v;
        }
        if let Some(v) = overrides.log_dir {
            self.log_dir = Some(v);
        }
        if let Some(v) = overrides.bucket {
            self.bucket = v;
        }
        if let Some(v) = overrides.prefix {
            self.prefix = v;
        }
        if let Some(v) = overrides.dry_run {
            self.dry_run = v;
        }
    }

    /// Check required settings and normalise the prefix.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.input_dir.as_os_str().is_empty() {
            return Err(ConfigError::Missing("input_dir"));
        }
        if self.bucket.trim().is_empty() {
            return Err(ConfigError::Missing("bucket"));
        }
        self.prefix = self.prefix.trim().trim_matches('/').to_string();
        Ok(())
    }
}

fn parse_bool(var: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            var: var.to_string(),
            value: value.to_string(),
        }),
    }
}
