//! Configuration loading for the `qarc` tool.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::{ArchiveError, ArchiveResult};

/// Name of the config file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "qarc.toml";

/// Tool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Gzip-wrap archives written by `pack`.
    #[serde(default)]
    pub gzip: bool,
    /// Log level when `--verbose` is not given.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Let `extract` write into directories that already exist.
    #[serde(default)]
    pub overwrite: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            gzip: false,
            log_level: default_log_level(),
            overwrite: false,
        }
    }
}

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> ArchiveResult<CliConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| ArchiveError::InvalidInput {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Use `explicit` if given, else `qarc.toml` in the working directory if it
/// exists, else the defaults.
pub fn resolve_config(explicit: Option<&Path>) -> ArchiveResult<CliConfig> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
    if default_path.is_file() {
        return load_config(&default_path);
    }
    Ok(CliConfig::default())
}
