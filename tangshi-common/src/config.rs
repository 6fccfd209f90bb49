//! Configuration file resolution and loading
//!
//! Config file location follows a fixed priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`TANGSHI_CONFIG`)
//! 3. Per-user config file (`<config dir>/tangshi/config.toml`)
//! 4. Built-in defaults (no file)
//!
//! A missing config file never prevents startup: the caller gets
//! `T::default()` and a warning is logged. A file that was explicitly
//! requested (CLI or environment) must exist, and any file that is found
//! must parse.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming a config file
pub const CONFIG_ENV_VAR: &str = "TANGSHI_CONFIG";

/// Where a resolved config path came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    CommandLine,
    Environment,
    UserConfigDir,
}

/// Resolves the config file path for one application
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    app_name: String,
}

impl ConfigResolver {
    pub fn new(app_name: &str) -> Self {
        Self {
            app_name: app_name.to_string(),
        }
    }

    /// Resolve the config path, returning `None` when defaults should be used
    pub fn resolve(&self, cli_arg: Option<&Path>) -> Option<(PathBuf, ConfigSource)> {
        // Priority 1: Command-line argument
        if let Some(path) = cli_arg {
            return Some((path.to_path_buf(), ConfigSource::CommandLine));
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.is_empty() {
                return Some((PathBuf::from(path), ConfigSource::Environment));
            }
        }

        // Priority 3: Per-user config file, only if it exists
        if let Some(path) = self.user_config_path() {
            if path.exists() {
                return Some((path, ConfigSource::UserConfigDir));
            }
        }

        None
    }

    /// Per-user config file location for this platform
    ///
    /// - Linux: `~/.config/tangshi/config.toml`
    /// - macOS: `~/Library/Application Support/tangshi/config.toml`
    /// - Windows: `%APPDATA%\tangshi\config.toml`
    pub fn user_config_path(&self) -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("tangshi").join("config.toml"))
    }

    /// Resolve and load the config, falling back to `T::default()`
    pub fn load<T>(&self, cli_arg: Option<&Path>) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        match self.resolve(cli_arg) {
            Some((path, source)) => {
                info!("{}: loading config from {} ({:?})", self.app_name, path.display(), source);
                load_toml_file(&path)
            }
            None => {
                warn!(
                    "{}: no config file found, using built-in defaults",
                    self.app_name
                );
                Ok(T::default())
            }
        }
    }
}

/// Read and parse a TOML config file
pub fn load_toml_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    toml::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse TOML in {}: {}", path.display(), e))
    })
}
