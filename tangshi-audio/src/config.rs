//! Configuration for tangshi-speak
//!
//! TOML bootstrap configuration; every field has a built-in default so an
//! absent file (or absent section) is never fatal.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (--sample-rate, --channels, --device)
//! 2. TOML configuration file (see `tangshi_common::config` for lookup)
//! 3. Built-in defaults (code constants)
//!
//! ```toml
//! [speech]
//! sample_rate = 24000
//! channels = 1
//!
//! [output]
//! device = "Built-in Output"
//! volume = 0.75
//! sample_rate = 48000
//!
//! [logging]
//! level = "info"
//! ```

use crate::audio::pcm::PcmFormat;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tangshi_common::config::ConfigResolver;

/// Application name used for config lookup and logging
pub const APP_NAME: &str = "tangshi-speak";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    /// Format of the speech provider's PCM payloads
    #[serde(default)]
    pub speech: PcmFormat,

    /// Playback output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Playback output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Output device name (None = default device)
    #[serde(default)]
    pub device: Option<String>,

    /// Master volume (0.0-1.0)
    #[serde(default = "default_volume")]
    pub volume: f32,

    /// Rate of the in-memory sink used when no device is opened
    /// (None = keep the payload's rate)
    #[serde(default)]
    pub sample_rate: Option<u32>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            device: None,
            volume: default_volume(),
            sample_rate: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_volume() -> f32 {
    0.75
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Command-line configuration overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
    pub device: Option<String>,
}

impl TomlConfig {
    /// Resolve, load, override and validate the configuration
    ///
    /// # Errors
    /// - An explicitly named config file cannot be read
    /// - A config file fails to parse
    /// - The resulting speech format has a zero rate or channel count
    pub fn load(cli_path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let mut config: TomlConfig = ConfigResolver::new(APP_NAME)
            .load(cli_path)
            .map_err(|e| Error::Config(e.to_string()))?;

        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(rate) = overrides.sample_rate {
            self.speech.sample_rate = rate;
        }
        if let Some(channels) = overrides.channels {
            self.speech.channels = channels;
        }
        if overrides.device.is_some() {
            self.output.device = overrides.device;
        }
    }

    /// Check values that would otherwise fail deep inside playback
    pub fn validate(&mut self) -> Result<()> {
        self.speech
            .validate()
            .map_err(|e| Error::Config(format!("[speech] {}", e)))?;

        if self.output.sample_rate == Some(0) {
            return Err(Error::Config(
                "[output] sample_rate must be positive".to_string(),
            ));
        }

        self.output.volume = self.output.volume.clamp(0.0, 1.0);
        Ok(())
    }
}
