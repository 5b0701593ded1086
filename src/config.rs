//! Configuration management for kinetune
//!
//! Two-tier configuration:
//! 1. **TOML bootstrap**: database path, port, playlist path, logging and
//!    the motion-detection algorithm parameters (static, bootstrap only)
//! 2. **Database runtime**: user-adjustable settings (volume, auto-advance,
//!    control mode default, sensitivity) live in the `settings` table
//!
//! Missing TOML keys fall back to built-in defaults defined in code, so an
//! absent config file is valid.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Bootstrap configuration loaded from TOML file
///
/// These settings cannot change during runtime. The daemon must restart to
/// pick up changes to the TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Path to the SQLite settings database
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path to the playlist TOML file
    #[serde(default = "default_playlist_path")]
    pub playlist_path: PathBuf,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Motion classification parameters
    #[serde(default)]
    pub motion: MotionConfig,

    /// Player defaults
    #[serde(default)]
    pub player: PlayerConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Motion classification algorithm parameters
///
/// Defaults match the variance-based detection algorithm: a 15-sample
/// magnitude window, variance threshold derived from sensitivity, 1200 ms
/// debounce and 4 consecutive agreeing readings before a state flip.
#[derive(Debug, Clone, Deserialize)]
pub struct MotionConfig {
    #[serde(default = "default_base_variance_threshold")]
    pub base_variance_threshold: f64,

    #[serde(default = "default_min_variance_threshold")]
    pub min_variance_threshold: f64,

    #[serde(default = "default_debounce_delay_ms")]
    pub debounce_delay_ms: u64,

    #[serde(default = "default_history_size")]
    pub history_size: usize,

    #[serde(default = "default_consecutive_readings_required")]
    pub consecutive_readings_required: u32,

    /// Default sensitivity on the 0-100 scale
    #[serde(default = "default_sensitivity")]
    pub default_sensitivity: u8,
}

/// Player defaults applied when the settings database has no stored value
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_volume")]
    pub default_volume: f64,

    #[serde(default = "default_auto_advance")]
    pub default_auto_advance: bool,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("kinetune.db")
}

fn default_port() -> u16 {
    5761
}

fn default_playlist_path() -> PathBuf {
    PathBuf::from("playlist.toml")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_variance_threshold() -> f64 {
    2.0
}

fn default_min_variance_threshold() -> f64 {
    0.1
}

fn default_debounce_delay_ms() -> u64 {
    1200
}

fn default_history_size() -> usize {
    15
}

fn default_consecutive_readings_required() -> u32 {
    4
}

fn default_sensitivity() -> u8 {
    50
}

fn default_volume() -> f64 {
    0.7
}

fn default_auto_advance() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            port: default_port(),
            playlist_path: default_playlist_path(),
            logging: LoggingConfig::default(),
            motion: MotionConfig::default(),
            player: PlayerConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            base_variance_threshold: default_base_variance_threshold(),
            min_variance_threshold: default_min_variance_threshold(),
            debounce_delay_ms: default_debounce_delay_ms(),
            history_size: default_history_size(),
            consecutive_readings_required: default_consecutive_readings_required(),
            default_sensitivity: default_sensitivity(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_volume: default_volume(),
            default_auto_advance: default_auto_advance(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// A missing file yields the built-in defaults; a malformed file is an
    /// error (misconfiguration should be loud, not silently defaulted).
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))?;

        Ok(config)
    }
}
