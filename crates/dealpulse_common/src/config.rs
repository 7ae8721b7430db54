//! Configuration management for DealPulse.
//!
//! Loads settings from /etc/dealpulse/config.toml, then
//! /var/lib/dealpulse/config.toml, or uses defaults. `DEALPULSE_CONFIG` names
//! an explicit file that wins over both and must load.

use crate::logging::LogLevel;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/dealpulse/config.toml";

/// Default config file path for fallback
pub const DEFAULT_CONFIG_PATH: &str = "/var/lib/dealpulse/config.toml";

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "DEALPULSE_CONFIG";

/// HTTP listener configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_bind_addr() -> String {
    "127.0.0.1:7870".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

/// Deal database location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("/var/lib"))
        .join("dealpulse")
        .join("deals.db")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Built-in ticker. Off by default: the sweep is normally triggered over HTTP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Seconds between sweeps
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Seconds to wait after startup before the first sweep
    #[serde(default = "default_startup_delay")]
    pub startup_delay_secs: u64,
}

fn default_interval() -> u64 {
    24 * 60 * 60
}

fn default_startup_delay() -> u64 {
    30
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: default_interval(),
            startup_delay_secs: default_startup_delay(),
        }
    }
}

/// Log output configuration. `RUST_LOG` overrides `level`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// A loaded config plus where it came from
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    /// `None` when defaults were used
    pub source: Option<PathBuf>,
    /// Fallback files that exist but could not be used
    pub warnings: Vec<String>,
}

impl Config {
    /// Load config from `DEALPULSE_CONFIG` or the standard locations.
    ///
    /// Logging is usually not set up yet, so the caller reports the source
    /// and any warnings.
    pub fn load() -> Result<LoadedConfig> {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let fallbacks = [PathBuf::from(CONFIG_PATH), PathBuf::from(DEFAULT_CONFIG_PATH)];
        Self::load_from(explicit.as_deref(), &fallbacks)
    }

    /// Load from an explicit file, or the first usable fallback.
    ///
    /// An explicit file must load. Missing fallbacks are skipped; a fallback
    /// that exists but fails to read or parse becomes a warning and the next
    /// one is tried.
    pub fn load_from(explicit: Option<&Path>, fallbacks: &[PathBuf]) -> Result<LoadedConfig> {
        if let Some(path) = explicit {
            let config = Self::load_from_path(path)
                .with_context(|| format!("{} points at an unusable config", CONFIG_ENV))?;
            return Ok(LoadedConfig {
                config,
                source: Some(path.to_path_buf()),
                warnings: Vec::new(),
            });
        }

        let mut warnings = Vec::new();
        for path in fallbacks {
            if !path.exists() {
                continue;
            }
            match Self::load_from_path(path) {
                Ok(config) => {
                    return Ok(LoadedConfig {
                        config,
                        source: Some(path.clone()),
                        warnings,
                    })
                }
                Err(e) => warnings.push(format!("Ignoring config: {:#}", e)),
            }
        }

        Ok(LoadedConfig {
            config: Config::default(),
            source: None,
            warnings,
        })
    }

    /// Load config from specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        Ok(config)
    }

    /// Save default config to path (for init)
    pub fn save_default(path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(&Config::default())?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }
}
