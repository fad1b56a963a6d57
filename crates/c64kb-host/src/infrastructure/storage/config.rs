//! TOML-based configuration for the host application.
//!
//! Reads `AppConfig` from the platform-appropriate config file:
//! - Windows:  `%APPDATA%\C64KB\config.toml`
//! - Linux:    `~/.config/c64kb/config.toml`
//! - macOS:    `~/Library/Application Support/C64KB/config.toml`
//!
//! # What is TOML? (for beginners)
//!
//! TOML (Tom's Obvious Minimal Language) is a configuration file format designed
//! to be easy to read and write.  It looks similar to INI files but with more
//! data types.  Example:
//!
//! ```toml
//! [peripheral]
//! address = "34:85:18:AB:37:71"
//! characteristic_uuid = "3b05e9bf-086f-4b56-9c37-7b7eeb30b28b"
//! scan_timeout_secs = 10
//!
//! [host]
//! log_level = "debug"
//! program_dir = "/home/me/c64/prg"
//! ```
//!
//! # Serde default values
//!
//! Every field carries `#[serde(default = "some_fn")]`, so a file only has to
//! name the settings it changes.  A missing file means all defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub peripheral: PeripheralConfig,
    #[serde(default)]
    pub host: HostConfig,
}

/// Which peripheral to connect to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeripheralConfig {
    /// Bluetooth MAC address, colon separated.
    #[serde(default = "default_address")]
    pub address: String,
    /// GATT characteristic used for every write and read.
    #[serde(default = "default_characteristic")]
    pub characteristic_uuid: Uuid,
    /// How long to scan for the peripheral before giving up.
    #[serde(default = "default_scan_timeout")]
    pub scan_timeout_secs: u64,
}

/// Settings for the host process itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Base directory for relative program file names.  Relative names
    /// resolve against the working directory when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_dir: Option<PathBuf>,
}

impl PeripheralConfig {
    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.scan_timeout_secs)
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_address() -> String {
    "34:85:18:AB:37:71".to_string()
}
fn default_characteristic() -> Uuid {
    Uuid::from_u128(0x3b05e9bf_086f_4b56_9c37_7b7eeb30b28b)
}
fn default_scan_timeout() -> u64 {
    10
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for PeripheralConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            characteristic_uuid: default_characteristic(),
            scan_timeout_secs: default_scan_timeout(),
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            program_dir: None,
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the default config file.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig`.
///
/// With `explicit` set, that file must exist.  Otherwise the platform default
/// path is used and a missing file yields `AppConfig::default()`.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors (including a missing
/// explicit file) and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let path = match explicit {
        Some(path) => return read_config(path),
        None => match config_file_path() {
            Ok(path) => path,
            Err(ConfigError::NoPlatformConfigDir) => return Ok(AppConfig::default()),
            Err(e) => return Err(e),
        },
    };

    match read_config(&path) {
        Err(ConfigError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            Ok(AppConfig::default())
        }
        other => other,
    }
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Renders `config` as TOML, as printed by `--print-config`.
pub fn to_toml(config: &AppConfig) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(config)?)
}

/// Resolves the platform config directory including the `C64KB` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("C64KB"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("c64kb"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("C64KB")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
