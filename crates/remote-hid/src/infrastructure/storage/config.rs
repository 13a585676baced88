//! TOML configuration for the remote.
//!
//! Read from the platform-appropriate config file unless a path is given:
//! - Windows:  `%APPDATA%\remote-hid\config.toml`
//! - Linux:    `~/.config/remote-hid/config.toml`
//! - macOS:    `~/Library/Application Support/remote-hid/config.toml`
//!
//! ```toml
//! [device]
//! name = "PC Remote Controller"
//! description = "Remote control for PC"
//! provider = "YourCompany"
//!
//! [timing]
//! click_hold_ms = 30
//! key_hold_ms = 50
//! text_key_hold_ms = 30
//! text_key_gap_ms = 30
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every section and field is optional; a missing value takes the default
//! shown above.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::dispatch_input::PressTimings;
use crate::application::transport::AppRegistration;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
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

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// SDP record strings advertised when registering the HID application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default = "default_provider")]
    pub provider: String,
}

/// Delays used by the sequencer, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimingConfig {
    /// Time between a click's press and release.
    #[serde(default = "default_click_hold_ms")]
    pub click_hold_ms: u64,
    /// Time between a key tap's press and release.
    #[serde(default = "default_key_hold_ms")]
    pub key_hold_ms: u64,
    /// Press-to-release time for each typed character.
    #[serde(default = "default_text_key_hold_ms")]
    pub text_key_hold_ms: u64,
    /// Release-to-next-press time between typed characters.
    #[serde(default = "default_text_key_gap_ms")]
    pub text_key_gap_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `tracing` filter directive: `"error"`, `"warn"`, `"info"`, `"debug"`,
    /// `"trace"` or a full `EnvFilter` string.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_name() -> String {
    "PC Remote Controller".to_string()
}
fn default_description() -> String {
    "Remote control for PC".to_string()
}
fn default_provider() -> String {
    "YourCompany".to_string()
}
fn default_click_hold_ms() -> u64 {
    30
}
fn default_key_hold_ms() -> u64 {
    50
}
fn default_text_key_hold_ms() -> u64 {
    30
}
fn default_text_key_gap_ms() -> u64 {
    30
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            description: default_description(),
            provider: default_provider(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            click_hold_ms: default_click_hold_ms(),
            key_hold_ms: default_key_hold_ms(),
            text_key_hold_ms: default_text_key_hold_ms(),
            text_key_gap_ms: default_text_key_gap_ms(),
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

impl From<&DeviceConfig> for AppRegistration {
    fn from(device: &DeviceConfig) -> Self {
        Self {
            name: device.name.clone(),
            description: device.description.clone(),
            provider: device.provider.clone(),
            ..AppRegistration::default()
        }
    }
}

impl From<&TimingConfig> for PressTimings {
    fn from(timing: &TimingConfig) -> Self {
        Self {
            click_hold: Duration::from_millis(timing.click_hold_ms),
            key_hold: Duration::from_millis(timing.key_hold_ms),
            text_key_hold: Duration::from_millis(timing.text_key_hold_ms),
            text_key_gap: Duration::from_millis(timing.text_key_gap_ms),
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("config.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads the config from the default location.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the file
/// does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Renders `config` as the TOML it would be written as.
pub fn render_config(config: &AppConfig) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(config)?)
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("remote-hid"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("remote-hid"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("remote-hid")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
