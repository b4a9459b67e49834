//! TOML-based configuration for the foohid service.
//!
//! Reads `ServiceConfig` from the platform-appropriate config file:
//! - Windows:  `%APPDATA%\foohid\config.toml`
//! - Linux:    `~/.config/foohid/config.toml`
//! - macOS:    `~/Library/Application Support/foohid/config.toml`
//!
//! # File format
//!
//! ```toml
//! [service]
//! log_level = "info"
//!
//! [[devices]]
//! name = "Foohid Virtual U2F"
//! serial_number = "SN 123456"
//! vendor_id = 2
//! product_id = 3
//! channel = "it.unbit.foohid.u2f"
//! role = "generic"
//! descriptor = "u2f"
//! ```
//!
//! `descriptor` is either the name of a built-in sample (`"u2f"`, `"mouse"`,
//! `"keyboard"`) or the descriptor bytes as hex.  Hex may be written
//! contiguously (`"05010902"`) or separated by spaces, commas, or colons, and
//! each byte may carry a `0x` prefix.
//!
//! Fields annotated with `#[serde(default = "...")]` fall back to the U2F
//! sample device when absent, so a missing file and an empty file behave the
//! same.

use std::path::{Path, PathBuf};

use foohid_core::domain::descriptor::samples;
use foohid_core::{CreateDeviceRequest, DeviceRole};
use serde::{Deserialize, Serialize};
use thiserror::Error;

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

    /// A device entry's `descriptor` is neither a sample name nor valid hex.
    #[error("invalid descriptor for device {device}: {reason}")]
    Descriptor { device: String, reason: String },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level service configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceConfig {
    #[serde(default)]
    pub service: ServiceSection,
    #[serde(default = "default_devices")]
    pub devices: Vec<DeviceEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceSection {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// One device the service creates at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceEntry {
    pub name: String,
    #[serde(default)]
    pub serial_number: String,
    #[serde(default)]
    pub vendor_id: u32,
    #[serde(default)]
    pub product_id: u32,
    pub channel: String,
    #[serde(default)]
    pub role: DeviceRole,
    #[serde(default = "default_descriptor")]
    pub descriptor: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_descriptor() -> String {
    "u2f".to_string()
}
fn default_devices() -> Vec<DeviceEntry> {
    vec![DeviceEntry::default()]
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            service: ServiceSection::default(),
            devices: default_devices(),
        }
    }
}

impl Default for ServiceSection {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for DeviceEntry {
    fn default() -> Self {
        Self {
            name: "Foohid Virtual U2F".to_string(),
            serial_number: "SN 123456".to_string(),
            vendor_id: 2,
            product_id: 3,
            channel: "it.unbit.foohid.u2f".to_string(),
            role: DeviceRole::Generic,
            descriptor: default_descriptor(),
        }
    }
}

impl DeviceEntry {
    /// Resolves `descriptor` to bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Descriptor`] if the value is not a sample name
    /// and not an even-length run of hex digits.
    pub fn descriptor_bytes(&self) -> Result<Vec<u8>, ConfigError> {
        if let Some(sample) = samples::by_name(&self.descriptor) {
            return Ok(sample.to_vec());
        }
        parse_hex(&self.descriptor).map_err(|reason| ConfigError::Descriptor {
            device: self.name.clone(),
            reason,
        })
    }

    /// Builds the creation call for this entry.
    pub fn to_request(&self) -> Result<CreateDeviceRequest, ConfigError> {
        Ok(CreateDeviceRequest {
            name: self.name.clone(),
            descriptor: self.descriptor_bytes()?,
            serial_number: self.serial_number.clone(),
            vendor_id: self.vendor_id,
            product_id: self.product_id,
            channel_name: self.channel.clone(),
            role: self.role,
        })
    }
}

fn parse_hex(text: &str) -> Result<Vec<u8>, String> {
    let digits: String = text
        .split(|c: char| c.is_whitespace() || c == ',' || c == ':')
        .filter(|tok| !tok.is_empty())
        .map(|tok| {
            tok.strip_prefix("0x")
                .or_else(|| tok.strip_prefix("0X"))
                .unwrap_or(tok)
        })
        .collect();

    if digits.is_empty() {
        return Err("descriptor is empty".to_string());
    }
    if digits.len() % 2 != 0 {
        return Err(format!("odd number of hex digits ({})", digits.len()));
    }
    if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(format!("unexpected character {bad:?}"));
    }

    (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|e| e.to_string()))
        .collect()
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

/// Resolves the full path to the config file.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `ServiceConfig` from `path`, returning the default configuration if
/// the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<ServiceConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ServiceConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Persists `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(config: &ServiceConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("foohid"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("foohid"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("foohid")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
