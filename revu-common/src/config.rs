//! Configuration file loading and data folder resolution
//!
//! Services resolve each setting in this order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! This module owns tier 3 and the OS-dependent defaults. Tiers 1 and 2 are
//! handled by each service's CLI layer.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Settings that may be supplied through the TOML config file
///
/// Every field is optional; a missing field falls through to the compiled
/// default of the service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Socket address to bind the HTTP server to (e.g. "127.0.0.1:3001")
    #[serde(default)]
    pub bind_addr: Option<String>,

    /// sqlx database URL
    #[serde(default)]
    pub database_url: Option<String>,

    /// Base URL of the remote analysis service
    #[serde(default)]
    pub analysis_base_url: Option<String>,

    /// HMAC secret used to verify bearer tokens
    #[serde(default)]
    pub jwt_secret: Option<String>,

    /// Seconds an upload task is kept after creation
    #[serde(default)]
    pub task_retention_secs: Option<u64>,

    /// Interval between progress stream ticks
    #[serde(default)]
    pub progress_poll_interval_ms: Option<u64>,

    /// Maximum number of files per upload request
    #[serde(default)]
    pub max_files: Option<usize>,

    /// Maximum size of a single uploaded file, in bytes
    #[serde(default)]
    pub max_file_size: Option<usize>,

    /// Origins allowed by CORS
    #[serde(default)]
    pub cors_origins: Option<Vec<String>>,
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    parse_toml_config(&content)
}

/// Parse TOML config text
pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Locate the default config file for a service, if one exists
///
/// Looks for `<config_dir>/revu/<service>.toml`, then on Linux
/// `/etc/revu/<service>.toml`.
pub fn find_config_file(service_name: &str) -> Option<PathBuf> {
    let file_name = format!("{}.toml", service_name);

    if let Some(path) = dirs::config_dir().map(|d| d.join("revu").join(&file_name)) {
        if path.exists() {
            tracing::debug!("Found user config file: {}", path.display());
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/revu").join(&file_name);
        if system_config.exists() {
            tracing::debug!("Found system config file: {}", system_config.display());
            return Some(system_config);
        }
    }

    tracing::debug!("No config file found for {}", service_name);
    None
}

/// Get OS-dependent default data folder
pub fn default_data_dir() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/revu (or /var/lib/revu for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("revu"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/revu"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("revu"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/revu"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("revu"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\revu"))
    } else {
        PathBuf::from("./revu_data")
    }
}
