//! Configuration loading for mixid
//!
//! Settings are resolved in this priority order:
//! 1. Command-line arguments (handled by the binary)
//! 2. Environment variables (`MIXID_*`, handled by the binary)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! This module owns tiers 3 and 4: the TOML schema, its defaults, validation,
//! and atomic write-back.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Directory name under the platform config dir
pub const APP_DIR: &str = "mixid";

/// Config file name inside [`APP_DIR`]
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration loaded from TOML
///
/// Every section is optional; a missing section takes its built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// External recognition service
    #[serde(default)]
    pub recognizer: RecognizerConfig,

    /// External file-search service
    #[serde(default)]
    pub search: SearchConfig,

    /// Segmentation and dispatch parameters
    #[serde(default)]
    pub pipeline: PipelineSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Recognition service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizerConfig {
    /// Endpoint receiving one WAV-encoded window per POST
    #[serde(default = "default_recognizer_endpoint")]
    pub endpoint: String,

    /// API key sent with each request (optional)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-window timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Request rate cap; unlimited when absent
    #[serde(default)]
    pub requests_per_second: Option<u32>,
}

/// File-search service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// JSON-RPC endpoint
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Segmentation and dispatch parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Window length in seconds
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,

    /// Maximum recognition calls in flight
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Extra attempts for windows whose recognition failed
    #[serde(default)]
    pub max_retries: u32,

    /// Audio format requested from the acquisition tool
    #[serde(default = "default_audio_format")]
    pub audio_format: String,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_recognizer_endpoint() -> String {
    "http://127.0.0.1:8088/recognize".to_string()
}

fn default_search_endpoint() -> String {
    "http://localhost:5150/jsonrpc".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_window_seconds() -> u64 {
    40
}

fn default_max_concurrency() -> usize {
    4
}

fn default_audio_format() -> String {
    "mp3".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_recognizer_endpoint(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            requests_per_second: None,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            window_seconds: default_window_seconds(),
            max_concurrency: default_max_concurrency(),
            max_retries: 0,
            audio_format: default_audio_format(),
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

impl TomlConfig {
    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.window_seconds == 0 {
            return Err(Error::Config(
                "pipeline.window_seconds must be greater than zero".to_string(),
            ));
        }
        if self.pipeline.max_concurrency == 0 {
            return Err(Error::Config(
                "pipeline.max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.recognizer.timeout_secs == 0 {
            return Err(Error::Config(
                "recognizer.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.recognizer.requests_per_second == Some(0) {
            return Err(Error::Config(
                "recognizer.requests_per_second must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default config file location (`<config dir>/mixid/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE_NAME))
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    config.validate()?;
    Ok(config)
}

/// Load configuration with graceful fallback
///
/// An explicitly requested file must exist. When no file is requested, the
/// default location is tried and a missing file yields built-in defaults.
pub fn load_or_default(explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        info!("Loading config from {}", path.display());
        return load_toml_config(path);
    }

    match default_config_path() {
        Some(path) if path.exists() => {
            info!("Loading config from {}", path.display());
            load_toml_config(&path)
        }
        Some(path) => {
            debug!("No config file at {}, using defaults", path.display());
            Ok(TomlConfig::default())
        }
        None => {
            warn!("Could not determine config directory, using defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Write config to disk atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;

    debug!("Config written to {}", path.display());
    Ok(())
}

/// Write a default config file to `path`
///
/// An existing file is left alone unless `overwrite` is set.
pub fn init_config(path: &Path, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        return Err(Error::Config(format!(
            "{} already exists (pass --force to overwrite)",
            path.display()
        )));
    }

    write_toml_config(&TomlConfig::default(), path)?;
    info!("Default config written to {}", path.display());
    Ok(())
}
