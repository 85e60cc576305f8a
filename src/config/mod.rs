//! Configuration module for the MProbe workshop
//!
//! This module handles persistent client configuration:
//! - Trace file location and progress dialog behaviour
//! - Default analysis settings and histogram bin layouts
//! - The last directory a problem was opened from
//!
//! # App Data Location
//!
//! Configuration is stored in the platform-appropriate location:
//! - **Linux**: `~/.local/share/org.mprobe.workshop/`
//! - **macOS**: `~/Library/Application Support/org.mprobe.workshop/`
//! - **Windows**: `%APPDATA%\org.mprobe.workshop\`
//!
//! # Files
//!
//! - `config.toml` - The serialized [`AppConfig`]
//! - `logs/` - Daily rolling log files written by the binary
//!
//! # Example
//!
//! ```ignore
//! use mprobe_workshop::config::AppConfig;
//!
//! let mut config = AppConfig::load_or_default();
//! config.progress_close_delay_ms = 250;
//! config.save()?;
//! ```

pub mod settings;

pub use settings::*;

use crate::error::{Result, WorkshopError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for data directories
pub const APP_ID: &str = "org.mprobe.workshop";

/// Config filename
pub const CONFIG_FILE: &str = "config.toml";

/// Directory (under the app data dir) holding log files
pub const LOG_DIR: &str = "logs";

/// Default delay before a finished progress dialog closes
pub const DEFAULT_PROGRESS_CLOSE_DELAY_MS: u64 = 1000;

/// Trace file name used when the instance has no name
pub const DEFAULT_TRACE_NAME: &str = "trace";

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir().ok_or_else(|| {
        WorkshopError::Config("Could not determine app data directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            WorkshopError::Config(format!("Failed to create app data directory: {}", e))
        })?;
    }

    Ok(dir)
}

/// Get the path to the config file
pub fn config_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(CONFIG_FILE))
}

// ==================== App Config ====================

/// Persistent client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Version for future migration support
    pub version: u32,

    /// Trace file, or a directory to place per-instance trace files in
    pub trace_file: Option<PathBuf>,

    /// How long a finished progress dialog stays open
    pub progress_close_delay_ms: u64,

    /// Directory of the last opened problem
    pub last_path: Option<PathBuf>,

    /// Collect the extra histograms while analysing
    pub extra_histograms: bool,

    /// Settings applied to each new analysis handle
    pub analysis: AnalysisSettings,

    /// Histogram bin layouts applied to each new analysis handle
    pub histogram_bins: HistogramBins,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            trace_file: None,
            progress_close_delay_ms: DEFAULT_PROGRESS_CLOSE_DELAY_MS,
            last_path: None,
            extra_histograms: false,
            analysis: AnalysisSettings::default(),
            histogram_bins: HistogramBins::default(),
        }
    }
}

impl AppConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let path = config_path().ok_or_else(|| {
            WorkshopError::Config("Could not determine config path".to_string())
        })?;

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| WorkshopError::Config(format!("Failed to read config: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| WorkshopError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, returning defaults on any error
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let dir = ensure_app_data_dir()?;
        self.save_to(dir.join(CONFIG_FILE))
    }

    /// Save configuration to an explicit file
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| WorkshopError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path.as_ref(), content)
            .map_err(|e| WorkshopError::Config(format!("Failed to write config: {}", e)))
    }

    pub fn validate(&self) -> Result<()> {
        self.analysis.validate()?;
        for (_, layout) in self.histogram_bins.iter() {
            layout.validate()?;
        }
        Ok(())
    }

    /// Resolve where trace output goes for an instance
    ///
    /// Without a configured path the app data directory is used. A directory
    /// resolves to `<instance name>.txt` with dots replaced by underscores,
    /// or `trace.txt` when the instance is unnamed.
    pub fn trace_path(&self, instance_name: &str) -> PathBuf {
        let base = match &self.trace_file {
            Some(path) if !path.as_os_str().is_empty() => path.clone(),
            _ => app_data_dir().unwrap_or_else(|| PathBuf::from(".")),
        };

        if base.is_dir() {
            let mut file_name = instance_name.replace('.', "_");
            if file_name.is_empty() {
                file_name = DEFAULT_TRACE_NAME.to_string();
            }
            base.join(format!("{}.txt", file_name))
        } else {
            base
        }
    }

    /// Directory for rolling log files
    pub fn log_dir() -> Option<PathBuf> {
        app_data_dir().map(|p| p.join(LOG_DIR))
    }
}
