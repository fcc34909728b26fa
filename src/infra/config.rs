//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/dev.toml
//!
//! Every section is optional; a missing file falls back to defaults.

use crate::domain::window::{parse_reference_date, TimeWindow, MAX_LOOKBACK_DAYS};
use crate::services::exposure_table::ExposureTable;
use anyhow::{ensure, Context};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use tracing::warn;

const DEFAULT_CONFIG_PATH: &str = "config/dev.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct WindowConfig {
    /// Days before the reference date to consider
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
    /// Fixed reference date (YYYY-MM-DD or RFC 3339); now when absent
    #[serde(default)]
    pub reference_date: Option<String>,
}

fn default_lookback_days() -> u32 {
    15
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { lookback_days: default_lookback_days(), reference_date: None }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Unpacked Takeout folder, or a single month file
    #[serde(default = "default_export_path")]
    pub path: String,
    /// Read every JSON file instead of only the months covering the window
    #[serde(default)]
    pub all_files: bool,
}

fn default_export_path() -> String {
    "Takeout".to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { path: default_export_path(), all_files: false }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ExposureTableConfig {
    /// Use only `[[exposures]]` instead of adding them to the built-in table
    #[serde(default)]
    pub replace_builtin: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExposureEntry {
    pub place_id: String,
    pub start_ms: i64,
    pub end_ms: i64,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct EgressConfig {
    /// JSONL dump of the visits that were checked
    #[serde(default)]
    pub visits_file: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub exposure_table: ExposureTableConfig,
    #[serde(default)]
    pub exposures: Vec<ExposureEntry>,
    #[serde(default)]
    pub egress: EgressConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    lookback_days: u32,
    reference_date: Option<DateTime<Utc>>,
    export_path: String,
    all_files: bool,
    replace_builtin_exposures: bool,
    exposures: Vec<ExposureEntry>,
    visits_file: Option<String>,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lookback_days: default_lookback_days(),
            reference_date: None,
            export_path: default_export_path(),
            all_files: false,
            replace_builtin_exposures: false,
            exposures: Vec::new(),
            visits_file: None,
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    /// Determine config file path: `--config` value, then environment, then default
    pub fn resolve_config_path(flag: Option<&str>) -> String {
        if let Some(path) = flag {
            return path.to_string();
        }

        if let Ok(path) = env::var("CONFIG_FILE") {
            return path;
        }

        DEFAULT_CONFIG_PATH.to_string()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Self::from_toml(toml_config, &path.display().to_string())
    }

    fn from_toml(toml_config: TomlConfig, config_file: &str) -> anyhow::Result<Self> {
        let reference_date = toml_config
            .window
            .reference_date
            .as_deref()
            .map(parse_reference_date)
            .transpose()
            .with_context(|| format!("Invalid [window] reference_date in {}", config_file))?;

        ensure!(
            toml_config.window.lookback_days <= MAX_LOOKBACK_DAYS,
            "[window] lookback_days = {} in {} exceeds the maximum of {} days",
            toml_config.window.lookback_days,
            config_file,
            MAX_LOOKBACK_DAYS
        );

        for entry in &toml_config.exposures {
            ensure!(
                entry.start_ms <= entry.end_ms,
                "Exposure window for {} ends before it starts ({} > {})",
                entry.place_id,
                entry.start_ms,
                entry.end_ms
            );
        }

        Ok(Self {
            lookback_days: toml_config.window.lookback_days,
            reference_date,
            export_path: toml_config.export.path,
            all_files: toml_config.export.all_files,
            replace_builtin_exposures: toml_config.exposure_table.replace_builtin,
            exposures: toml_config.exposures,
            visits_file: toml_config.egress.visits_file,
            config_file: config_file.to_string(),
        })
    }

    /// Load configuration - tries TOML file first, falls back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %format!("{:#}", e), "config_fallback_to_defaults");
                Self::default()
            }
        }
    }

    /// Exposure table: built-in windows plus configured ones, or configured only
    pub fn exposure_table(&self) -> ExposureTable {
        let mut table = if self.replace_builtin_exposures {
            ExposureTable::new()
        } else {
            ExposureTable::shared_builtin().clone()
        };
        for entry in &self.exposures {
            table.insert(&entry.place_id, TimeWindow::from_millis(entry.start_ms, entry.end_ms));
        }
        table
    }

    pub fn lookback_days(&self) -> u32 {
        self.lookback_days
    }

    pub fn reference_date(&self) -> Option<DateTime<Utc>> {
        self.reference_date
    }

    pub fn export_path(&self) -> &str {
        &self.export_path
    }

    pub fn all_files(&self) -> bool {
        self.all_files
    }

    pub fn visits_file(&self) -> Option<&str> {
        self.visits_file.as_deref()
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    // Command-line overrides

    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days;
        self
    }

    pub fn with_reference_date(mut self, reference: DateTime<Utc>) -> Self {
        self.reference_date = Some(reference);
        self
    }

    pub fn with_export_path(mut self, path: &str) -> Self {
        self.export_path = path.to_string();
        self
    }

    pub fn with_all_files(mut self, all_files: bool) -> Self {
        self.all_files = all_files;
        self
    }

    pub fn with_visits_file(mut self, path: &str) -> Self {
        self.visits_file = Some(path.to_string());
        self
    }
}
