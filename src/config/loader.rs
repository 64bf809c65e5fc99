//! Configuration file loading with precedence handling.

use super::{
    EngineSettings, DEFAULT_BUFFER_PX, DEFAULT_COLUMNS, DEFAULT_LOAD_MORE_THRESHOLD_PX,
    DEFAULT_RESIZE_DEBOUNCE_MS,
};
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "WATERFALL_CONFIG";
/// Environment variable overriding the column count.
pub const COLUMNS_ENV: &str = "WATERFALL_COLUMNS";
/// Environment variable overriding the gap.
pub const GAP_ENV: &str = "WATERFALL_GAP";

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Failed to read config file (permission issues, not a file).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML, or a field this version does not know.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },
}

/// TOML configuration file structure.
///
/// All fields are optional - if not specified, hardcoded defaults are used.
/// Corresponds to `~/.config/waterfall/config.toml`.
///
/// ```toml
/// columns = 4
/// gap = 12
/// column_width = 240
/// placeholder_height = 180
/// buffer_px = 400
/// load_more_threshold_px = 600
/// resize_debounce_ms = 100
/// log_file_path = "/tmp/waterfall.log"
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Number of columns.
    #[serde(default)]
    pub columns: Option<i64>,

    /// Gap between items and columns.
    #[serde(default)]
    pub gap: Option<i64>,

    /// Column width in pixels.
    #[serde(default)]
    pub column_width: Option<i64>,

    /// Height assumed for unmeasured items without a declared height.
    #[serde(default)]
    pub placeholder_height: Option<u32>,

    /// Overscan above and below the viewport.
    #[serde(default)]
    pub buffer_px: Option<u64>,

    /// Distance from the end at which more items are requested.
    #[serde(default)]
    pub load_more_threshold_px: Option<u64>,

    /// Quiet period before a resize runs the full relayout.
    #[serde(default)]
    pub resize_debounce_ms: Option<u64>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,
}

/// Resolved configuration after applying precedence rules.
///
/// Created by merging defaults, config file, env vars, and CLI args. Layout
/// values are not validated here; [`EngineSettings::validate`] does that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Number of columns.
    pub columns: i64,
    /// Gap between items and columns.
    pub gap: i64,
    /// Column width, if known.
    pub column_width: Option<i64>,
    /// Placeholder height.
    pub placeholder_height: u32,
    /// Viewport overscan.
    pub buffer_px: u64,
    /// Load-more distance.
    pub load_more_threshold_px: u64,
    /// Resize debounce.
    pub resize_debounce_ms: u64,
    /// Path to log file for tracing output.
    pub log_file_path: PathBuf,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS,
            gap: 0,
            column_width: None,
            placeholder_height: 0,
            buffer_px: DEFAULT_BUFFER_PX,
            load_more_threshold_px: DEFAULT_LOAD_MORE_THRESHOLD_PX,
            resize_debounce_ms: DEFAULT_RESIZE_DEBOUNCE_MS,
            log_file_path: default_log_path(),
        }
    }
}

impl ResolvedConfig {
    /// Engine settings carried by this configuration.
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            columns: self.columns,
            gap: self.gap,
            column_width: self.column_width,
            placeholder_height: self.placeholder_height,
            buffer_px: self.buffer_px,
            load_more_threshold_px: self.load_more_threshold_px,
            resize_debounce_ms: self.resize_debounce_ms,
        }
    }
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/waterfall/waterfall.log` on Linux, or the
/// platform's state directory elsewhere.
///
/// If state directory cannot be determined, falls back to current directory.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join("waterfall").join("waterfall.log")
    } else {
        PathBuf::from("waterfall.log")
    }
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if file doesn't exist (not an error - use defaults).
///
/// # Errors
///
/// Returns error if file exists but has read or parse errors.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    // Missing file is not an error - use defaults
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Resolve default config file path.
///
/// Returns `~/.config/waterfall/config.toml` on Linux, appropriate path on other platforms.
/// Returns `None` if the config directory cannot be determined.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("waterfall").join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (CLI `--config`)
/// 2. `WATERFALL_CONFIG` environment variable
/// 3. Default path `~/.config/waterfall/config.toml`
///
/// Missing config files are NOT errors - defaults are used.
///
/// # Errors
///
/// Returns error only if a config file exists but cannot be read or parsed.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

fn env_i64(name: &str) -> Option<i64> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "ignoring non-numeric environment override");
            None
        }
    }
}

/// Apply environment variable overrides to resolved config.
///
/// Checks for:
/// - `WATERFALL_COLUMNS`: override column count
/// - `WATERFALL_GAP`: override gap
///
/// Values that are not integers are ignored.
pub fn apply_env_overrides(mut config: ResolvedConfig) -> ResolvedConfig {
    if let Some(columns) = env_i64(COLUMNS_ENV) {
        config.columns = columns;
    }

    if let Some(gap) = env_i64(GAP_ENV) {
        config.gap = gap;
    }

    config
}

/// Merge config file into defaults to create resolved config.
///
/// For each field in `ConfigFile`, if `Some(value)`, use it; otherwise use default.
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return defaults;
    };

    ResolvedConfig {
        columns: config.columns.unwrap_or(defaults.columns),
        gap: config.gap.unwrap_or(defaults.gap),
        column_width: config.column_width.or(defaults.column_width),
        placeholder_height: config
            .placeholder_height
            .unwrap_or(defaults.placeholder_height),
        buffer_px: config.buffer_px.unwrap_or(defaults.buffer_px),
        load_more_threshold_px: config
            .load_more_threshold_px
            .unwrap_or(defaults.load_more_threshold_px),
        resize_debounce_ms: config
            .resize_debounce_ms
            .unwrap_or(defaults.resize_debounce_ms),
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
    }
}

/// Apply CLI argument overrides to resolved config.
///
/// CLI args have the highest precedence and override all other sources.
/// Only applies overrides for flags that were explicitly set by the user.
///
/// Precedence chain: Defaults → Config File → Env Vars → CLI Args (highest)
pub fn apply_cli_overrides(
    mut config: ResolvedConfig,
    columns_override: Option<i64>,
    gap_override: Option<i64>,
    column_width_override: Option<i64>,
) -> ResolvedConfig {
    if let Some(columns) = columns_override {
        config.columns = columns;
    }

    if let Some(gap) = gap_override {
        config.gap = gap;
    }

    if let Some(width) = column_width_override {
        config.column_width = Some(width);
    }

    config
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
