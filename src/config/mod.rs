//! Configuration module.
//!
//! [`EngineSettings`] is what a [`MasonryEngine`](crate::engine::MasonryEngine)
//! is built from. The [`loader`] submodule resolves it from defaults, a TOML
//! file, environment variables and CLI flags.

pub mod loader;

pub use loader::{
    apply_cli_overrides, apply_env_overrides, default_config_path, default_log_path,
    load_config_file, load_config_with_precedence, merge_config, ConfigError, ConfigFile,
    ResolvedConfig,
};

use crate::layout::layout_config::LayoutConfig;
use crate::model::error::ConfigurationError;

/// Default number of columns.
pub const DEFAULT_COLUMNS: i64 = 3;
/// Default overscan above and below the viewport.
pub const DEFAULT_BUFFER_PX: u64 = 200;
/// Default distance from the end at which more items are requested.
pub const DEFAULT_LOAD_MORE_THRESHOLD_PX: u64 = 400;
/// Default quiet period before a resize triggers a full relayout.
pub const DEFAULT_RESIZE_DEBOUNCE_MS: u64 = 150;

/// Engine settings as supplied by the host.
///
/// Layout values are kept signed so invalid input survives until
/// [`validate`](Self::validate) can report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Number of columns (>= 1).
    pub columns: i64,
    /// Gap between stacked items and between columns (>= 0).
    pub gap: i64,
    /// Column width in pixels, if known (> 0).
    pub column_width: Option<i64>,
    /// Height assumed for items with neither a declared nor a measured height.
    pub placeholder_height: u32,
    /// Overscan above and below the viewport.
    pub buffer_px: u64,
    /// Fire "load more" when the shortest column ends this close to the viewport bottom.
    pub load_more_threshold_px: u64,
    /// Quiet period before a resize runs the full relayout.
    pub resize_debounce_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS,
            gap: 0,
            column_width: None,
            placeholder_height: 0,
            buffer_px: DEFAULT_BUFFER_PX,
            load_more_threshold_px: DEFAULT_LOAD_MORE_THRESHOLD_PX,
            resize_debounce_ms: DEFAULT_RESIZE_DEBOUNCE_MS,
        }
    }
}

impl EngineSettings {
    /// Check the layout values and build the initial [`LayoutConfig`].
    ///
    /// # Errors
    /// Any [`ConfigurationError`] from [`LayoutConfig::new`].
    pub fn validate(&self) -> Result<LayoutConfig, ConfigurationError> {
        LayoutConfig::new(self.columns, self.gap, self.column_width)
    }
}
