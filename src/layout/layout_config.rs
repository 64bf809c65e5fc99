//! Layout configuration for one layout epoch.

use super::types::{ColumnIndex, PxOffset};
use crate::model::error::ConfigurationError;

/// Largest column count a layout accepts.
///
/// Every pass allocates per-column state, so the count is bounded well
/// below anything a real container can display.
pub const MAX_COLUMNS: usize = 1024;

/// Parameters that determine column membership.
///
/// Immutable during a layout epoch. Any change starts a new epoch and forces a
/// full relayout, since every column assignment is invalid under a different
/// column count or width.
///
/// # Invariants
/// - `1 <= column_count <= MAX_COLUMNS`
/// - `column_width`, when set, is `> 0`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutConfig {
    column_count: usize,
    gap: u32,
    column_width: Option<u32>,
}

impl LayoutConfig {
    /// Validate and build a layout configuration.
    ///
    /// Takes signed values so that out-of-range input from a host or config
    /// file can be reported instead of wrapping.
    ///
    /// # Errors
    /// - [`ConfigurationError::InvalidColumnCount`] if `column_count` is not in
    ///   `1..=MAX_COLUMNS`
    /// - [`ConfigurationError::NegativeGap`] if `gap < 0`
    /// - [`ConfigurationError::InvalidColumnWidth`] if `column_width <= 0`
    ///
    /// # Examples
    /// ```
    /// # use waterfall::layout::layout_config::LayoutConfig;
    /// let config = LayoutConfig::new(3, 8, Some(240)).unwrap();
    /// assert_eq!(config.column_count(), 3);
    /// assert!(LayoutConfig::new(0, 8, None).is_err());
    /// ```
    pub fn new(
        column_count: i64,
        gap: i64,
        column_width: Option<i64>,
    ) -> Result<Self, ConfigurationError> {
        if column_count < 1 {
            return Err(ConfigurationError::InvalidColumnCount(column_count));
        }
        let column_count = usize::try_from(column_count)
            .ok()
            .filter(|count| *count <= MAX_COLUMNS)
            .ok_or(ConfigurationError::InvalidColumnCount(column_count))?;
        if gap < 0 {
            return Err(ConfigurationError::NegativeGap(gap));
        }
        let gap = u32::try_from(gap).map_err(|_| ConfigurationError::NegativeGap(gap))?;
        let column_width = match column_width {
            None => None,
            Some(width) if width <= 0 => {
                return Err(ConfigurationError::InvalidColumnWidth(width));
            }
            Some(width) => Some(
                u32::try_from(width).map_err(|_| ConfigurationError::InvalidColumnWidth(width))?,
            ),
        };
        Ok(Self {
            column_count,
            gap,
            column_width,
        })
    }

    /// Number of columns (always >= 1).
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Vertical gap between stacked items, and horizontal gap between columns.
    pub fn gap(&self) -> u32 {
        self.gap
    }

    /// Column width, if the host has resolved it.
    pub fn column_width(&self) -> Option<u32> {
        self.column_width
    }

    /// Horizontal offset of a column's left edge, if the width is known.
    pub fn column_left(&self, column: ColumnIndex) -> Option<PxOffset> {
        self.column_width.map(|width| {
            PxOffset::new(column.get() as u64 * (u64::from(width) + u64::from(self.gap)))
        })
    }

    /// Same config with a different column count and width.
    pub fn resized(
        &self,
        column_count: i64,
        column_width: Option<i64>,
    ) -> Result<Self, ConfigurationError> {
        Self::new(column_count, i64::from(self.gap), column_width)
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            column_count: 3,
            gap: 0,
            column_width: None,
        }
    }
}
