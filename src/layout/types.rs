//! Core layout newtypes

use serde::Serialize;

/// Height of an item in whole pixels.
///
/// Zero is legal: a placeholder that has not painted yet occupies no space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct ItemHeight(u32);

impl ItemHeight {
    /// Zero-height placeholder.
    pub const ZERO: Self = Self(0);

    /// Create a height from a raw pixel count.
    pub const fn new(px: u32) -> Self {
        Self(px)
    }

    /// Convert a measured (possibly fractional) height into whole pixels.
    ///
    /// Rounds up so measured content is never clipped.
    ///
    /// # Panics
    /// Panics if `px` is negative, NaN or infinite. A measurement like that
    /// means the render layer is broken, and placing it would corrupt every
    /// item below it.
    ///
    /// # Examples
    /// ```
    /// # use waterfall::layout::types::ItemHeight;
    /// assert_eq!(ItemHeight::from_measured(99.2).get(), 100);
    /// assert_eq!(ItemHeight::from_measured(0.0).get(), 0);
    /// ```
    pub fn from_measured(px: f64) -> Self {
        assert!(
            px.is_finite() && px >= 0.0,
            "measured height must be a finite, non-negative pixel count (got {px})"
        );
        let rounded = px.ceil();
        assert!(
            rounded <= u32::MAX as f64,
            "measured height {px} does not fit in u32 pixels"
        );
        Self(rounded as u32)
    }

    /// Get the raw pixel count.
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl From<u32> for ItemHeight {
    fn from(px: u32) -> Self {
        Self(px)
    }
}

/// Absolute vertical offset in pixels from the top of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct PxOffset(u64);

impl PxOffset {
    /// Offset zero (top of the grid).
    pub const ZERO: Self = Self(0);

    /// Create a new offset from a raw value.
    pub const fn new(offset: u64) -> Self {
        Self(offset)
    }

    /// Get the raw pixel value.
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Offset of the edge directly below an item of `height` starting here.
    pub fn below(&self, height: ItemHeight) -> Self {
        Self(self.0 + u64::from(height.get()))
    }

    /// Add an amount to this offset, saturating at u64::MAX.
    pub fn saturating_add(&self, amount: u64) -> Self {
        Self(self.0.saturating_add(amount))
    }

    /// Subtract an amount from this offset, saturating at 0.
    pub fn saturating_sub(&self, amount: u64) -> Self {
        Self(self.0.saturating_sub(amount))
    }
}

/// Insertion order of an item. Monotonic, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Seq(u64);

impl Seq {
    /// Create a sequence number from a raw value.
    pub const fn new(seq: u64) -> Self {
        Self(seq)
    }

    /// Get the raw value.
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// The sequence number handed out after this one.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

/// Column index, 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct ColumnIndex(usize);

impl ColumnIndex {
    /// Create a column index from a raw value.
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the raw 0-based index.
    pub const fn get(&self) -> usize {
        self.0
    }
}

impl From<usize> for ColumnIndex {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

/// Scroll state reported by the host.
///
/// `buffer_px` extends the window on both sides so items just off screen
/// are materialized before they scroll in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewportState {
    /// Distance scrolled from the top of the grid.
    pub scroll_offset: PxOffset,
    /// Visible height of the scroll container.
    pub viewport_height: u64,
    /// Overscan on each side of the viewport.
    pub buffer_px: u64,
}

impl ViewportState {
    /// Create a new viewport state.
    pub fn new(scroll_offset: u64, viewport_height: u64, buffer_px: u64) -> Self {
        Self {
            scroll_offset: PxOffset::new(scroll_offset),
            viewport_height,
            buffer_px,
        }
    }

    /// Top edge of the buffered window (inclusive).
    pub fn window_start(&self) -> PxOffset {
        self.scroll_offset.saturating_sub(self.buffer_px)
    }

    /// Bottom edge of the buffered window (inclusive).
    pub fn window_end(&self) -> PxOffset {
        self.scroll_offset
            .saturating_add(self.viewport_height)
            .saturating_add(self.buffer_px)
    }

    /// Bottom edge of the unbuffered viewport.
    pub fn viewport_bottom(&self) -> PxOffset {
        self.scroll_offset.saturating_add(self.viewport_height)
    }
}
