//! Visible range calculation

use super::geometry::{GeometryCache, Slot};
use super::types::{ColumnIndex, Seq, ViewportState};

/// Range of item sequence numbers touched by the current window.
///
/// `start_seq` is the smallest and `end_seq - 1` the largest visible `seq`.
/// Items in between may live in other columns and be off screen, so use
/// [`VisibleWindow::items`] for the exact set.
///
/// # Invariants
/// - `start_seq <= end_seq`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisibleRange {
    /// Smallest visible seq (inclusive).
    pub start_seq: Seq,
    /// One past the largest visible seq (exclusive).
    pub end_seq: Seq,
}

impl VisibleRange {
    /// Create new visible range.
    ///
    /// # Panics
    /// In debug builds, panics if `start_seq > end_seq`.
    pub fn new(start_seq: Seq, end_seq: Seq) -> Self {
        debug_assert!(
            start_seq <= end_seq,
            "start_seq {:?} must not exceed end_seq {:?}",
            start_seq,
            end_seq
        );
        Self { start_seq, end_seq }
    }

    /// Number of sequence numbers spanned.
    pub fn len(&self) -> usize {
        (self.end_seq.get() - self.start_seq.get()) as usize
    }

    /// Check if range is empty.
    pub fn is_empty(&self) -> bool {
        self.start_seq == self.end_seq
    }

    /// Iterate over spanned sequence numbers.
    pub fn seqs(&self) -> impl Iterator<Item = Seq> {
        (self.start_seq.get()..self.end_seq.get()).map(Seq::new)
    }

    /// Check if a sequence number falls inside the range.
    pub fn contains(&self, seq: Seq) -> bool {
        self.start_seq <= seq && seq < self.end_seq
    }
}

/// A visible item, with the column it was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleSlot {
    /// Column holding the item.
    pub column: ColumnIndex,
    /// The item's slot.
    pub slot: Slot,
}

/// Result of a visibility query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VisibleWindow {
    /// Seq bounds of the visible items.
    pub range: VisibleRange,
    /// Exactly the items intersecting the buffered window, ordered by seq.
    pub items: Vec<VisibleSlot>,
}

impl VisibleWindow {
    /// True if nothing should be materialized.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Items intersecting `[scroll - buffer, scroll + viewport_height + buffer]`.
///
/// Per column, binary-searches the first slot whose bottom edge reaches the
/// window, then walks down until a top edge passes the window. Both edges
/// are inclusive.
///
/// # Complexity
/// O(columns * log(items per column) + visible items)
///
/// # Edge cases
/// - No items: empty window.
/// - `viewport_height == 0`: empty window (nothing to render), not an error.
pub fn compute_visible_range(viewport: &ViewportState, cache: &GeometryCache) -> VisibleWindow {
    if cache.is_empty() || viewport.viewport_height == 0 {
        return VisibleWindow::default();
    }

    let window_start = viewport.window_start();
    let window_end = viewport.window_end();
    let mut items = Vec::new();

    for (index, column) in cache.columns().iter().enumerate() {
        let slots = column.slots();
        // Bottoms are non-decreasing within a column, so this is a valid
        // partition.
        let first = slots.partition_point(|s| s.bottom() < window_start);
        items.extend(
            slots[first..]
                .iter()
                .take_while(|s| s.top() <= window_end)
                .map(|slot| VisibleSlot {
                    column: ColumnIndex::new(index),
                    slot: *slot,
                }),
        );
    }

    items.sort_by_key(|v| v.slot.seq());

    let range = match (items.first(), items.last()) {
        (Some(first), Some(last)) => VisibleRange::new(first.slot.seq(), last.slot.seq().next()),
        _ => VisibleRange::default(),
    };

    VisibleWindow { range, items }
}
