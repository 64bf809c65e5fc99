//! Geometry cache - the placement of every item, per column.
//!
//! The cache owns all placement records. Readers (visible range, render
//! adapter, engine queries) get shared references; writes are crate-private
//! and happen only when the reflow coordinator commits a pass.
//!
//! # Invariants
//! - Slots in a column are in ascending `seq` order.
//! - `top(k + 1) == top(k) + height(k) + gap` for adjacent slots.
//! - `cursor(c) == top(last) + height(last) + gap`, or 0 for an empty column.

use super::layout_config::LayoutConfig;
use super::types::{ColumnIndex, ItemHeight, PxOffset, Seq};
use serde::Serialize;
use std::collections::HashMap;

/// One placed item inside a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    seq: Seq,
    top: PxOffset,
    height: ItemHeight,
    width: Option<u32>,
}

impl Slot {
    pub(crate) fn new(seq: Seq, top: PxOffset, height: ItemHeight, width: Option<u32>) -> Self {
        Self {
            seq,
            top,
            height,
            width,
        }
    }

    /// Item this slot holds.
    pub fn seq(&self) -> Seq {
        self.seq
    }

    /// Offset of the item's top edge.
    pub fn top(&self) -> PxOffset {
        self.top
    }

    /// Item height.
    pub fn height(&self) -> ItemHeight {
        self.height
    }

    /// Item width (declared, else column width).
    pub fn width(&self) -> Option<u32> {
        self.width
    }

    /// Offset of the item's bottom edge. Equal to `top + height`.
    pub fn bottom(&self) -> PxOffset {
        self.top.below(self.height)
    }
}

/// Items assigned to one column, in stacking order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnState {
    slots: Vec<Slot>,
    cursor: PxOffset,
}

impl ColumnState {
    /// Slots from top to bottom.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Where the next item in this column would start.
    pub fn cursor(&self) -> PxOffset {
        self.cursor
    }

    /// Bottom edge of the last item, 0 for an empty column.
    pub fn content_height(&self) -> PxOffset {
        self.slots.last().map_or(PxOffset::ZERO, Slot::bottom)
    }

    /// Number of items in the column.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if nothing was placed in this column.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Position of an item within the column. O(log n).
    pub fn slot_of(&self, seq: Seq) -> Option<usize> {
        self.slots.binary_search_by_key(&seq, Slot::seq).ok()
    }

    pub(crate) fn push(&mut self, slot: Slot, gap: u32) {
        assert_eq!(
            slot.top, self.cursor,
            "appended slot must start at the column cursor"
        );
        if let Some(last) = self.slots.last() {
            assert!(last.seq < slot.seq, "slots must stay in seq order");
        }
        self.cursor = slot.bottom().saturating_add(u64::from(gap));
        self.slots.push(slot);
    }

    /// Replace every slot from `from` onward.
    ///
    /// The new suffix must chain off the kept prefix; a broken chain means
    /// the replay was computed from stale geometry, so this panics rather
    /// than corrupt the column.
    pub(crate) fn replace_suffix(&mut self, from: usize, suffix: Vec<Slot>, cursor: PxOffset, gap: u32) {
        assert!(from <= self.slots.len(), "suffix start {from} out of bounds");
        self.slots.truncate(from);
        let mut expected = self
            .slots
            .last()
            .map_or(PxOffset::ZERO, |s| s.bottom().saturating_add(u64::from(gap)));
        for slot in &suffix {
            assert_eq!(slot.top, expected, "column replay broke the stacking chain");
            expected = slot.bottom().saturating_add(u64::from(gap));
        }
        assert_eq!(cursor, expected, "column cursor out of sync with its slots");
        self.slots.extend(suffix);
        self.cursor = cursor;
    }

    pub(crate) fn from_slots(slots: Vec<Slot>, cursor: PxOffset) -> Self {
        Self { slots, cursor }
    }
}

/// Resolved placement of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
    /// Column the item lives in.
    pub column: ColumnIndex,
    /// Offset of the item's top edge.
    pub top: PxOffset,
    /// Item height.
    pub height: ItemHeight,
    /// Horizontal offset of the column, when the column width is known.
    pub left: Option<PxOffset>,
    /// Item width, when known.
    pub width: Option<u32>,
}

/// Placement store for the current layout epoch.
#[derive(Debug, Clone)]
pub struct GeometryCache {
    config: LayoutConfig,
    epoch: u64,
    generation: u64,
    columns: Vec<ColumnState>,
    column_of: HashMap<Seq, ColumnIndex>,
}

impl GeometryCache {
    /// Empty cache with `config.column_count()` empty columns.
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            epoch: 0,
            generation: 0,
            columns: vec![ColumnState::default(); config.column_count()],
            column_of: HashMap::new(),
        }
    }

    /// Configuration of the current epoch.
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Incremented every time a full pass commits a new configuration.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Incremented every time any full pass commits.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// All columns.
    pub fn columns(&self) -> &[ColumnState] {
        &self.columns
    }

    /// One column.
    pub fn column(&self, column: ColumnIndex) -> Option<&ColumnState> {
        self.columns.get(column.get())
    }

    /// Content height of every column.
    pub fn column_heights(&self) -> Vec<PxOffset> {
        self.columns.iter().map(ColumnState::content_height).collect()
    }

    /// Content height of the shortest column.
    pub fn shortest_column_height(&self) -> PxOffset {
        self.columns
            .iter()
            .map(ColumnState::content_height)
            .min()
            .unwrap_or(PxOffset::ZERO)
    }

    /// Content height of the tallest column (total scrollable height).
    pub fn content_height(&self) -> PxOffset {
        self.columns
            .iter()
            .map(ColumnState::content_height)
            .max()
            .unwrap_or(PxOffset::ZERO)
    }

    /// Number of placed items.
    pub fn len(&self) -> usize {
        self.column_of.len()
    }

    /// True when nothing is placed.
    pub fn is_empty(&self) -> bool {
        self.column_of.is_empty()
    }

    /// Column an item is assigned to.
    pub fn column_of(&self, seq: Seq) -> Option<ColumnIndex> {
        self.column_of.get(&seq).copied()
    }

    /// Slot of a placed item.
    pub fn slot(&self, seq: Seq) -> Option<&Slot> {
        let column = self.column_of(seq)?;
        let state = &self.columns[column.get()];
        state.slot_of(seq).map(|i| &state.slots[i])
    }

    /// Full placement record for a placed item.
    pub fn placement(&self, seq: Seq) -> Option<Placement> {
        let column = self.column_of(seq)?;
        let slot = self.slot(seq)?;
        Some(self.placement_of(column, slot))
    }

    /// Build the placement record for a slot in `column`.
    pub fn placement_of(&self, column: ColumnIndex, slot: &Slot) -> Placement {
        Placement {
            column,
            top: slot.top(),
            height: slot.height(),
            left: self.config.column_left(column),
            width: slot.width(),
        }
    }

    /// Every placement, ordered by `seq`.
    pub fn placements(&self) -> Vec<(Seq, Placement)> {
        let mut all: Vec<(Seq, Placement)> = self
            .columns
            .iter()
            .enumerate()
            .flat_map(|(c, state)| {
                state
                    .slots
                    .iter()
                    .map(move |slot| (slot.seq(), c, *slot))
            })
            .map(|(seq, c, slot)| (seq, self.placement_of(ColumnIndex::new(c), &slot)))
            .collect();
        all.sort_by_key(|(seq, _)| *seq);
        all
    }

    // === Writers (reflow coordinator only) ===

    pub(crate) fn apply_append(&mut self, column: ColumnIndex, slot: Slot) {
        let gap = self.config.gap();
        self.columns[column.get()].push(slot, gap);
        self.column_of.insert(slot.seq(), column);
    }

    pub(crate) fn apply_column_suffix(
        &mut self,
        column: ColumnIndex,
        from: usize,
        suffix: Vec<Slot>,
        cursor: PxOffset,
        removed: &[Seq],
    ) {
        let gap = self.config.gap();
        self.columns[column.get()].replace_suffix(from, suffix, cursor, gap);
        for seq in removed {
            self.column_of.remove(seq);
        }
    }

    /// Swap in a complete layout. Returns true if this started a new epoch.
    pub(crate) fn replace_all(&mut self, config: LayoutConfig, columns: Vec<ColumnState>) -> bool {
        assert_eq!(
            columns.len(),
            config.column_count(),
            "full layout must produce one state per column"
        );
        let new_epoch = config != self.config;
        self.column_of = columns
            .iter()
            .enumerate()
            .flat_map(|(c, state)| state.slots.iter().map(move |s| (s.seq(), ColumnIndex::new(c))))
            .collect();
        self.columns = columns;
        self.config = config;
        self.generation += 1;
        if new_epoch {
            self.epoch += 1;
        }
        new_epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(seq: u64, top: u64, height: u32) -> Slot {
        Slot::new(Seq::new(seq), PxOffset::new(top), ItemHeight::new(height), None)
    }

    mod column_state {
        use super::*;

        #[test]
        fn empty_column_has_zero_height() {
            let column = ColumnState::default();
            assert_eq!(column.content_height(), PxOffset::ZERO);
            assert_eq!(column.cursor(), PxOffset::ZERO);
            assert!(column.is_empty());
        }

        #[test]
        fn push_advances_cursor_by_height_and_gap() {
            let mut column = ColumnState::default();
            column.push(slot(0, 0, 100), 10);
            assert_eq!(column.cursor(), PxOffset::new(110));
            assert_eq!(column.content_height(), PxOffset::new(100));
        }

        #[test]
        #[should_panic(expected = "column cursor")]
        fn push_rejects_slot_not_at_cursor() {
            let mut column = ColumnState::default();
            column.push(slot(0, 5, 100), 0);
        }

        #[test]
        fn slot_of_finds_by_seq() {
            let mut column = ColumnState::default();
            column.push(slot(2, 0, 10), 0);
            column.push(slot(5, 10, 10), 0);
            column.push(slot(9, 20, 10), 0);
            assert_eq!(column.slot_of(Seq::new(5)), Some(1));
            assert_eq!(column.slot_of(Seq::new(4)), None);
        }

        #[test]
        fn replace_suffix_splices_new_tops() {
            let mut column = ColumnState::default();
            column.push(slot(0, 0, 100), 0);
            column.push(slot(3, 100, 50), 0);

            column.replace_suffix(0, vec![slot(0, 0, 200), slot(3, 200, 50)], PxOffset::new(250), 0);

            assert_eq!(column.slots()[1].top(), PxOffset::new(200));
            assert_eq!(column.content_height(), PxOffset::new(250));
        }

        #[test]
        #[should_panic(expected = "stacking chain")]
        fn replace_suffix_rejects_broken_chain() {
            let mut column = ColumnState::default();
            column.push(slot(0, 0, 100), 0);
            column.replace_suffix(1, vec![slot(3, 90, 50)], PxOffset::new(140), 0);
        }
    }

    mod cache {
        use super::*;

        fn config(columns: i64, gap: i64) -> LayoutConfig {
            LayoutConfig::new(columns, gap, Some(100)).unwrap()
        }

        #[test]
        fn new_cache_has_one_empty_column_per_config_column() {
            let cache = GeometryCache::new(config(4, 0));
            assert_eq!(cache.columns().len(), 4);
            assert!(cache.is_empty());
            assert_eq!(cache.column_heights(), vec![PxOffset::ZERO; 4]);
        }

        #[test]
        fn append_is_visible_through_placement() {
            let mut cache = GeometryCache::new(config(2, 8));
            cache.apply_append(ColumnIndex::new(1), slot(0, 0, 40));

            let placement = cache.placement(Seq::new(0)).unwrap();
            assert_eq!(placement.column, ColumnIndex::new(1));
            assert_eq!(placement.top, PxOffset::ZERO);
            assert_eq!(placement.left, Some(PxOffset::new(108)));
            assert_eq!(cache.len(), 1);
        }

        #[test]
        fn removal_through_suffix_forgets_the_item() {
            let mut cache = GeometryCache::new(config(1, 0));
            cache.apply_append(ColumnIndex::new(0), slot(0, 0, 40));
            cache.apply_append(ColumnIndex::new(0), slot(1, 40, 10));

            cache.apply_column_suffix(
                ColumnIndex::new(0),
                0,
                vec![slot(1, 0, 10)],
                PxOffset::new(10),
                &[Seq::new(0)],
            );

            assert_eq!(cache.placement(Seq::new(0)), None);
            assert_eq!(cache.placement(Seq::new(1)).unwrap().top, PxOffset::ZERO);
        }

        #[test]
        fn replace_all_bumps_epoch_only_on_config_change() {
            let mut cache = GeometryCache::new(config(2, 0));

            assert!(!cache.replace_all(config(2, 0), vec![ColumnState::default(); 2]));
            assert_eq!(cache.epoch(), 0);
            assert_eq!(cache.generation(), 1);

            assert!(cache.replace_all(config(3, 0), vec![ColumnState::default(); 3]));
            assert_eq!(cache.epoch(), 1);
            assert_eq!(cache.generation(), 2);
        }

        #[test]
        fn shortest_and_tallest_heights() {
            let mut cache = GeometryCache::new(config(3, 0));
            cache.apply_append(ColumnIndex::new(0), slot(0, 0, 100));
            cache.apply_append(ColumnIndex::new(1), slot(1, 0, 40));
            assert_eq!(cache.shortest_column_height(), PxOffset::ZERO);
            assert_eq!(cache.content_height(), PxOffset::new(100));
        }

        #[test]
        fn placements_are_ordered_by_seq() {
            let mut cache = GeometryCache::new(config(2, 0));
            cache.apply_append(ColumnIndex::new(0), slot(0, 0, 100));
            cache.apply_append(ColumnIndex::new(1), slot(1, 0, 40));
            cache.apply_append(ColumnIndex::new(1), slot(2, 40, 40));
            let seqs: Vec<_> = cache.placements().into_iter().map(|(s, _)| s.get()).collect();
            assert_eq!(seqs, vec![0, 1, 2]);
        }
    }
}
