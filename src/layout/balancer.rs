//! Column balancer - greedy placement and column replay.
//!
//! All functions here are pure: they read the geometry cache and item table
//! and return what the new geometry should be. The reflow coordinator stages
//! the result and decides whether to commit it.
//!
//! # Placement rule
//! An appended item goes to `argmin_c cursor(c)`, ties broken by the lowest
//! column index. Its top is that column's cursor. Greedy online placement
//! keeps `max(height) - min(height) <= max(item height)` as long as nothing
//! is corrected or removed afterwards.
//!
//! # Reflow rule
//! A height correction or removal never moves items between columns. Only
//! the owning column is replayed, from the changed slot down. Columns drift
//! slightly out of balance over many corrections; a full relayout (only on
//! config change, or explicitly) rebalances them.
//!
//! # Complexity
//!
//! - `choose_column`: O(columns)
//! - `plan_append`: O(columns)
//! - `replay_column`: O(log k + items below the change), k = items in the column
//! - `layout_all`: O(items * log columns)

use super::geometry::{ColumnState, GeometryCache, Slot};
use super::items::ItemTable;
use super::layout_config::LayoutConfig;
use super::types::{ColumnIndex, ItemHeight, PxOffset, Seq};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Pick the column with the lowest cursor; lowest index wins ties.
///
/// # Panics
/// Panics if `columns` is empty (configuration guarantees at least one).
pub fn choose_column(columns: &[ColumnState]) -> ColumnIndex {
    let (index, _) = columns
        .iter()
        .enumerate()
        .min_by_key(|(i, column)| (column.cursor(), *i))
        .expect("layout always has at least one column");
    ColumnIndex::new(index)
}

/// Placement of a newly appended item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendPlan {
    /// Column chosen by the greedy rule.
    pub column: ColumnIndex,
    /// Slot to push onto that column.
    pub slot: Slot,
}

/// Plan the placement of item `seq` with the given height.
pub fn plan_append(
    cache: &GeometryCache,
    seq: Seq,
    height: ItemHeight,
    width: Option<u32>,
) -> AppendPlan {
    let column = choose_column(cache.columns());
    let top = cache.columns()[column.get()].cursor();
    let width = width.or(cache.config().column_width());
    AppendPlan {
        column,
        slot: Slot::new(seq, top, height, width),
    }
}

/// Replacement for the tail of one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnReplay {
    /// Column being replayed.
    pub column: ColumnIndex,
    /// First slot index that is replaced.
    pub from: usize,
    /// New slots from `from` to the end of the column.
    pub suffix: Vec<Slot>,
    /// Cursor after the last new slot.
    pub cursor: PxOffset,
    /// Items dropped from the column because they are no longer live.
    pub removed: Vec<Seq>,
}

/// Recompute tops in `column` from slot `from` downward.
///
/// Heights are re-read from `items`, so a measurement already recorded there
/// is picked up. Slots whose item has been removed from `items` are dropped.
/// Surviving items keep their column.
pub fn replay_column(
    cache: &GeometryCache,
    items: &ItemTable,
    column: ColumnIndex,
    from: usize,
) -> ColumnReplay {
    let gap = u64::from(cache.config().gap());
    let slots = cache.columns()[column.get()].slots();
    let from = from.min(slots.len());

    let mut top = if from == 0 {
        PxOffset::ZERO
    } else {
        slots[from - 1].bottom().saturating_add(gap)
    };

    let mut suffix = Vec::with_capacity(slots.len() - from);
    let mut removed = Vec::new();
    for slot in &slots[from..] {
        let Some(height) = items.height_of(slot.seq()) else {
            removed.push(slot.seq());
            continue;
        };
        suffix.push(Slot::new(slot.seq(), top, height, slot.width()));
        top = top.below(height).saturating_add(gap);
    }

    ColumnReplay {
        column,
        from,
        suffix,
        cursor: top,
        removed,
    }
}

/// Replay the column owning `seq`, starting at that item.
///
/// Returns `None` if the item is not placed.
pub fn replay_from_seq(cache: &GeometryCache, items: &ItemTable, seq: Seq) -> Option<ColumnReplay> {
    let column = cache.column_of(seq)?;
    let from = cache.columns()[column.get()].slot_of(seq)?;
    Some(replay_column(cache, items, column, from))
}

/// Greedy layout of every live item from scratch, in `seq` order.
///
/// Deterministic: the same config and item table always produce the same
/// columns, which makes repeated full relayouts idempotent.
pub fn layout_all(config: &LayoutConfig, items: &ItemTable) -> Vec<ColumnState> {
    let gap = u64::from(config.gap());
    let count = config.column_count();
    let mut slots: Vec<Vec<Slot>> = vec![Vec::new(); count];
    let mut cursors = vec![PxOffset::ZERO; count];

    // Min-heap on (cursor, column) gives the lowest-index tie break for free.
    let mut heap: BinaryHeap<Reverse<(PxOffset, usize)>> =
        (0..count).map(|c| Reverse((PxOffset::ZERO, c))).collect();

    for record in items.iter() {
        let Some(Reverse((top, column))) = heap.pop() else {
            unreachable!("heap always holds one entry per column");
        };
        let height = record.effective_height(items.placeholder_height());
        let width = record.width().or(config.column_width());
        slots[column].push(Slot::new(record.seq(), top, height, width));
        let cursor = top.below(height).saturating_add(gap);
        cursors[column] = cursor;
        heap.push(Reverse((cursor, column)));
    }

    slots
        .into_iter()
        .zip(cursors)
        .map(|(slots, cursor)| ColumnState::from_slots(slots, cursor))
        .collect()
}
