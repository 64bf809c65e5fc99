//! Render adapter surface.
//!
//! The engine never draws. It tells the host which items to materialize and
//! where, through [`RenderAdapter`], and the [`Materializer`] keeps those
//! calls minimal by diffing against what the host already has mounted.

use super::geometry::Placement;
use super::types::{ColumnIndex, ItemHeight, PxOffset, Seq};
use crate::model::identifiers::ItemId;
use serde::Serialize;
use std::collections::BTreeMap;

/// A visible item with its absolute position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisibleItem {
    /// Host identifier.
    pub id: ItemId,
    /// Insertion order.
    pub seq: Seq,
    /// Assigned column.
    pub column: ColumnIndex,
    /// Offset from the top of the grid.
    pub top: PxOffset,
    /// Height used for layout.
    pub height: ItemHeight,
    /// Horizontal offset, when the column width is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<PxOffset>,
    /// Width, when declared or derivable from the column width.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
}

impl VisibleItem {
    /// Combine an identifier with its placement.
    pub fn new(id: ItemId, seq: Seq, placement: Placement) -> Self {
        Self {
            id,
            seq,
            column: placement.column,
            top: placement.top,
            height: placement.height,
            left: placement.left,
            width: placement.width,
        }
    }

    fn same_geometry(&self, other: &VisibleItem) -> bool {
        self.column == other.column
            && self.top == other.top
            && self.height == other.height
            && self.left == other.left
            && self.width == other.width
    }
}

/// Host-side materialization calls.
pub trait RenderAdapter {
    /// Create markup for an item entering the window.
    fn mount(&mut self, item: &VisibleItem);

    /// Move or resize an item that stays mounted.
    fn update(&mut self, item: &VisibleItem);

    /// Drop markup for an item that left the window or was removed.
    fn unmount(&mut self, id: &ItemId);
}

/// Counts of adapter calls made by one [`Materializer::sync`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RenderDiff {
    /// Items mounted.
    pub mounted: usize,
    /// Items updated in place.
    pub updated: usize,
    /// Items unmounted.
    pub unmounted: usize,
}

impl RenderDiff {
    /// True if no adapter call was made.
    pub fn is_empty(&self) -> bool {
        self.mounted == 0 && self.updated == 0 && self.unmounted == 0
    }
}

/// Tracks the mounted set and issues the calls needed to match `visible`.
#[derive(Debug, Clone, Default)]
pub struct Materializer {
    mounted: BTreeMap<ItemId, VisibleItem>,
}

impl Materializer {
    /// Nothing mounted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of mounted items.
    pub fn mounted_len(&self) -> usize {
        self.mounted.len()
    }

    /// True if `id` is currently mounted.
    pub fn is_mounted(&self, id: &ItemId) -> bool {
        self.mounted.contains_key(id)
    }

    /// Bring the adapter in line with `visible` (ordered by seq).
    ///
    /// Unmounts go first, in id order, then mounts and updates in seq order.
    /// An id removed and appended again carries a new seq; its old markup is
    /// unmounted and the new item mounted, whatever its geometry.
    pub fn sync<A: RenderAdapter + ?Sized>(&mut self, visible: &[VisibleItem], adapter: &mut A) -> RenderDiff {
        let mut diff = RenderDiff::default();

        let mut next: BTreeMap<ItemId, VisibleItem> = BTreeMap::new();
        for item in visible {
            next.insert(item.id.clone(), item.clone());
        }

        let gone: Vec<ItemId> = self
            .mounted
            .iter()
            .filter(|(id, mounted)| next.get(*id).map(|item| item.seq) != Some(mounted.seq))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &gone {
            adapter.unmount(id);
            diff.unmounted += 1;
        }

        for item in visible {
            match self.mounted.get(&item.id).filter(|previous| previous.seq == item.seq) {
                None => {
                    adapter.mount(item);
                    diff.mounted += 1;
                }
                Some(previous) if !previous.same_geometry(item) => {
                    adapter.update(item);
                    diff.updated += 1;
                }
                Some(_) => {}
            }
        }

        self.mounted = next;
        diff
    }

    /// Unmount everything.
    pub fn clear<A: RenderAdapter + ?Sized>(&mut self, adapter: &mut A) -> usize {
        let count = self.mounted.len();
        for id in self.mounted.keys() {
            adapter.unmount(id);
        }
        self.mounted.clear();
        count
    }
}

/// Adapter that records every call, for tests and the CLI report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingAdapter {
    /// Calls in the order they were made.
    pub calls: Vec<RenderCall>,
}

/// One recorded adapter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderCall {
    /// `mount(id)` at `top` in `column`.
    Mount(ItemId, ColumnIndex, PxOffset),
    /// `update(id)` to `top` in `column`.
    Update(ItemId, ColumnIndex, PxOffset),
    /// `unmount(id)`.
    Unmount(ItemId),
}

impl RenderAdapter for RecordingAdapter {
    fn mount(&mut self, item: &VisibleItem) {
        self.calls
            .push(RenderCall::Mount(item.id.clone(), item.column, item.top));
    }

    fn update(&mut self, item: &VisibleItem) {
        self.calls
            .push(RenderCall::Update(item.id.clone(), item.column, item.top));
    }

    fn unmount(&mut self, id: &ItemId) {
        self.calls.push(RenderCall::Unmount(id.clone()));
    }
}
