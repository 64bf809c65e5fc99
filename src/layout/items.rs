//! Item registry: the live item list in insertion order.
//!
//! This is the input side of the layout. It holds what the data source and
//! the measurement callback told us; placements are derived from it by the
//! balancer and stored in the geometry cache. Measurements land here first,
//! so a reflow pass that gets superseded never loses one.

use super::types::{ItemHeight, Seq};
use crate::model::error::EngineError;
use crate::model::identifiers::{ItemId, ItemSpec};
use std::collections::{BTreeMap, HashMap};

/// One live item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    id: ItemId,
    seq: Seq,
    declared_height: Option<ItemHeight>,
    measured_height: Option<ItemHeight>,
    width: Option<u32>,
}

impl ItemRecord {
    /// Stable identifier.
    pub fn id(&self) -> &ItemId {
        &self.id
    }

    /// Insertion order.
    pub fn seq(&self) -> Seq {
        self.seq
    }

    /// Height declared by the data source, if any.
    pub fn declared_height(&self) -> Option<ItemHeight> {
        self.declared_height
    }

    /// Height reported by the render layer, if it has painted.
    pub fn measured_height(&self) -> Option<ItemHeight> {
        self.measured_height
    }

    /// Declared width, if any.
    pub fn width(&self) -> Option<u32> {
        self.width
    }

    /// Height used for layout: measured, else declared, else the placeholder.
    pub fn effective_height(&self, placeholder: ItemHeight) -> ItemHeight {
        self.measured_height
            .or(self.declared_height)
            .unwrap_or(placeholder)
    }
}

/// Result of recording a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureChange {
    /// Effective height changed; the owning column must reflow from `seq`.
    Changed {
        /// Item that changed.
        seq: Seq,
        /// Effective height before the measurement.
        old: ItemHeight,
        /// Effective height after the measurement.
        new: ItemHeight,
    },
    /// Measurement matches the height already in use.
    Unchanged,
    /// No live item with that id (removed before it was measured).
    UnknownItem,
}

/// Live items keyed by insertion order, with id lookup.
#[derive(Debug, Clone, Default)]
pub struct ItemTable {
    records: BTreeMap<Seq, ItemRecord>,
    by_id: HashMap<ItemId, Seq>,
    next_seq: Seq,
    placeholder_height: ItemHeight,
}

impl ItemTable {
    /// Empty table. Items without a declared height use `placeholder_height`
    /// until measured.
    pub fn new(placeholder_height: ItemHeight) -> Self {
        Self {
            placeholder_height,
            ..Self::default()
        }
    }

    /// Height used for items that declare none and are not yet measured.
    pub fn placeholder_height(&self) -> ItemHeight {
        self.placeholder_height
    }

    /// Register a new item and assign it the next sequence number.
    ///
    /// # Errors
    /// [`EngineError::DuplicateItem`] if the id is already live.
    pub fn insert(&mut self, spec: ItemSpec) -> Result<Seq, EngineError> {
        if self.by_id.contains_key(&spec.id) {
            return Err(EngineError::DuplicateItem(spec.id));
        }
        let seq = self.next_seq;
        self.next_seq = seq.next();
        self.by_id.insert(spec.id.clone(), seq);
        self.records.insert(
            seq,
            ItemRecord {
                id: spec.id,
                seq,
                declared_height: spec.declared_height,
                measured_height: None,
                width: spec.width,
            },
        );
        Ok(seq)
    }

    /// Store a measured height.
    pub fn record_measurement(&mut self, id: &ItemId, height: ItemHeight) -> MeasureChange {
        let Some(&seq) = self.by_id.get(id) else {
            return MeasureChange::UnknownItem;
        };
        let placeholder = self.placeholder_height;
        let Some(record) = self.records.get_mut(&seq) else {
            return MeasureChange::UnknownItem;
        };
        let old = record.effective_height(placeholder);
        record.measured_height = Some(height);
        if old == height {
            MeasureChange::Unchanged
        } else {
            MeasureChange::Changed {
                seq,
                old,
                new: height,
            }
        }
    }

    /// Remove an item, returning its record if it was live.
    pub fn remove(&mut self, id: &ItemId) -> Option<ItemRecord> {
        let seq = self.by_id.remove(id)?;
        self.records.remove(&seq)
    }

    /// Sequence number of a live item.
    pub fn seq_of(&self, id: &ItemId) -> Option<Seq> {
        self.by_id.get(id).copied()
    }

    /// Record by sequence number.
    pub fn get(&self, seq: Seq) -> Option<&ItemRecord> {
        self.records.get(&seq)
    }

    /// Effective layout height of a live item.
    pub fn height_of(&self, seq: Seq) -> Option<ItemHeight> {
        self.records
            .get(&seq)
            .map(|r| r.effective_height(self.placeholder_height))
    }

    /// Iterate live items in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ItemRecord> {
        self.records.values()
    }

    /// Number of live items.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no items are live.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sequence number the next inserted item will get.
    pub fn next_seq(&self) -> Seq {
        self.next_seq
    }
}
