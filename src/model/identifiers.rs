//! Item identifiers and item descriptions supplied by the data source.

use crate::layout::types::ItemHeight;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable, host-assigned identifier of an item.
///
/// Opaque to the engine; it only needs to be unique among live items.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemId(String);

/// Error returned when an item identifier is empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("item id must not be empty")]
pub struct InvalidItemId;

impl ItemId {
    /// Smart constructor; rejects the empty string.
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidItemId> {
        let id = id.into();
        if id.is_empty() {
            Err(InvalidItemId)
        } else {
            Ok(Self(id))
        }
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ItemId {
    type Error = InvalidItemId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An item as produced by the data source, before placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSpec {
    /// Stable identifier.
    pub id: ItemId,
    /// Height known up front, if any. Falls back to the placeholder height.
    pub declared_height: Option<ItemHeight>,
    /// Declared width in pixels, if the item is not simply column-wide.
    pub width: Option<u32>,
}

impl ItemSpec {
    /// Item with a declared height.
    pub fn new(id: ItemId, declared_height: u32) -> Self {
        Self {
            id,
            declared_height: Some(ItemHeight::new(declared_height)),
            width: None,
        }
    }

    /// Item whose height is only known after it paints.
    pub fn unmeasured(id: ItemId) -> Self {
        Self {
            id,
            declared_height: None,
            width: None,
        }
    }

    /// Set a declared width.
    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }
}
