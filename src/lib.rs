//! Waterfall: an incremental masonry layout engine.
//!
//! Items of known width and varying height are placed into a fixed number of
//! equal-width columns, each new item going to the currently shortest column.
//! Placement is incremental: appending is constant work per item, and a late
//! height correction only replays the column it landed in. Only the items
//! overlapping the viewport (plus an overscan buffer) are materialized, and a
//! single-flight trigger asks the host for more items near the end of the
//! content.
//!
//! The core in [`layout`] is pure and synchronous. [`engine::MasonryEngine`]
//! wires it to host events; the binary replays JSONL event scripts through it.

pub mod config;
pub mod engine;
pub mod layout;
pub mod logging;
pub mod model;
pub mod parser;
pub mod replay;
pub mod report;
pub mod source;

#[cfg(test)]
mod tests;
