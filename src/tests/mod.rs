//! Internal test modules - whitebox tests with crate access
//!
//! Tests here check the engine against its own internals: the item table and
//! the geometry cache must agree after any sequence of host events.

mod replay_snapshots;
