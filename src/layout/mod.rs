//! Masonry layout core.
//!
//! Pure and synchronous: nothing in here does I/O or owns a timer. The
//! host drives it through [`crate::engine::MasonryEngine`].
//!
//! Data flow:
//!
//! ```text
//! ItemTable -> balancer -> (staged pass) -> reflow commit -> GeometryCache
//!                                                               |
//!                 ViewportState -> compute_visible_range <------+
//!                                         |
//!                                   Materializer -> RenderAdapter
//! ```

pub mod balancer;
pub mod debounce;
pub mod geometry;
pub mod items;
pub mod layout_config;
pub mod lazy_load;
pub mod reflow;
pub mod render;
pub mod types;
pub mod visible_range;

pub use geometry::{ColumnState, GeometryCache, Placement, Slot};
pub use items::{ItemRecord, ItemTable, MeasureChange};
pub use layout_config::LayoutConfig;
pub use lazy_load::{LazyLoadTrigger, LoadMoreSignal, LoadOutcome, LoadRequestId, LoadState};
pub use reflow::{CommitOutcome, PassScope, PassTicket, ReflowCoordinator, ReflowState, StagedPass};
pub use render::{Materializer, RecordingAdapter, RenderAdapter, RenderCall, RenderDiff, VisibleItem};
pub use types::{ColumnIndex, ItemHeight, PxOffset, Seq, ViewportState};
pub use visible_range::{compute_visible_range, VisibleRange, VisibleSlot, VisibleWindow};
