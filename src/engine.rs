//! Event-driven facade over the layout core.
//!
//! [`MasonryEngine`] is what a host talks to. It owns the item table and the
//! reflow coordinator, and turns host notifications (items appended, heights
//! measured, items removed, container resized, scroll ticks) into committed
//! layout passes.
//!
//! The engine is single-threaded and never blocks. Time only advances when
//! the host says so: resize debouncing is driven by the `now_ms` values passed
//! to [`MasonryEngine::on_resize`] and [`MasonryEngine::poll`].
//!
//! # Example
//!
//! ```
//! use waterfall::config::EngineSettings;
//! use waterfall::engine::MasonryEngine;
//! use waterfall::model::identifiers::{ItemId, ItemSpec};
//!
//! let mut engine = MasonryEngine::new(EngineSettings::default()).unwrap();
//! for (i, h) in [100, 100, 100, 50, 50].into_iter().enumerate() {
//!     let id = ItemId::new(format!("card-{i}")).unwrap();
//!     engine.append(ItemSpec::new(id, h)).unwrap();
//! }
//! let heights: Vec<u64> = engine.column_heights().iter().map(|h| h.get()).collect();
//! assert_eq!(heights, vec![150, 150, 100]);
//! ```

use crate::config::EngineSettings;
use crate::layout::geometry::{GeometryCache, Placement};
use crate::layout::items::{ItemTable, MeasureChange};
use crate::layout::layout_config::LayoutConfig;
use crate::layout::lazy_load::{LazyLoadTrigger, LoadMoreSignal, LoadOutcome, LoadRequestId, LoadState};
use crate::layout::reflow::{CommitOutcome, ReflowCoordinator, ReflowState, StagedPass};
use crate::layout::render::{Materializer, RenderAdapter, RenderDiff, VisibleItem};
use crate::layout::types::{ItemHeight, PxOffset, Seq, ViewportState};
use crate::layout::visible_range::{compute_visible_range, VisibleWindow};
use crate::model::error::{EngineError, PullError};
use crate::model::identifiers::{ItemId, ItemSpec};
use crate::source::ItemStream;
use std::fmt;
use tracing::{debug, info};

/// Output callbacks for collaborators outside the engine.
///
/// Both methods default to doing nothing.
pub trait LayoutObserver {
    /// The viewport came within the load threshold of the end of known content.
    fn load_more_needed(&mut self, signal: LoadMoreSignal) {
        let _ = signal;
    }

    /// A layout pass committed and nothing else is pending.
    fn layout_settled(&mut self, column_heights: &[PxOffset]) {
        let _ = column_heights;
    }
}

/// What a measurement or removal did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// The owning column was reflowed (or queued for the end of the batch).
    Applied,
    /// The new height equals the height already in use.
    Unchanged,
    /// No live item has that id. Expected when an item is removed before it paints.
    UnknownItem,
}

/// What a resize notification did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeOutcome {
    /// Same configuration as the one in force and nothing pending.
    Unchanged,
    /// A full relayout will run once the host polls past `deadline_ms`.
    Scheduled {
        /// Host clock value at which the relayout becomes due.
        deadline_ms: u64,
    },
}

/// Summary of one [`MasonryEngine::pull_from`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PullSummary {
    /// Items appended.
    pub appended: usize,
    /// Items skipped because their id was already live.
    pub duplicates: usize,
    /// True if the stream reported it has nothing more.
    pub exhausted: bool,
}

/// Incremental masonry layout with virtualization.
pub struct MasonryEngine {
    settings: EngineSettings,
    items: ItemTable,
    reflow: ReflowCoordinator,
    viewport: ViewportState,
    lazy_load: LazyLoadTrigger,
    materializer: Materializer,
    observer: Option<Box<dyn LayoutObserver>>,
    batch_depth: usize,
    unsettled: bool,
}

impl fmt::Debug for MasonryEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MasonryEngine")
            .field("settings", &self.settings)
            .field("items", &self.items.len())
            .field("state", &self.reflow.state())
            .field("viewport", &self.viewport)
            .field("lazy_load", &self.lazy_load.state())
            .field("batch_depth", &self.batch_depth)
            .finish_non_exhaustive()
    }
}

impl MasonryEngine {
    /// Build an engine with an empty grid.
    ///
    /// # Errors
    /// [`EngineError::Configuration`] if the layout settings are invalid.
    pub fn new(settings: EngineSettings) -> Result<Self, EngineError> {
        let config = settings.validate()?;
        info!(
            columns = config.column_count(),
            gap = config.gap(),
            column_width = ?config.column_width(),
            "masonry engine created"
        );
        Ok(Self {
            settings,
            items: ItemTable::new(ItemHeight::new(settings.placeholder_height)),
            reflow: ReflowCoordinator::new(config, settings.resize_debounce_ms),
            viewport: ViewportState::new(0, 0, settings.buffer_px),
            lazy_load: LazyLoadTrigger::new(settings.load_more_threshold_px),
            materializer: Materializer::new(),
            observer: None,
            batch_depth: 0,
            unsettled: false,
        })
    }

    /// Install the output callbacks, replacing any previous observer.
    pub fn set_observer(&mut self, observer: impl LayoutObserver + 'static) {
        self.observer = Some(Box::new(observer));
    }

    // === Queries ===

    /// Settings the engine was built with.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Layout configuration currently in force.
    pub fn config(&self) -> LayoutConfig {
        *self.reflow.cache().config()
    }

    /// Configuration a pending resize will switch to.
    pub fn pending_config(&self) -> Option<LayoutConfig> {
        self.reflow.full_pending()
    }

    /// Host clock value at which a pending resize becomes due.
    pub fn resize_deadline(&self) -> Option<u64> {
        self.reflow.resize_deadline()
    }

    /// Coordinator state.
    pub fn state(&self) -> ReflowState {
        self.reflow.state()
    }

    /// True once [`dispose`](Self::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        self.reflow.is_disposed()
    }

    /// Read access to the placement store.
    pub fn geometry(&self) -> &GeometryCache {
        self.reflow.cache()
    }

    /// Live items.
    pub fn items(&self) -> &ItemTable {
        &self.items
    }

    /// Number of live items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if no item is live.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Last viewport reported by the host.
    pub fn viewport(&self) -> ViewportState {
        self.viewport
    }

    /// Lazy-load trigger state.
    pub fn load_state(&self) -> LoadState {
        self.lazy_load.state()
    }

    /// Content height of every column. Empty after disposal.
    pub fn column_heights(&self) -> Vec<PxOffset> {
        if self.is_disposed() {
            return Vec::new();
        }
        self.reflow.cache().column_heights()
    }

    /// Height of the tallest column.
    pub fn content_height(&self) -> PxOffset {
        if self.is_disposed() {
            return PxOffset::ZERO;
        }
        self.reflow.cache().content_height()
    }

    /// Placement of one item.
    pub fn placement(&self, id: &ItemId) -> Option<Placement> {
        if self.is_disposed() {
            return None;
        }
        let seq = self.items.seq_of(id)?;
        self.reflow.cache().placement(seq)
    }

    /// Every placement with its item id, ordered by insertion.
    pub fn placements(&self) -> Vec<(ItemId, Placement)> {
        if self.is_disposed() {
            return Vec::new();
        }
        self.reflow
            .cache()
            .placements()
            .into_iter()
            .filter_map(|(seq, placement)| {
                self.items
                    .get(seq)
                    .map(|record| (record.id().clone(), placement))
            })
            .collect()
    }

    /// Slots intersecting the buffered viewport. Empty after disposal.
    pub fn visible_window(&self) -> VisibleWindow {
        if self.is_disposed() {
            return VisibleWindow::default();
        }
        compute_visible_range(&self.viewport, self.reflow.cache())
    }

    /// Items to materialize, ordered by insertion.
    pub fn visible_items(&self) -> Vec<VisibleItem> {
        let cache = self.reflow.cache();
        self.visible_window()
            .items
            .into_iter()
            .filter_map(|visible| {
                let record = self.items.get(visible.slot.seq())?;
                let placement = cache.placement_of(visible.column, &visible.slot);
                Some(VisibleItem::new(record.id().clone(), record.seq(), placement))
            })
            .collect()
    }

    // === Item events ===

    /// Register and place a new item at the end of the sequence.
    ///
    /// Inside a [`batch`](Self::batch) the returned placement may still move
    /// when the batch's queued column replays run.
    ///
    /// # Errors
    /// - [`EngineError::Disposed`]
    /// - [`EngineError::DuplicateItem`] if the id is already live
    pub fn append(&mut self, spec: ItemSpec) -> Result<Placement, EngineError> {
        self.ensure_live()?;
        let seq = self.items.insert(spec)?;
        let Some(pass) = self.reflow.plan_append(&self.items, seq) else {
            unreachable!("item {seq:?} was inserted above");
        };
        let Some(plan) = pass.append_plan().copied() else {
            unreachable!("append pass carries an append plan");
        };
        self.commit(pass);
        Ok(self.reflow.cache().placement_of(plan.column, &plan.slot))
    }

    /// Pull up to `max` items from `stream` and append them.
    ///
    /// The appends run as one batch. The stream cannot hand items back, so an
    /// item whose id is already live is skipped and counted rather than
    /// aborting the rest of the batch. If the stream reports exhaustion the
    /// lazy-load trigger stops firing.
    ///
    /// # Errors
    /// [`PullError::Source`] if the stream fails, [`PullError::Engine`] if the
    /// engine is disposed.
    pub fn pull_from<S: ItemStream + ?Sized>(
        &mut self,
        stream: &mut S,
        max: usize,
    ) -> Result<PullSummary, PullError> {
        self.ensure_live()?;
        let specs = stream.next_batch(max)?;
        let mut summary = PullSummary::default();
        self.batch(|engine| -> Result<(), EngineError> {
            for spec in specs {
                match engine.append(spec) {
                    Ok(_) => summary.appended += 1,
                    Err(EngineError::DuplicateItem(id)) => {
                        debug!(id = %id, "skipping duplicate item from stream");
                        summary.duplicates += 1;
                    }
                    Err(err) => return Err(err),
                }
            }
            Ok(())
        })??;
        summary.exhausted = stream.is_exhausted();
        if summary.exhausted && self.lazy_load.state() != LoadState::Exhausted {
            debug!("item stream exhausted, lazy-load trigger stopped");
            self.lazy_load.mark_exhausted();
        }
        Ok(summary)
    }

    /// Record the real height of an item once it has painted.
    ///
    /// Fractional pixels round up. A change replays the owning column from
    /// the item downward; other columns are untouched.
    ///
    /// # Errors
    /// [`EngineError::Disposed`].
    ///
    /// # Panics
    /// If `height_px` is negative, NaN or infinite.
    pub fn report_measured(&mut self, id: &ItemId, height_px: f64) -> Result<ChangeOutcome, EngineError> {
        self.ensure_live()?;
        let height = ItemHeight::from_measured(height_px);
        match self.items.record_measurement(id, height) {
            MeasureChange::Changed { seq, old, new } => {
                debug!(id = %id, seq = seq.get(), old = old.get(), new = new.get(), "height corrected");
                self.reflow_from(seq);
                Ok(ChangeOutcome::Applied)
            }
            MeasureChange::Unchanged => Ok(ChangeOutcome::Unchanged),
            MeasureChange::UnknownItem => {
                debug!(id = %id, "ignoring measurement for unknown item");
                Ok(ChangeOutcome::UnknownItem)
            }
        }
    }

    /// Remove an item. Items below it in its column move up.
    ///
    /// # Errors
    /// [`EngineError::Disposed`].
    pub fn remove(&mut self, id: &ItemId) -> Result<ChangeOutcome, EngineError> {
        self.ensure_live()?;
        let Some(record) = self.items.remove(id) else {
            debug!(id = %id, "ignoring removal of unknown item");
            return Ok(ChangeOutcome::UnknownItem);
        };
        self.reflow_from(record.seq());
        Ok(ChangeOutcome::Applied)
    }

    fn reflow_from(&mut self, seq: Seq) {
        if self.batch_depth > 0 {
            self.reflow.mark_dirty_from_seq(seq);
            return;
        }
        if let Some(pass) = self.reflow.plan_replay_from_seq(&self.items, seq) {
            self.commit(pass);
        }
    }

    /// Run `f` with incremental reflows coalesced.
    ///
    /// Measurements and removals inside the batch only mark their column;
    /// each dirty column replays once when the outermost batch ends. A full
    /// relayout requested inside the batch replaces those replays.
    ///
    /// # Errors
    /// [`EngineError::Disposed`] if the engine is disposed before the batch starts.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> Result<R, EngineError> {
        self.ensure_live()?;
        self.batch_depth += 1;
        let result = f(self);
        self.batch_depth -= 1;
        if self.batch_depth == 0 && !self.is_disposed() {
            self.finish_batch();
        }
        Ok(result)
    }

    fn finish_batch(&mut self) {
        if self.reflow.full_pending_now() {
            self.run_full();
            return;
        }
        self.replay_dirty();
        self.notify_settled();
    }

    fn replay_dirty(&mut self) {
        for (column, from) in self.reflow.take_dirty() {
            let pass = self.reflow.plan_replay(&self.items, column, from);
            if self.reflow.commit(pass).is_applied() {
                self.unsettled = true;
            }
        }
    }

    // === Resize ===

    /// Container or breakpoint changed.
    ///
    /// The new configuration is validated now. The full relayout runs once
    /// `resize_debounce_ms` has passed without another resize, when the host
    /// calls [`poll`](Self::poll), or right away on [`flush`](Self::flush).
    ///
    /// # Errors
    /// - [`EngineError::Disposed`]
    /// - [`EngineError::Configuration`] for an invalid column count or width
    pub fn on_resize(
        &mut self,
        columns: i64,
        column_width: Option<i64>,
        now_ms: u64,
    ) -> Result<ResizeOutcome, EngineError> {
        self.ensure_live()?;
        let config = self.config().resized(columns, column_width)?;
        if config == self.config() && self.reflow.full_pending().is_none() {
            return Ok(ResizeOutcome::Unchanged);
        }
        self.reflow.request_resize(config, now_ms);
        let deadline_ms = now_ms.saturating_add(self.settings.resize_debounce_ms);
        debug!(columns, ?column_width, deadline_ms, "resize scheduled");
        Ok(ResizeOutcome::Scheduled { deadline_ms })
    }

    /// Advance the host clock. Runs a pending resize if its debounce expired.
    ///
    /// Returns true if a full relayout ran.
    ///
    /// # Errors
    /// [`EngineError::Disposed`].
    pub fn poll(&mut self, now_ms: u64) -> Result<bool, EngineError> {
        self.ensure_live()?;
        if self.reflow.full_due(now_ms) {
            self.run_full();
            return Ok(true);
        }
        Ok(false)
    }

    /// Run any pending work now, ignoring the debounce timer.
    ///
    /// Returns true if a full relayout ran.
    ///
    /// # Errors
    /// [`EngineError::Disposed`].
    pub fn flush(&mut self) -> Result<bool, EngineError> {
        self.ensure_live()?;
        if self.reflow.full_pending().is_some() {
            self.run_full();
            return Ok(true);
        }
        if self.reflow.has_dirty() {
            self.replay_dirty();
            self.notify_settled();
        }
        Ok(false)
    }

    /// Discard every placement and re-run greedy placement from the first item.
    ///
    /// Deferred to the end of the batch when called inside one.
    ///
    /// # Errors
    /// [`EngineError::Disposed`].
    pub fn relayout_all(&mut self) -> Result<(), EngineError> {
        self.ensure_live()?;
        self.reflow.request_full_now();
        if self.batch_depth == 0 {
            self.run_full();
        }
        Ok(())
    }

    fn run_full(&mut self) {
        let pass = self.reflow.plan_full(&self.items);
        self.commit(pass);
    }

    // === Scroll ===

    /// Scroll tick. Returns the load-more signal if one fired.
    ///
    /// # Errors
    /// [`EngineError::Disposed`].
    pub fn on_scroll(
        &mut self,
        scroll_offset: u64,
        viewport_height: u64,
    ) -> Result<Option<LoadMoreSignal>, EngineError> {
        self.ensure_live()?;
        self.viewport = ViewportState::new(scroll_offset, viewport_height, self.settings.buffer_px);
        let signal = self.lazy_load.observe(&self.viewport, self.reflow.cache());
        if let (Some(signal), Some(observer)) = (signal, self.observer.as_mut()) {
            observer.load_more_needed(signal);
        }
        Ok(signal)
    }

    /// The data source finished the load identified by `request`.
    ///
    /// Returns false if `request` is not the one in flight.
    ///
    /// # Errors
    /// [`EngineError::Disposed`].
    pub fn complete_load(&mut self, request: LoadRequestId, outcome: LoadOutcome) -> Result<bool, EngineError> {
        self.ensure_live()?;
        Ok(self.lazy_load.complete(request, outcome))
    }

    /// Complete whichever load is in flight.
    ///
    /// Returns false if none is.
    ///
    /// # Errors
    /// [`EngineError::Disposed`].
    pub fn complete_in_flight(&mut self, outcome: LoadOutcome) -> Result<bool, EngineError> {
        self.ensure_live()?;
        match self.lazy_load.in_flight() {
            Some(request) => Ok(self.lazy_load.complete(request, outcome)),
            None => {
                debug!(?outcome, "load completion with nothing in flight");
                Ok(false)
            }
        }
    }

    // === Rendering ===

    /// Mount, update and unmount through `adapter` so it shows exactly the visible items.
    ///
    /// # Errors
    /// [`EngineError::Disposed`].
    pub fn render<A: RenderAdapter + ?Sized>(&mut self, adapter: &mut A) -> Result<RenderDiff, EngineError> {
        self.ensure_live()?;
        let visible = self.visible_items();
        Ok(self.materializer.sync(&visible, adapter))
    }

    // === Teardown ===

    /// Tear the engine down. Every later event returns [`EngineError::Disposed`].
    ///
    /// Calling it twice is harmless.
    pub fn dispose(&mut self) {
        if self.is_disposed() {
            return;
        }
        self.reflow.dispose();
        self.observer = None;
        info!(items = self.items.len(), "masonry engine disposed");
    }

    // === Internals ===

    fn ensure_live(&self) -> Result<(), EngineError> {
        if self.is_disposed() {
            Err(EngineError::Disposed)
        } else {
            Ok(())
        }
    }

    fn commit(&mut self, pass: StagedPass) -> CommitOutcome {
        let outcome = self.reflow.commit(pass);
        if outcome.is_applied() {
            self.unsettled = true;
            self.notify_settled();
        }
        outcome
    }

    fn notify_settled(&mut self) {
        if !self.unsettled || self.batch_depth > 0 || self.reflow.full_pending().is_some() {
            return;
        }
        self.unsettled = false;
        if let Some(observer) = self.observer.as_mut() {
            observer.layout_settled(&self.reflow.cache().column_heights());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::types::ColumnIndex;
    use crate::source::VecStream;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn id(s: &str) -> ItemId {
        ItemId::new(s).unwrap()
    }

    fn engine_with(columns: i64, gap: i64) -> MasonryEngine {
        MasonryEngine::new(EngineSettings {
            columns,
            gap,
            ..EngineSettings::default()
        })
        .unwrap()
    }

    fn heights(engine: &MasonryEngine) -> Vec<u64> {
        engine.column_heights().iter().map(|h| h.get()).collect()
    }

    fn append_all(engine: &mut MasonryEngine, heights: &[u32]) {
        for (i, h) in heights.iter().enumerate() {
            engine.append(ItemSpec::new(id(&format!("i{i}")), *h)).unwrap();
        }
    }

    #[derive(Default)]
    struct Recorded {
        signals: Vec<LoadMoreSignal>,
        settled: Vec<Vec<u64>>,
    }

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Recorded>>);

    impl LayoutObserver for Recorder {
        fn load_more_needed(&mut self, signal: LoadMoreSignal) {
            self.0.borrow_mut().signals.push(signal);
        }

        fn layout_settled(&mut self, column_heights: &[PxOffset]) {
            self.0
                .borrow_mut()
                .settled
                .push(column_heights.iter().map(|h| h.get()).collect());
        }
    }

    mod construction {
        use super::*;

        #[test]
        fn rejects_zero_columns() {
            let result = MasonryEngine::new(EngineSettings {
                columns: 0,
                ..EngineSettings::default()
            });
            assert!(matches!(result, Err(EngineError::Configuration(_))));
        }

        #[test]
        fn starts_empty_and_idle() {
            let engine = engine_with(3, 0);
            assert!(engine.is_empty());
            assert_eq!(engine.state(), ReflowState::Idle);
            assert_eq!(heights(&engine), vec![0, 0, 0]);
        }
    }

    mod appending {
        use super::*;

        #[test]
        fn three_column_scenario() {
            let mut engine = engine_with(3, 0);
            append_all(&mut engine, &[100, 100, 100, 50, 50]);

            assert_eq!(heights(&engine), vec![150, 150, 100]);
            let item3 = engine.placement(&id("i3")).unwrap();
            assert_eq!(item3.column, ColumnIndex::new(0));
            assert_eq!(item3.top, PxOffset::new(100));
        }

        #[test]
        fn append_returns_placement() {
            let mut engine = engine_with(2, 10);
            engine.append(ItemSpec::new(id("a"), 100)).unwrap();
            engine.append(ItemSpec::new(id("b"), 100)).unwrap();
            let placement = engine.append(ItemSpec::new(id("c"), 40)).unwrap();
            assert_eq!(placement.column, ColumnIndex::new(0));
            assert_eq!(placement.top, PxOffset::new(110));
        }

        #[test]
        fn duplicate_id_is_rejected() {
            let mut engine = engine_with(3, 0);
            engine.append(ItemSpec::new(id("a"), 10)).unwrap();
            let err = engine.append(ItemSpec::new(id("a"), 10)).unwrap_err();
            assert_eq!(err, EngineError::DuplicateItem(id("a")));
            assert_eq!(engine.len(), 1);
        }

        #[test]
        fn unmeasured_item_uses_placeholder() {
            let mut engine = MasonryEngine::new(EngineSettings {
                columns: 1,
                placeholder_height: 80,
                ..EngineSettings::default()
            })
            .unwrap();
            engine.append(ItemSpec::unmeasured(id("a"))).unwrap();
            assert_eq!(heights(&engine), vec![80]);
        }

        #[test]
        fn pull_from_appends_and_detects_exhaustion() {
            let mut engine = engine_with(2, 0);
            let mut stream = VecStream::new(vec![
                ItemSpec::new(id("a"), 10),
                ItemSpec::new(id("b"), 20),
                ItemSpec::new(id("c"), 30),
            ]);

            let first = engine.pull_from(&mut stream, 2).unwrap();
            assert_eq!(
                first,
                PullSummary {
                    appended: 2,
                    duplicates: 0,
                    exhausted: false
                }
            );

            let second = engine.pull_from(&mut stream, 2).unwrap();
            assert_eq!(
                second,
                PullSummary {
                    appended: 1,
                    duplicates: 0,
                    exhausted: true
                }
            );
            assert_eq!(engine.load_state(), LoadState::Exhausted);
            assert_eq!(engine.len(), 3);
        }

        #[test]
        fn pull_from_skips_duplicates_and_keeps_the_rest_of_the_batch() {
            let mut engine = engine_with(2, 0);
            engine.append(ItemSpec::new(id("b"), 5)).unwrap();
            let mut stream = VecStream::new(vec![
                ItemSpec::new(id("a"), 10),
                ItemSpec::new(id("b"), 20),
                ItemSpec::new(id("c"), 30),
                ItemSpec::new(id("d"), 40),
            ]);

            let summary = engine.pull_from(&mut stream, 4).unwrap();

            assert_eq!(
                summary,
                PullSummary {
                    appended: 3,
                    duplicates: 1,
                    exhausted: true
                }
            );
            assert_eq!(engine.len(), 4);
            assert!(engine.placement(&id("c")).is_some());
            assert!(engine.placement(&id("d")).is_some());
            // The live item keeps its own height.
            assert_eq!(engine.placement(&id("b")).unwrap().height.get(), 5);
        }
    }

    mod corrections {
        use super::*;

        #[test]
        fn height_correction_shifts_column_below() {
            let mut engine = engine_with(3, 0);
            append_all(&mut engine, &[100, 100, 100, 50, 50]);

            let outcome = engine.report_measured(&id("i0"), 200.0).unwrap();

            assert_eq!(outcome, ChangeOutcome::Applied);
            assert_eq!(heights(&engine), vec![250, 150, 100]);
            assert_eq!(engine.placement(&id("i3")).unwrap().top, PxOffset::new(200));
            assert_eq!(engine.placement(&id("i4")).unwrap().top, PxOffset::new(100));
        }

        #[test]
        fn fractional_measurement_rounds_up() {
            let mut engine = engine_with(1, 0);
            append_all(&mut engine, &[10]);
            engine.report_measured(&id("i0"), 99.2).unwrap();
            assert_eq!(heights(&engine), vec![100]);
        }

        #[test]
        fn same_height_is_unchanged() {
            let mut engine = engine_with(1, 0);
            append_all(&mut engine, &[10]);
            assert_eq!(
                engine.report_measured(&id("i0"), 10.0).unwrap(),
                ChangeOutcome::Unchanged
            );
        }

        #[test]
        fn measurement_after_removal_is_ignored() {
            let mut engine = engine_with(1, 0);
            append_all(&mut engine, &[10, 20]);
            engine.remove(&id("i0")).unwrap();

            assert_eq!(
                engine.report_measured(&id("i0"), 500.0).unwrap(),
                ChangeOutcome::UnknownItem
            );
            assert_eq!(heights(&engine), vec![20]);
        }

        #[test]
        #[should_panic(expected = "non-negative")]
        fn negative_measurement_panics() {
            let mut engine = engine_with(1, 0);
            append_all(&mut engine, &[10]);
            let _ = engine.report_measured(&id("i0"), -1.0);
        }

        #[test]
        fn removal_closes_the_gap_in_its_column() {
            let mut engine = engine_with(3, 0);
            append_all(&mut engine, &[100, 100, 100, 50, 50]);

            assert_eq!(engine.remove(&id("i0")).unwrap(), ChangeOutcome::Applied);

            assert_eq!(heights(&engine), vec![50, 150, 100]);
            assert_eq!(engine.placement(&id("i3")).unwrap().top, PxOffset::ZERO);
            assert_eq!(engine.placement(&id("i0")), None);
        }

        #[test]
        fn removing_unknown_item_is_a_no_op() {
            let mut engine = engine_with(3, 0);
            assert_eq!(
                engine.remove(&id("ghost")).unwrap(),
                ChangeOutcome::UnknownItem
            );
        }
    }

    mod batching {
        use super::*;

        #[test]
        fn batch_replays_each_dirty_column_once() {
            // GIVEN: a settled three-column grid and an observer
            let mut engine = engine_with(3, 0);
            append_all(&mut engine, &[100, 100, 100, 50, 50]);
            let recorder = Recorder::default();
            engine.set_observer(recorder.clone());

            // WHEN: several corrections land inside one batch
            engine
                .batch(|e| {
                    e.report_measured(&id("i0"), 200.0).unwrap();
                    e.report_measured(&id("i3"), 60.0).unwrap();
                    e.report_measured(&id("i1"), 120.0).unwrap();
                    // Nothing is visible until the batch ends.
                    assert_eq!(e.column_heights()[0], PxOffset::new(150));
                })
                .unwrap();

            // THEN: the layout reflects every correction and settles once
            assert_eq!(heights(&engine), vec![260, 170, 100]);
            assert_eq!(recorder.0.borrow().settled, vec![vec![260, 170, 100]]);
        }

        #[test]
        fn relayout_inside_batch_replaces_queued_replays() {
            let mut engine = engine_with(2, 0);
            append_all(&mut engine, &[100, 10, 10]);

            engine
                .batch(|e| {
                    e.report_measured(&id("i1"), 300.0).unwrap();
                    e.relayout_all().unwrap();
                })
                .unwrap();

            // Full greedy placement over [100, 300, 10]: i2 goes to column 0.
            assert_eq!(heights(&engine), vec![110, 300]);
            assert_eq!(engine.geometry().generation(), 1);
        }

        #[test]
        fn batch_returns_closure_value() {
            let mut engine = engine_with(1, 0);
            assert_eq!(engine.batch(|_| 7).unwrap(), 7);
        }
    }

    mod resizing {
        use super::*;

        #[test]
        fn resize_waits_for_debounce() {
            let mut engine = engine_with(3, 0);
            append_all(&mut engine, &[100, 100, 100, 50, 50]);

            let outcome = engine.on_resize(2, None, 1_000).unwrap();
            assert_eq!(outcome, ResizeOutcome::Scheduled { deadline_ms: 1_150 });
            assert!(!engine.poll(1_100).unwrap());
            assert_eq!(engine.column_heights().len(), 3);

            assert!(engine.poll(1_150).unwrap());
            assert_eq!(heights(&engine), vec![200, 200]);
            assert_eq!(engine.geometry().epoch(), 1);
        }

        #[test]
        fn burst_of_resizes_runs_one_full_pass() {
            let mut engine = engine_with(3, 0);
            append_all(&mut engine, &[10, 20, 30]);

            for (i, now) in (0..10u64).map(|i| (i, i * 50)) {
                let columns = if i % 2 == 0 { 2 } else { 4 };
                engine.on_resize(columns, None, now).unwrap();
                assert!(!engine.poll(now).unwrap());
            }
            assert!(engine.poll(450 + 150).unwrap());
            assert_eq!(engine.geometry().generation(), 1);
            assert_eq!(engine.column_heights().len(), 4);
        }

        #[test]
        fn resize_to_current_config_is_a_no_op() {
            let mut engine = engine_with(3, 0);
            assert_eq!(engine.on_resize(3, None, 0).unwrap(), ResizeOutcome::Unchanged);
            assert_eq!(engine.pending_config(), None);
        }

        #[test]
        fn invalid_resize_is_rejected_synchronously() {
            let mut engine = engine_with(3, 0);
            let err = engine.on_resize(0, None, 0).unwrap_err();
            assert!(matches!(err, EngineError::Configuration(_)));
            assert_eq!(engine.pending_config(), None);
        }

        #[test]
        fn appends_during_pending_resize_use_current_layout() {
            let mut engine = engine_with(3, 0);
            engine.on_resize(1, None, 0).unwrap();
            append_all(&mut engine, &[10, 10]);
            assert_eq!(heights(&engine), vec![10, 10, 0]);

            assert!(engine.flush().unwrap());
            assert_eq!(heights(&engine), vec![20]);
        }

        #[test]
        fn settled_is_not_reported_while_resize_pending() {
            let mut engine = engine_with(2, 0);
            let recorder = Recorder::default();
            engine.set_observer(recorder.clone());

            engine.on_resize(1, None, 0).unwrap();
            append_all(&mut engine, &[10]);
            assert!(recorder.0.borrow().settled.is_empty());

            engine.poll(1_000).unwrap();
            assert_eq!(recorder.0.borrow().settled, vec![vec![10]]);
        }

        #[test]
        fn relayout_all_is_idempotent() {
            let mut engine = engine_with(3, 4);
            append_all(&mut engine, &[30, 70, 10, 90, 40, 20]);
            engine.report_measured(&id("i0"), 300.0).unwrap();

            engine.relayout_all().unwrap();
            let first = engine.placements();
            engine.relayout_all().unwrap();
            assert_eq!(engine.placements(), first);
            assert_eq!(engine.geometry().epoch(), 0, "same config keeps the epoch");
        }
    }

    mod scrolling {
        use super::*;

        #[test]
        fn visible_items_follow_scroll() {
            let mut engine = MasonryEngine::new(EngineSettings {
                columns: 1,
                buffer_px: 0,
                load_more_threshold_px: 0,
                ..EngineSettings::default()
            })
            .unwrap();
            append_all(&mut engine, &[100, 100, 100, 100]);

            engine.on_scroll(150, 100).unwrap();
            let ids: Vec<String> = engine
                .visible_items()
                .iter()
                .map(|v| v.id.to_string())
                .collect();
            assert_eq!(ids, vec!["i1", "i2"]);
        }

        #[test]
        fn load_more_is_single_flight() {
            let mut engine = engine_with(1, 0);
            append_all(&mut engine, &[1_000]);
            let recorder = Recorder::default();
            engine.set_observer(recorder.clone());

            for offset in 0..50 {
                engine.on_scroll(400 + offset, 300).unwrap();
            }
            assert_eq!(recorder.0.borrow().signals.len(), 1);

            assert!(engine.complete_in_flight(LoadOutcome::Succeeded).unwrap());
            engine.on_scroll(500, 300).unwrap();
            assert_eq!(recorder.0.borrow().signals.len(), 2);
        }

        #[test]
        fn render_diffs_against_mounted_items() {
            let mut engine = MasonryEngine::new(EngineSettings {
                columns: 1,
                buffer_px: 0,
                ..EngineSettings::default()
            })
            .unwrap();
            append_all(&mut engine, &[100, 100, 100, 100]);
            let mut adapter = crate::layout::render::RecordingAdapter::default();

            engine.on_scroll(0, 50).unwrap();
            assert_eq!(engine.render(&mut adapter).unwrap().mounted, 1);

            engine.on_scroll(250, 50).unwrap();
            let diff = engine.render(&mut adapter).unwrap();
            assert_eq!((diff.mounted, diff.unmounted), (2, 1));
        }
    }

    mod disposal {
        use super::*;

        #[test]
        fn events_after_dispose_are_refused() {
            let mut engine = engine_with(3, 0);
            append_all(&mut engine, &[10]);
            engine.dispose();

            assert_eq!(engine.state(), ReflowState::Disposed);
            assert_eq!(
                engine.append(ItemSpec::new(id("late"), 10)),
                Err(EngineError::Disposed)
            );
            assert_eq!(engine.report_measured(&id("i0"), 5.0), Err(EngineError::Disposed));
            assert_eq!(engine.on_scroll(0, 100), Err(EngineError::Disposed));
            assert_eq!(engine.poll(0), Err(EngineError::Disposed));
        }

        #[test]
        fn readers_see_nothing_after_dispose() {
            let mut engine = engine_with(3, 0);
            append_all(&mut engine, &[10]);
            engine.on_scroll(0, 100).unwrap();
            engine.dispose();
            engine.dispose();

            assert!(engine.visible_items().is_empty());
            assert!(engine.column_heights().is_empty());
            assert_eq!(engine.placement(&id("i0")), None);
        }

        #[test]
        fn pending_resize_is_dropped_on_dispose() {
            let mut engine = engine_with(3, 0);
            engine.on_resize(2, None, 0).unwrap();
            engine.dispose();
            assert_eq!(engine.pending_config(), None);
            assert_eq!(engine.geometry().slot(Seq::new(0)), None);
        }
    }
}
