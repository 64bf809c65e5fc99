//! Reflow coordinator - the single writer of the geometry cache.
//!
//! Every change to placements goes through a two-phase pass:
//!
//! 1. `plan_*` computes a [`StagedPass`] from the current cache and item
//!    table without touching the cache, and takes a ticket.
//! 2. [`ReflowCoordinator::commit`] writes the staged geometry atomically, or
//!    discards it if a newer overlapping request has been made since.
//!
//! # Sequencing
//!
//! Tickets are issued in request order. Staleness is decided by ticket
//! order, never by wall-clock time:
//!
//! - A full pass is superseded by any request planned after it.
//! - An incremental pass on column `c` is superseded by a later request on
//!   `c`, by any full pass planned after it, or by a full pass that committed
//!   after it was planned.
//!
//! A full relayout stays pending until a full pass actually commits, so a
//! superseded full pass is re-planned, never lost.
//!
//! # State machine
//!
//! ```text
//! Idle -> ComputingIncremental -> Idle
//! Idle -> ComputingFull        -> Idle
//! any  -> Disposed (terminal)
//! ```

use super::balancer::{self, AppendPlan, ColumnReplay};
use super::debounce::Debouncer;
use super::geometry::{ColumnState, GeometryCache};
use super::items::ItemTable;
use super::layout_config::LayoutConfig;
use super::types::{ColumnIndex, Seq};
use std::collections::BTreeMap;
use tracing::{debug, info, trace};

/// Coordinator lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReflowState {
    /// No pass outstanding.
    Idle,
    /// An append or column replay has been planned and not yet resolved.
    ComputingIncremental,
    /// A full relayout has been planned and not yet resolved.
    ComputingFull,
    /// Torn down; no further events are processed.
    Disposed,
}

/// Request order of a planned pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PassTicket(u64);

impl PassTicket {
    /// Raw ticket number.
    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Part of the layout a pass rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassScope {
    /// One column from some slot downward.
    Column(ColumnIndex),
    /// Every column.
    Full,
}

#[derive(Debug, Clone)]
enum StagedChange {
    Append(AppendPlan),
    Replay(ColumnReplay),
    Full {
        config: LayoutConfig,
        columns: Vec<ColumnState>,
    },
}

/// Geometry computed by a pass, not yet visible to readers.
#[derive(Debug, Clone)]
pub struct StagedPass {
    ticket: PassTicket,
    generation: u64,
    change: StagedChange,
}

impl StagedPass {
    /// Ticket taken when the pass was planned.
    pub fn ticket(&self) -> PassTicket {
        self.ticket
    }

    /// What the pass rewrites.
    pub fn scope(&self) -> PassScope {
        match &self.change {
            StagedChange::Append(plan) => PassScope::Column(plan.column),
            StagedChange::Replay(replay) => PassScope::Column(replay.column),
            StagedChange::Full { .. } => PassScope::Full,
        }
    }

    /// The append plan, if this pass places a new item.
    pub fn append_plan(&self) -> Option<&AppendPlan> {
        match &self.change {
            StagedChange::Append(plan) => Some(plan),
            _ => None,
        }
    }
}

/// Result of [`ReflowCoordinator::commit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Written to the cache.
    Applied {
        /// True if a full pass started a new layout epoch.
        new_epoch: bool,
    },
    /// A newer overlapping request exists; nothing was written.
    Superseded,
    /// The coordinator is disposed; nothing was written.
    Disposed,
}

impl CommitOutcome {
    /// True if the pass was written.
    pub fn is_applied(&self) -> bool {
        matches!(self, CommitOutcome::Applied { .. })
    }
}

/// Owns the geometry cache and decides which computed passes reach it.
#[derive(Debug, Clone)]
pub struct ReflowCoordinator {
    cache: GeometryCache,
    state: ReflowState,
    next_ticket: u64,
    latest_request: u64,
    latest_full: u64,
    latest_column: Vec<u64>,
    full_pending: Option<LayoutConfig>,
    resize_debounce: Debouncer,
    dirty: BTreeMap<ColumnIndex, usize>,
}

impl ReflowCoordinator {
    /// Coordinator over an empty cache.
    pub fn new(config: LayoutConfig, resize_debounce_ms: u64) -> Self {
        Self {
            cache: GeometryCache::new(config),
            state: ReflowState::Idle,
            next_ticket: 0,
            latest_request: 0,
            latest_full: 0,
            latest_column: vec![0; config.column_count()],
            full_pending: None,
            resize_debounce: Debouncer::new(resize_debounce_ms),
            dirty: BTreeMap::new(),
        }
    }

    /// Read access to the placements.
    pub fn cache(&self) -> &GeometryCache {
        &self.cache
    }

    /// Current state.
    pub fn state(&self) -> ReflowState {
        self.state
    }

    /// True once disposed.
    pub fn is_disposed(&self) -> bool {
        self.state == ReflowState::Disposed
    }

    // === Planning ===

    fn take_ticket(&mut self, scope: PassScope) -> PassTicket {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.latest_request = ticket;
        match scope {
            PassScope::Full => {
                self.latest_full = ticket;
                self.state = ReflowState::ComputingFull;
            }
            PassScope::Column(column) => {
                if let Some(latest) = self.latest_column.get_mut(column.get()) {
                    *latest = ticket;
                }
                if self.state != ReflowState::ComputingFull {
                    self.state = ReflowState::ComputingIncremental;
                }
            }
        }
        PassTicket(ticket)
    }

    fn stage(&mut self, change: StagedChange) -> StagedPass {
        let scope = match &change {
            StagedChange::Append(plan) => PassScope::Column(plan.column),
            StagedChange::Replay(replay) => PassScope::Column(replay.column),
            StagedChange::Full { .. } => PassScope::Full,
        };
        StagedPass {
            ticket: self.take_ticket(scope),
            generation: self.cache.generation(),
            change,
        }
    }

    /// Plan the greedy placement of a newly registered item.
    ///
    /// Returns `None` if `seq` is not live in `items`.
    pub fn plan_append(&mut self, items: &ItemTable, seq: Seq) -> Option<StagedPass> {
        let record = items.get(seq)?;
        let height = record.effective_height(items.placeholder_height());
        let plan = balancer::plan_append(&self.cache, seq, height, record.width());
        trace!(seq = seq.get(), column = plan.column.get(), top = plan.slot.top().get(), "planned append");
        Some(self.stage(StagedChange::Append(plan)))
    }

    /// Plan a replay of `column` from slot `from` downward.
    pub fn plan_replay(&mut self, items: &ItemTable, column: ColumnIndex, from: usize) -> StagedPass {
        let replay = balancer::replay_column(&self.cache, items, column, from);
        self.stage(StagedChange::Replay(replay))
    }

    /// Plan a replay of the column owning `seq`, from that item downward.
    ///
    /// Returns `None` if the item is not placed.
    pub fn plan_replay_from_seq(&mut self, items: &ItemTable, seq: Seq) -> Option<StagedPass> {
        let replay = balancer::replay_from_seq(&self.cache, items, seq)?;
        Some(self.stage(StagedChange::Replay(replay)))
    }

    /// Plan a full greedy relayout from `seq = 0`.
    ///
    /// Uses the pending resize configuration if there is one, else the
    /// current configuration.
    pub fn plan_full(&mut self, items: &ItemTable) -> StagedPass {
        let config = self.full_pending.unwrap_or(*self.cache.config());
        let columns = balancer::layout_all(&config, items);
        self.stage(StagedChange::Full { config, columns })
    }

    // === Commit ===

    fn is_current(&self, pass: &StagedPass) -> bool {
        let ticket = pass.ticket.0;
        match pass.scope() {
            PassScope::Full => ticket == self.latest_request,
            PassScope::Column(column) => {
                pass.generation == self.cache.generation()
                    && self.latest_full < ticket
                    && self.latest_column.get(column.get()) == Some(&ticket)
            }
        }
    }

    /// Write a staged pass to the cache, unless it has been superseded.
    pub fn commit(&mut self, pass: StagedPass) -> CommitOutcome {
        if self.is_disposed() {
            return CommitOutcome::Disposed;
        }
        if !self.is_current(&pass) {
            debug!(ticket = pass.ticket.0, scope = ?pass.scope(), "discarding superseded reflow pass");
            self.settle_state(pass.ticket);
            return CommitOutcome::Superseded;
        }

        let outcome = match pass.change {
            StagedChange::Append(plan) => {
                self.cache.apply_append(plan.column, plan.slot);
                CommitOutcome::Applied { new_epoch: false }
            }
            StagedChange::Replay(replay) => {
                trace!(
                    column = replay.column.get(),
                    from = replay.from,
                    removed = replay.removed.len(),
                    "committed column replay"
                );
                self.cache.apply_column_suffix(
                    replay.column,
                    replay.from,
                    replay.suffix,
                    replay.cursor,
                    &replay.removed,
                );
                CommitOutcome::Applied { new_epoch: false }
            }
            StagedChange::Full { config, columns } => {
                let new_epoch = self.cache.replace_all(config, columns);
                self.latest_column = vec![0; config.column_count()];
                self.full_pending = None;
                self.resize_debounce.cancel();
                self.dirty.clear();
                info!(
                    columns = config.column_count(),
                    items = self.cache.len(),
                    epoch = self.cache.epoch(),
                    new_epoch,
                    "full relayout committed"
                );
                CommitOutcome::Applied { new_epoch }
            }
        };
        self.settle_state(pass.ticket);
        outcome
    }

    fn settle_state(&mut self, resolved: PassTicket) {
        if resolved.0 == self.latest_request && !self.is_disposed() {
            self.state = ReflowState::Idle;
        }
    }

    // === Full relayout scheduling ===

    /// Schedule a debounced full relayout to `config`.
    ///
    /// Restarts the debounce timer. Batched column replays are kept: the
    /// current layout must stay consistent until the full pass commits,
    /// which clears them.
    pub fn request_resize(&mut self, config: LayoutConfig, now_ms: u64) {
        self.full_pending = Some(config);
        self.resize_debounce.trigger(now_ms);
    }

    /// Mark a full relayout as needed right away (no debounce).
    pub fn request_full_now(&mut self) {
        if self.full_pending.is_none() {
            self.full_pending = Some(*self.cache.config());
        }
        self.resize_debounce.cancel();
        self.dirty.clear();
    }

    /// Configuration the next full pass will use, if one is pending.
    pub fn full_pending(&self) -> Option<LayoutConfig> {
        self.full_pending
    }

    /// True if a full relayout is pending and not waiting on the debounce timer.
    pub fn full_pending_now(&self) -> bool {
        self.full_pending.is_some() && !self.resize_debounce.is_pending()
    }

    /// Deadline of the pending debounced resize.
    pub fn resize_deadline(&self) -> Option<u64> {
        self.resize_debounce.deadline()
    }

    /// True if a pending full relayout is due at `now_ms`.
    ///
    /// A full relayout requested with [`request_full_now`](Self::request_full_now)
    /// is always due.
    pub fn full_due(&mut self, now_ms: u64) -> bool {
        if self.full_pending.is_none() {
            return false;
        }
        if !self.resize_debounce.is_pending() {
            return true;
        }
        self.resize_debounce.poll(now_ms)
    }

    // === Batched incremental work ===

    /// Record that `column` must replay from slot `from`.
    pub fn mark_dirty(&mut self, column: ColumnIndex, from: usize) {
        self.dirty
            .entry(column)
            .and_modify(|slot| *slot = (*slot).min(from))
            .or_insert(from);
    }

    /// Record that the column owning `seq` must replay from that item.
    pub fn mark_dirty_from_seq(&mut self, seq: Seq) -> bool {
        let Some(column) = self.cache.column_of(seq) else {
            return false;
        };
        let Some(from) = self.cache.columns()[column.get()].slot_of(seq) else {
            return false;
        };
        self.mark_dirty(column, from);
        true
    }

    /// True if batched column replays are waiting.
    pub fn has_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Take the batched replays, lowest column first.
    pub fn take_dirty(&mut self) -> Vec<(ColumnIndex, usize)> {
        std::mem::take(&mut self.dirty).into_iter().collect()
    }

    // === Teardown ===

    /// Enter the terminal state. Pending work is dropped.
    pub fn dispose(&mut self) {
        self.state = ReflowState::Disposed;
        self.full_pending = None;
        self.resize_debounce.cancel();
        self.dirty.clear();
    }
}
