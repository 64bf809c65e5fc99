//! Lazy-load trigger - asks the data source for more items near the end.
//!
//! Single-flight: once a [`LoadMoreSignal`] is out, further crossings are
//! swallowed until the data source reports back with [`LazyLoadTrigger::complete`].

use super::geometry::GeometryCache;
use super::types::ViewportState;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Identifier of one load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct LoadRequestId(u64);

impl LoadRequestId {
    /// Raw request number.
    pub fn get(&self) -> u64 {
        self.0
    }
}

/// "Need more items" notification for the data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadMoreSignal {
    /// Pass back to [`LazyLoadTrigger::complete`] when the load finishes.
    pub request: LoadRequestId,
    /// Pixels between the viewport bottom and the shortest column's end.
    pub distance_px: u64,
}

/// How a load request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadOutcome {
    /// Items were delivered.
    Succeeded,
    /// The load failed. Retrying is the data source's call.
    Failed,
    /// The stream has no more items.
    Exhausted,
}

/// Trigger state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Will fire on the next threshold crossing.
    Armed,
    /// Waiting for the data source to complete `request`.
    InFlight {
        /// The outstanding request.
        request: LoadRequestId,
    },
    /// Stream finished; never fires again.
    Exhausted,
}

/// Distance from the viewport bottom to the first blank area a user can reach.
///
/// That area sits under the shortest column. Saturates at 0.
pub fn distance_to_end(viewport: &ViewportState, cache: &GeometryCache) -> u64 {
    cache
        .shortest_column_height()
        .get()
        .saturating_sub(viewport.viewport_bottom().get())
}

/// Watches scroll position against the end of known content.
#[derive(Debug, Clone)]
pub struct LazyLoadTrigger {
    threshold_px: u64,
    state: LoadState,
    next_request: u64,
    swallowed: u64,
}

impl LazyLoadTrigger {
    /// Armed trigger firing within `threshold_px` of the end.
    pub fn new(threshold_px: u64) -> Self {
        Self {
            threshold_px,
            state: LoadState::Armed,
            next_request: 0,
            swallowed: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> LoadState {
        self.state
    }

    /// Firing distance.
    pub fn threshold_px(&self) -> u64 {
        self.threshold_px
    }

    /// Crossings ignored because a request was already in flight.
    pub fn swallowed(&self) -> u64 {
        self.swallowed
    }

    /// Evaluate one scroll tick.
    pub fn observe(&mut self, viewport: &ViewportState, cache: &GeometryCache) -> Option<LoadMoreSignal> {
        let distance = distance_to_end(viewport, cache);
        if distance > self.threshold_px {
            return None;
        }
        match self.state {
            LoadState::Armed => {
                let request = LoadRequestId(self.next_request);
                self.next_request += 1;
                self.state = LoadState::InFlight { request };
                debug!(request = request.0, distance, "load more requested");
                Some(LoadMoreSignal {
                    request,
                    distance_px: distance,
                })
            }
            LoadState::InFlight { request } => {
                self.swallowed += 1;
                debug!(request = request.0, distance, "load already in flight, trigger swallowed");
                None
            }
            LoadState::Exhausted => None,
        }
    }

    /// Report the end of a request.
    ///
    /// Returns false (and changes nothing) if `request` is not the one in
    /// flight.
    pub fn complete(&mut self, request: LoadRequestId, outcome: LoadOutcome) -> bool {
        match self.state {
            LoadState::InFlight { request: current } if current == request => {
                self.state = match outcome {
                    LoadOutcome::Succeeded | LoadOutcome::Failed => LoadState::Armed,
                    LoadOutcome::Exhausted => LoadState::Exhausted,
                };
                debug!(request = request.0, ?outcome, "load request completed");
                true
            }
            _ => {
                debug!(request = request.0, state = ?self.state, "ignoring completion of stale load request");
                false
            }
        }
    }

    /// The outstanding request, if any.
    pub fn in_flight(&self) -> Option<LoadRequestId> {
        match self.state {
            LoadState::InFlight { request } => Some(request),
            _ => None,
        }
    }

    /// Stop firing for good.
    pub fn mark_exhausted(&mut self) {
        self.state = LoadState::Exhausted;
    }
}
