//! Drives a [`MasonryEngine`] from a host event script.
//!
//! Pure apart from logging: no I/O. The binary reads the script, this module
//! feeds it to an engine, and [`LayoutReport`] captures the result.

use crate::config::EngineSettings;
use crate::engine::{ChangeOutcome, MasonryEngine};
use crate::layout::lazy_load::LoadMoreSignal;
use crate::model::error::{EngineError, ParseError};
use crate::parser::{self, ScriptEvent};
use crate::report::{LayoutReport, ReplayStats};
use tracing::{debug, warn};

/// Replay state: the engine, the host clock and the counters.
#[derive(Debug)]
pub struct Replay {
    engine: MasonryEngine,
    clock_ms: u64,
    signals: Vec<LoadMoreSignal>,
    stats: ReplayStats,
}

impl Replay {
    /// Start a replay on a fresh engine.
    ///
    /// # Errors
    /// [`EngineError::Configuration`] if `settings` are invalid.
    pub fn new(settings: EngineSettings) -> Result<Self, EngineError> {
        Ok(Self {
            engine: MasonryEngine::new(settings)?,
            clock_ms: 0,
            signals: Vec::new(),
            stats: ReplayStats::default(),
        })
    }

    /// The engine being driven.
    pub fn engine(&self) -> &MasonryEngine {
        &self.engine
    }

    /// Latest host clock value seen.
    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    /// Apply one event. Refused events are logged and counted, never fatal.
    pub fn apply(&mut self, line: usize, event: &ScriptEvent) {
        self.stats.events += 1;
        if let Some(at_ms) = event.at_ms() {
            self.advance_clock(at_ms);
        }
        match self.dispatch(event) {
            Ok(true) => {}
            Ok(false) => {
                self.stats.ignored += 1;
                debug!(line, ?event, "event had no effect");
            }
            Err(err) => {
                self.stats.rejected += 1;
                warn!(line, error = %err, "event rejected");
            }
        }
    }

    /// Count parse failures so they show up in the report.
    pub fn record_parse_errors(&mut self, errors: &[ParseError]) {
        for err in errors {
            warn!(line = err.line(), error = %err, "skipping malformed script line");
        }
        self.stats.parse_errors += errors.len();
    }

    fn advance_clock(&mut self, at_ms: u64) {
        // The host clock never runs backwards.
        self.clock_ms = self.clock_ms.max(at_ms);
        if let Err(err) = self.engine.poll(self.clock_ms) {
            warn!(error = %err, "poll failed");
        }
    }

    /// Returns Ok(false) for accepted no-ops.
    fn dispatch(&mut self, event: &ScriptEvent) -> Result<bool, EngineError> {
        match event {
            ScriptEvent::Append(spec) => {
                self.engine.append(spec.clone())?;
                Ok(true)
            }
            ScriptEvent::Measure { id, height } => Ok(self.engine.report_measured(id, *height)?
                != ChangeOutcome::UnknownItem),
            ScriptEvent::Remove { id } => {
                Ok(self.engine.remove(id)? != ChangeOutcome::UnknownItem)
            }
            ScriptEvent::Resize {
                columns,
                column_width,
                ..
            } => {
                self.engine.on_resize(*columns, *column_width, self.clock_ms)?;
                Ok(true)
            }
            ScriptEvent::Scroll {
                offset,
                viewport_height,
                ..
            } => {
                if let Some(signal) = self.engine.on_scroll(*offset, *viewport_height)? {
                    self.signals.push(signal);
                }
                Ok(true)
            }
            ScriptEvent::LoadComplete { outcome } => self.engine.complete_in_flight(*outcome),
            ScriptEvent::Tick { .. } => Ok(true),
            ScriptEvent::Relayout => {
                self.engine.relayout_all()?;
                Ok(true)
            }
            ScriptEvent::Flush => {
                self.engine.flush()?;
                Ok(true)
            }
        }
    }

    /// Flush pending work and capture the report.
    pub fn finish(mut self) -> LayoutReport {
        if let Err(err) = self.engine.flush() {
            warn!(error = %err, "final flush failed");
        }
        LayoutReport::capture(&self.engine, self.signals, self.stats)
    }
}

/// Parse and replay a whole script.
///
/// # Errors
/// [`EngineError::Configuration`] if `settings` are invalid. Bad lines and
/// refused events are counted in the report instead.
pub fn replay_script(settings: EngineSettings, lines: Vec<String>) -> Result<LayoutReport, EngineError> {
    let (events, errors) = parser::parse_lines(lines, 1);
    let mut replay = Replay::new(settings)?;
    replay.record_parse_errors(&errors);
    for (line, event) in &events {
        replay.apply(*line, event);
    }
    Ok(replay.finish())
}
