//! JSONL parser for host event scripts.
//!
//! Each line is one host notification, tagged by `op`:
//!
//! ```text
//! {"op":"append","id":"card-1","height":120,"width":240}
//! {"op":"measure","id":"card-1","height":131.5}
//! {"op":"remove","id":"card-1"}
//! {"op":"resize","columns":2,"column_width":300,"at_ms":1000}
//! {"op":"scroll","offset":400,"viewport_height":800,"at_ms":1016}
//! {"op":"load_complete","outcome":"succeeded"}
//! {"op":"tick","at_ms":1200}
//! {"op":"relayout"}
//! {"op":"flush"}
//! ```
//!
//! Parsing is pure. Raw serde shapes are validated into [`ScriptEvent`] at
//! this boundary so the replay never sees an empty id or a measured height
//! the engine cannot place.

use crate::layout::lazy_load::LoadOutcome;
use crate::model::error::ParseError;
use crate::model::identifiers::{ItemId, ItemSpec};
use serde::Deserialize;

/// Raw JSON shape of one script line.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum RawEvent {
    Append {
        id: String,
        #[serde(default)]
        height: Option<u32>,
        #[serde(default)]
        width: Option<u32>,
    },
    Measure {
        id: String,
        height: f64,
    },
    Remove {
        id: String,
    },
    Resize {
        columns: i64,
        #[serde(default)]
        column_width: Option<i64>,
        #[serde(default)]
        at_ms: Option<u64>,
    },
    Scroll {
        offset: u64,
        viewport_height: u64,
        #[serde(default)]
        at_ms: Option<u64>,
    },
    LoadComplete {
        outcome: LoadOutcome,
    },
    Tick {
        at_ms: u64,
    },
    Relayout,
    Flush,
}

/// One validated host notification.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptEvent {
    /// A new item from the data source.
    Append(ItemSpec),
    /// The render layer measured an item.
    Measure {
        /// Item measured.
        id: ItemId,
        /// Measured height (finite, >= 0).
        height: f64,
    },
    /// The user removed an item.
    Remove {
        /// Item removed.
        id: ItemId,
    },
    /// Container or breakpoint changed.
    Resize {
        /// New column count.
        columns: i64,
        /// New column width, if known.
        column_width: Option<i64>,
        /// Host clock at the notification.
        at_ms: Option<u64>,
    },
    /// Scroll tick.
    Scroll {
        /// Scroll offset.
        offset: u64,
        /// Visible height.
        viewport_height: u64,
        /// Host clock at the tick.
        at_ms: Option<u64>,
    },
    /// The data source finished the in-flight load.
    LoadComplete {
        /// How the load ended.
        outcome: LoadOutcome,
    },
    /// Host clock advanced.
    Tick {
        /// New clock value.
        at_ms: u64,
    },
    /// Explicit full relayout.
    Relayout,
    /// Run pending work now.
    Flush,
}

impl ScriptEvent {
    /// Host clock value carried by the event, if any.
    pub fn at_ms(&self) -> Option<u64> {
        match self {
            ScriptEvent::Resize { at_ms, .. } | ScriptEvent::Scroll { at_ms, .. } => *at_ms,
            ScriptEvent::Tick { at_ms } => Some(*at_ms),
            _ => None,
        }
    }
}

fn item_id(raw: String, line_number: usize) -> Result<ItemId, ParseError> {
    ItemId::new(raw).map_err(|e| ParseError::InvalidEvent {
        line: line_number,
        message: e.to_string(),
    })
}

/// Parse one script line.
///
/// # Errors
///
/// Returns `ParseError::InvalidEvent` if the line is not JSON, has an
/// unknown `op`, is missing a field, or carries an empty id or a measured
/// height that is negative, non-finite or wider than `u32` pixels.
pub fn parse_event(raw: &str, line_number: usize) -> Result<ScriptEvent, ParseError> {
    let event: RawEvent = serde_json::from_str(raw).map_err(|e| ParseError::InvalidEvent {
        line: line_number,
        message: e.to_string(),
    })?;

    Ok(match event {
        RawEvent::Append { id, height, width } => {
            let id = item_id(id, line_number)?;
            let spec = match height {
                Some(height) => ItemSpec::new(id, height),
                None => ItemSpec::unmeasured(id),
            };
            ScriptEvent::Append(match width {
                Some(width) => spec.with_width(width),
                None => spec,
            })
        }
        RawEvent::Measure { id, height } => {
            if !height.is_finite() || height < 0.0 {
                return Err(ParseError::InvalidEvent {
                    line: line_number,
                    message: format!("measured height must be finite and >= 0, got {height}"),
                });
            }
            if height.ceil() > f64::from(u32::MAX) {
                return Err(ParseError::InvalidEvent {
                    line: line_number,
                    message: format!("measured height {height} exceeds {} px", u32::MAX),
                });
            }
            ScriptEvent::Measure {
                id: item_id(id, line_number)?,
                height,
            }
        }
        RawEvent::Remove { id } => ScriptEvent::Remove {
            id: item_id(id, line_number)?,
        },
        RawEvent::Resize {
            columns,
            column_width,
            at_ms,
        } => ScriptEvent::Resize {
            columns,
            column_width,
            at_ms,
        },
        RawEvent::Scroll {
            offset,
            viewport_height,
            at_ms,
        } => ScriptEvent::Scroll {
            offset,
            viewport_height,
            at_ms,
        },
        RawEvent::LoadComplete { outcome } => ScriptEvent::LoadComplete { outcome },
        RawEvent::Tick { at_ms } => ScriptEvent::Tick { at_ms },
        RawEvent::Relayout => ScriptEvent::Relayout,
        RawEvent::Flush => ScriptEvent::Flush,
    })
}

/// Parse script lines, numbering them from `starting_line_number`.
///
/// Blank lines are skipped. Returns the events (with their line numbers)
/// and the errors separately; a bad line never stops the rest.
pub fn parse_lines(
    lines: Vec<String>,
    starting_line_number: usize,
) -> (Vec<(usize, ScriptEvent)>, Vec<ParseError>) {
    let mut events = Vec::new();
    let mut errors = Vec::new();

    for (index, line) in lines.into_iter().enumerate() {
        let line_number = starting_line_number + index;
        if line.trim().is_empty() {
            continue;
        }
        match parse_event(&line, line_number) {
            Ok(event) => events.push((line_number, event)),
            Err(err) => errors.push(err),
        }
    }

    (events, errors)
}
