//! Layout report produced after replaying a host event script.

use crate::engine::MasonryEngine;
use crate::layout::lazy_load::LoadMoreSignal;
use crate::layout::types::ViewportState;
use serde::Serialize;
use std::fmt;

/// Counters collected while replaying a script.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplayStats {
    /// Events handed to the engine.
    pub events: usize,
    /// Events the engine accepted as no-ops (unknown item, stale load completion).
    pub ignored: usize,
    /// Events the engine refused (duplicate id, invalid resize).
    pub rejected: usize,
    /// Lines that did not parse.
    pub parse_errors: usize,
}

/// One item's placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacementRow {
    /// Item id.
    pub id: String,
    /// Column index.
    pub column: usize,
    /// Top offset.
    pub top: u64,
    /// Height.
    pub height: u32,
    /// Left offset, when the column width is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<u64>,
    /// Width, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
}

/// Final viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ViewportRow {
    /// Scroll offset.
    pub scroll_offset: u64,
    /// Visible height.
    pub viewport_height: u64,
    /// Overscan on each side.
    pub buffer_px: u64,
}

impl From<ViewportState> for ViewportRow {
    fn from(viewport: ViewportState) -> Self {
        Self {
            scroll_offset: viewport.scroll_offset.get(),
            viewport_height: viewport.viewport_height,
            buffer_px: viewport.buffer_px,
        }
    }
}

/// Snapshot of the engine after a replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutReport {
    /// Column count in force.
    pub columns: usize,
    /// Gap in force.
    pub gap: u32,
    /// Column width in force, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_width: Option<u32>,
    /// Content height per column.
    pub column_heights: Vec<u64>,
    /// Tallest column.
    pub content_height: u64,
    /// Layout epoch (config changes).
    pub epoch: u64,
    /// Full passes committed.
    pub generation: u64,
    /// Every placement, in insertion order.
    pub placements: Vec<PlacementRow>,
    /// Last viewport.
    pub viewport: ViewportRow,
    /// Ids of the items to materialize.
    pub visible: Vec<String>,
    /// Load-more signals emitted during the replay.
    pub load_more_signals: Vec<LoadMoreSignal>,
    /// Replay counters.
    pub stats: ReplayStats,
}

impl LayoutReport {
    /// Capture the engine's current layout.
    pub fn capture(
        engine: &MasonryEngine,
        load_more_signals: Vec<LoadMoreSignal>,
        stats: ReplayStats,
    ) -> Self {
        let config = engine.config();
        let geometry = engine.geometry();
        Self {
            columns: config.column_count(),
            gap: config.gap(),
            column_width: config.column_width(),
            column_heights: engine.column_heights().iter().map(|h| h.get()).collect(),
            content_height: engine.content_height().get(),
            epoch: geometry.epoch(),
            generation: geometry.generation(),
            placements: engine
                .placements()
                .into_iter()
                .map(|(id, p)| PlacementRow {
                    id: id.to_string(),
                    column: p.column.get(),
                    top: p.top.get(),
                    height: p.height.get(),
                    left: p.left.map(|l| l.get()),
                    width: p.width,
                })
                .collect(),
            viewport: engine.viewport().into(),
            visible: engine
                .visible_items()
                .into_iter()
                .map(|v| v.id.to_string())
                .collect(),
            load_more_signals,
            stats,
        }
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    /// Serialization failure.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn join<T: fmt::Display>(values: &[T]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for LayoutReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "columns: {} (gap {}", self.columns, self.gap)?;
        if let Some(width) = self.column_width {
            write!(f, ", width {width}")?;
        }
        writeln!(f, ")")?;
        writeln!(f, "column heights: {}", join(&self.column_heights))?;
        writeln!(f, "content height: {}", self.content_height)?;
        writeln!(f, "epoch: {} generation: {}", self.epoch, self.generation)?;
        writeln!(f, "placements:")?;
        for row in &self.placements {
            write!(
                f,
                "  {} col {} top {} height {}",
                row.id, row.column, row.top, row.height
            )?;
            if let Some(left) = row.left {
                write!(f, " left {left}")?;
            }
            if let Some(width) = row.width {
                write!(f, " width {width}")?;
            }
            writeln!(f)?;
        }
        writeln!(
            f,
            "viewport: scroll {} height {} buffer {}",
            self.viewport.scroll_offset, self.viewport.viewport_height, self.viewport.buffer_px
        )?;
        writeln!(f, "visible: {}", self.visible.join(" "))?;
        writeln!(f, "load-more signals: {}", self.load_more_signals.len())?;
        write!(
            f,
            "events: {} ({} ignored, {} rejected, {} parse errors)",
            self.stats.events, self.stats.ignored, self.stats.rejected, self.stats.parse_errors
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineSettings;
    use crate::model::identifiers::{ItemId, ItemSpec};

    fn scenario_engine() -> MasonryEngine {
        let mut engine = MasonryEngine::new(EngineSettings {
            column_width: Some(100),
            gap: 10,
            ..EngineSettings::default()
        })
        .unwrap();
        for (i, h) in [100u32, 100, 100, 50, 50].into_iter().enumerate() {
            engine
                .append(ItemSpec::new(ItemId::new(format!("i{i}")).unwrap(), h))
                .unwrap();
        }
        engine.on_scroll(0, 120).unwrap();
        engine
    }

    #[test]
    fn text_report_snapshot() {
        let engine = scenario_engine();
        let report = LayoutReport::capture(
            &engine,
            Vec::new(),
            ReplayStats {
                events: 6,
                ..ReplayStats::default()
            },
        );

        insta::assert_snapshot!(report.to_string(), @r"
        columns: 3 (gap 10, width 100)
        column heights: 160 160 100
        content height: 160
        epoch: 0 generation: 0
        placements:
          i0 col 0 top 0 height 100 left 0 width 100
          i1 col 1 top 0 height 100 left 110 width 100
          i2 col 2 top 0 height 100 left 220 width 100
          i3 col 0 top 110 height 50 left 0 width 100
          i4 col 1 top 110 height 50 left 110 width 100
        viewport: scroll 0 height 120 buffer 200
        visible: i0 i1 i2 i3 i4
        load-more signals: 0
        events: 6 (0 ignored, 0 rejected, 0 parse errors)
        ");
    }

    #[test]
    fn json_report_omits_unknown_width() {
        let engine = MasonryEngine::new(EngineSettings::default()).unwrap();
        let report = LayoutReport::capture(&engine, Vec::new(), ReplayStats::default());
        let json = report.to_json().unwrap();
        assert!(!json.contains("column_width"));
        assert!(json.contains("\"column_heights\""));
    }
}
