//! Snapshot tests for whole-script replays.
//!
//! Uses insta inline snapshots so a layout regression shows up as a diff of
//! the report the CLI would print.

use crate::config::EngineSettings;
use crate::replay::replay_script;

fn script(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|l| l.to_string()).collect()
}

#[test]
fn correction_then_resize_report() {
    // GIVEN: four items in three columns, one corrected after painting
    // WHEN: the container shrinks to two columns and the debounce expires
    // THEN: greedy placement reruns over the corrected heights
    let report = replay_script(
        EngineSettings::default(),
        script(&[
            r#"{"op":"append","id":"a","height":120}"#,
            r#"{"op":"append","id":"b","height":80}"#,
            r#"{"op":"append","id":"c","height":200}"#,
            r#"{"op":"append","id":"d","height":60}"#,
            r#"{"op":"measure","id":"b","height":100}"#,
            r#"{"op":"scroll","offset":0,"viewport_height":300}"#,
            r#"{"op":"resize","columns":2,"at_ms":1000}"#,
            r#"{"op":"tick","at_ms":1200}"#,
            r#"{"op":"load_complete","outcome":"succeeded"}"#,
            r#"{"op":"measure","id":"ghost","height":10}"#,
        ]),
    )
    .unwrap();

    insta::assert_snapshot!(report.to_string(), @r"
    columns: 2 (gap 0)
    column heights: 180 300
    content height: 300
    epoch: 1 generation: 1
    placements:
      a col 0 top 0 height 120
      b col 1 top 0 height 100
      c col 1 top 100 height 200
      d col 0 top 120 height 60
    viewport: scroll 0 height 300 buffer 200
    visible: a b c d
    load-more signals: 1
    events: 10 (1 ignored, 0 rejected, 0 parse errors)
    ");
}

#[test]
fn json_report_for_single_item() {
    let report = replay_script(
        EngineSettings {
            columns: 1,
            ..EngineSettings::default()
        },
        script(&[
            r#"{"op":"append","id":"x","height":10}"#,
            r#"{"op":"scroll","offset":0,"viewport_height":100}"#,
        ]),
    )
    .unwrap();

    insta::assert_snapshot!(report.to_json().unwrap(), @r#"
    {
      "columns": 1,
      "gap": 0,
      "column_heights": [
        10
      ],
      "content_height": 10,
      "epoch": 0,
      "generation": 0,
      "placements": [
        {
          "id": "x",
          "column": 0,
          "top": 0,
          "height": 10
        }
      ],
      "viewport": {
        "scroll_offset": 0,
        "viewport_height": 100,
        "buffer_px": 200
      },
      "visible": [
        "x"
      ],
      "load_more_signals": [
        {
          "request": 0,
          "distance_px": 0
        }
      ],
      "stats": {
        "events": 2,
        "ignored": 0,
        "rejected": 0,
        "parse_errors": 0
      }
    }
    "#);
}
