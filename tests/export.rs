use serde_json::json;
use std::fs;
use xfl_player::export::{load_document, render_png_sequence, ExportOptions};
use xfl_player::Document;

fn moving_box() -> Document {
    serde_json::from_value(json!({
        "width": 64.0,
        "height": 48.0,
        "timelines": [{
            "name": "Scene 1",
            "total_frames": 4,
            "layers": [{
                "name": "box",
                "frames": [
                    { "index": 0, "duration": 3, "tween": "motion", "elements": [{
                        "type": "shape",
                        "fills": [{ "type": "solid", "color": "#0000FF" }],
                        "edges": [{ "fill_left": 0, "commands": [
                            { "op": "move_to", "pts": [0.0, 0.0] },
                            { "op": "line_to", "pts": [10.0, 0.0] },
                            { "op": "line_to", "pts": [10.0, 10.0] },
                            { "op": "line_to", "pts": [0.0, 0.0] }
                        ]}]
                    }]},
                    { "index": 3, "duration": 1, "elements": [{
                        "type": "shape",
                        "matrix": { "tx": 30.0 },
                        "fills": [{ "type": "solid", "color": "#0000FF" }],
                        "edges": [{ "fill_left": 0, "commands": [
                            { "op": "move_to", "pts": [0.0, 0.0] },
                            { "op": "line_to", "pts": [10.0, 0.0] },
                            { "op": "line_to", "pts": [10.0, 10.0] },
                            { "op": "line_to", "pts": [0.0, 0.0] }
                        ]}]
                    }]}
                ]
            }]
        }]
    }))
    .unwrap()
}

#[test]
fn test_exports_every_frame_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let written = render_png_sequence(moving_box(), &ExportOptions::default(), dir.path()).unwrap();

    assert_eq!(written.len(), 4);
    assert_eq!(written[3].file_name().unwrap(), "frame_00003.png");
    for path in &written {
        let bytes = fs::read(path).unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");
    }
}

#[test]
fn test_range_is_clamped_to_document() {
    let dir = tempfile::tempdir().unwrap();
    let options = ExportOptions {
        start: 2,
        end: Some(100),
        width: Some(128),
        height: Some(96),
        ..Default::default()
    };
    let written = render_png_sequence(moving_box(), &options, dir.path()).unwrap();
    assert_eq!(written.len(), 2);
}

#[test]
fn test_empty_range_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let options = ExportOptions {
        start: 3,
        end: Some(1),
        ..Default::default()
    };
    assert!(render_png_sequence(moving_box(), &options, dir.path()).is_err());
}

#[test]
fn test_load_document_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.json");
    let err = load_document(&missing).unwrap_err();
    assert!(format!("{:#}", err).contains("nope.json"));

    let path = dir.path().join("doc.json");
    fs::write(&path, serde_json::to_string(&moving_box()).unwrap()).unwrap();
    let doc = load_document(&path).unwrap();
    assert_eq!(doc.timelines[0].total_frames, 4);
}
