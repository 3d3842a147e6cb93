use serde_json::{json, Value};
use xfl_core::surface::Surface;
use xfl_core::Player;
use xfl_data::model::Document;
use xfl_skia::{BitmapStore, SkiaSurface};

fn square(size: f64, tx: f64, ty: f64, color: &str) -> Value {
    json!({
        "type": "shape",
        "matrix": { "tx": tx, "ty": ty },
        "fills": [{ "type": "solid", "color": color }],
        "edges": [{
            "fill_left": 0,
            "commands": [
                { "op": "move_to", "pts": [0.0, 0.0] },
                { "op": "line_to", "pts": [size, 0.0] },
                { "op": "line_to", "pts": [size, size] },
                { "op": "line_to", "pts": [0.0, size] },
                { "op": "line_to", "pts": [0.0, 0.0] }
            ]
        }]
    })
}

fn document(layers: Value, symbols: Value) -> Document {
    serde_json::from_value(json!({
        "width": 100.0,
        "height": 100.0,
        "background_color": "#FFFFFF",
        "timelines": [{ "name": "Scene 1", "total_frames": 1, "layers": layers }],
        "symbols": symbols
    }))
    .unwrap()
}

fn single(elements: Value) -> Value {
    json!([{ "index": 0, "duration": 1, "elements": elements }])
}

fn render(doc: Document, width: i32, height: i32) -> SkiaSurface {
    let mut surface = SkiaSurface::new(width, height)
        .unwrap()
        .with_bitmaps(BitmapStore::from_document(&doc));
    let mut player = Player::new();
    player.set_document(doc).unwrap();
    player.update_canvas_size(width as f64, height as f64);
    player.render_frame(&mut surface, 0).unwrap();
    surface
}

fn pixel(surface: &mut SkiaSurface, x: u32, y: u32) -> [u8; 4] {
    surface.read_pixels().unwrap().pixel(x, y).unwrap()
}

const RED: [u8; 4] = [255, 0, 0, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];

#[test]
fn test_fills_land_on_pixels() {
    let doc = document(
        json!([{ "name": "box", "frames": single(json!([square(50.0, 0.0, 0.0, "#FF0000")])) }]),
        json!({}),
    );
    let mut surface = render(doc, 100, 100);
    assert_eq!(pixel(&mut surface, 25, 25), RED);
    assert_eq!(pixel(&mut surface, 75, 75), WHITE);
}

#[test]
fn test_letterboxing_centers_the_stage() {
    let doc = document(
        json!([{ "name": "box", "frames": single(json!([square(50.0, 0.0, 0.0, "#FF0000")])) }]),
        json!({}),
    );
    let mut surface = render(doc, 200, 100);
    assert_eq!(pixel(&mut surface, 25, 25), WHITE);
    assert_eq!(pixel(&mut surface, 75, 25), RED);
}

#[test]
fn test_mask_clips_content() {
    let doc = document(
        json!([
            { "name": "mask", "kind": "mask", "frames": single(json!([square(20.0, 0.0, 0.0, "#000000")])) },
            { "name": "art", "kind": "masked", "mask_layer": 0,
              "frames": single(json!([square(50.0, 0.0, 0.0, "#FF0000")])) }
        ]),
        json!({}),
    );
    let mut surface = render(doc, 100, 100);
    assert_eq!(pixel(&mut surface, 10, 10), RED);
    assert_eq!(pixel(&mut surface, 30, 30), WHITE);
}

#[test]
fn test_color_transform_tints_symbol() {
    let doc = document(
        json!([{ "name": "holder", "frames": single(json!([{
            "type": "symbol",
            "symbol": "box",
            "color_transform": { "alpha_multiplier": 0.5 }
        }])) }]),
        json!({
            "box": {
                "name": "box",
                "timeline": {
                    "name": "box",
                    "total_frames": 1,
                    "layers": [{ "name": "l", "frames": single(json!([square(50.0, 0.0, 0.0, "#FF0000")])) }]
                }
            }
        }),
    );
    let mut surface = render(doc, 100, 100);
    let [r, g, b, a] = pixel(&mut surface, 25, 25);
    assert_eq!((r, a), (255, 255));
    assert!((g as i32 - 128).abs() <= 2, "g = {}", g);
    assert!((b as i32 - 128).abs() <= 2, "b = {}", b);
}

#[test]
fn test_png_encoding() {
    let doc = document(json!([]), json!({}));
    let mut surface = render(doc, 16, 16);
    let png = surface.encode_png().unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
}
