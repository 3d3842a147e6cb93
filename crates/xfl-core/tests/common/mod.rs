#![allow(dead_code)]

use std::collections::HashMap;
use xfl_core::surface::RecordingSurface;
use xfl_data::model::{
    Document, Edge, Element, FillStyle, Frame, Layer, LayerKind, LoopMode, Matrix, PathCommand,
    Point, ShapeElement, Symbol, SymbolInstance, SymbolKind, Timeline, TweenKind,
};

pub fn square_edges(size: f64) -> Vec<Edge> {
    let p = Point::new;
    vec![Edge {
        fill_left: Some(0),
        commands: vec![
            PathCommand::MoveTo(p(0.0, 0.0)),
            PathCommand::LineTo(p(size, 0.0)),
            PathCommand::LineTo(p(size, size)),
            PathCommand::LineTo(p(0.0, size)),
            PathCommand::LineTo(p(0.0, 0.0)),
        ],
        ..Default::default()
    }]
}

pub fn square(size: f64, tx: f64, ty: f64) -> Element {
    Element::Shape(ShapeElement {
        matrix: Matrix::translate(tx, ty),
        fills: vec![FillStyle::Solid {
            color: "#FF0000".into(),
            alpha: 1.0,
        }],
        strokes: vec![],
        edges: square_edges(size),
    })
}

pub fn instance(symbol: &str, first_frame: u32, loop_mode: LoopMode, matrix: Matrix) -> Element {
    Element::Symbol(SymbolInstance {
        symbol: symbol.into(),
        matrix,
        first_frame,
        loop_mode,
        color_transform: None,
        filters: vec![],
        blend_mode: None,
        transformation_point: None,
    })
}

pub fn keyframe(index: u32, duration: u32, tween: TweenKind, elements: Vec<Element>) -> Frame {
    Frame {
        index,
        duration,
        tween,
        elements,
        ..Default::default()
    }
}

pub fn layer(name: &str, frames: Vec<Frame>) -> Layer {
    Layer {
        name: name.into(),
        kind: LayerKind::Normal,
        frames,
        ..Default::default()
    }
}

pub fn timeline(name: &str, total_frames: u32, layers: Vec<Layer>) -> Timeline {
    Timeline {
        name: name.into(),
        layers,
        total_frames,
        ..Default::default()
    }
}

/// A 400x400 stage, so every viewport fit is the standard one.
pub fn document(total_frames: u32, layers: Vec<Layer>) -> Document {
    Document {
        width: 400.0,
        height: 400.0,
        frame_rate: 24.0,
        background_color: "#FFFFFF".into(),
        timelines: vec![timeline("Scene 1", total_frames, layers)],
        symbols: HashMap::new(),
        bitmaps: HashMap::new(),
        sounds: HashMap::new(),
    }
}

pub fn add_symbol(doc: &mut Document, name: &str, timeline: Timeline) {
    doc.symbols.insert(
        name.into(),
        Symbol {
            name: name.into(),
            kind: SymbolKind::Graphic,
            timeline,
        },
    );
}

/// Translation of every fill, in paint order.
pub fn fill_offsets(surface: &RecordingSurface) -> Vec<(f64, f64)> {
    surface
        .fills()
        .map(|(t, _, _)| {
            let c = t.as_coeffs();
            (c[4], c[5])
        })
        .collect()
}
