//! Static text layout into glyph runs.

use crate::diagnostics::WarnOnce;
use crate::paint::solid;
use crate::surface::{GlyphRun, Surface};
use kurbo::Point;
use std::collections::HashSet;
use xfl_data::model::{ColorTransform, TextAlignment, TextElement, TextRun};

/// Face used when a requested face is not ready.
pub const FALLBACK_FACE: &str = "sans-serif";

/// Answers whether a font face can be drawn right now. Never blocks.
pub trait FontProvider: Send + Sync {
    fn is_ready(&self, face: &str) -> bool;
}

/// Treats every face as available.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllFontsReady;

impl FontProvider for AllFontsReady {
    fn is_ready(&self, _face: &str) -> bool {
        true
    }
}

/// Distinct faces used by `runs` that `fonts` cannot draw yet.
pub fn missing_faces<'a>(
    runs: impl IntoIterator<Item = &'a TextRun>,
    fonts: &dyn FontProvider,
) -> HashSet<String> {
    runs.into_iter()
        .filter(|r| !fonts.is_ready(&r.face))
        .map(|r| r.face.clone())
        .collect()
}

struct Piece<'a> {
    run: &'a TextRun,
    text: &'a str,
}

/// Lays `text` out inside its box. Lines break on `'\n'`; each line takes
/// the alignment of its first run.
pub fn layout_text(
    text: &TextElement,
    surface: &dyn Surface,
    missing: &HashSet<String>,
    ct: Option<&ColorTransform>,
    warnings: &mut WarnOnce,
) -> Vec<GlyphRun> {
    let mut lines: Vec<Vec<Piece<'_>>> = vec![Vec::new()];
    for run in &text.runs {
        for (i, part) in run.characters.split('\n').enumerate() {
            if i > 0 {
                lines.push(Vec::new());
            }
            if let Some(line) = lines.last_mut() {
                line.push(Piece { run, text: part });
            }
        }
    }

    let bounds = text.bounds;
    let mut out = Vec::new();
    let mut y = bounds.top;
    for line in &lines {
        let Some(first) = line.first() else {
            continue;
        };
        let line_size = line.iter().map(|p| p.run.size).fold(0.0f32, f32::max);
        let spacing = line.iter().map(|p| p.run.line_spacing).fold(0.0f32, f32::max);
        let baseline = y + line_size;

        let measured: Vec<(f32, &str)> = line
            .iter()
            .map(|p| {
                let face = resolve_face(&p.run.face, missing);
                let chars = p.text.chars().count() as f32;
                let width = surface.measure_text(p.text, face, p.run.size) + p.run.letter_spacing * chars;
                (width, face)
            })
            .collect();
        let line_width: f32 = measured.iter().map(|(w, _)| w).sum();

        let slack = if bounds.width > 0.0 {
            bounds.width - line_width
        } else {
            0.0
        };
        let mut x = bounds.left
            + match first.run.alignment {
                TextAlignment::Left | TextAlignment::Justify => 0.0,
                TextAlignment::Center => slack / 2.0,
                TextAlignment::Right => slack,
            };

        for (piece, (width, face)) in line.iter().zip(measured) {
            if !piece.text.is_empty() {
                out.push(GlyphRun {
                    text: piece.text.to_string(),
                    face: face.to_string(),
                    size: piece.run.size,
                    paint: solid(&piece.run.color, piece.run.alpha, ct, warnings),
                    origin: Point::new(x as f64, baseline as f64),
                    letter_spacing: piece.run.letter_spacing,
                    width,
                });
            }
            x += width;
        }
        y = baseline + spacing;
    }
    out
}

fn resolve_face<'a>(face: &'a str, missing: &HashSet<String>) -> &'a str {
    if missing.contains(face) {
        FALLBACK_FACE
    } else {
        face
    }
}
