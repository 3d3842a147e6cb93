//! Core surface types to Skia objects.

use glam::Vec4;
use kurbo::{Affine, BezPath, PathEl};
use skia_safe::color_filters::Clamp;
use skia_safe::{
    color_filters, gradient_shader, image_filters, BlendMode, Color, Color4f, ImageFilter, Matrix,
    Paint, PaintCap, PaintJoin, Path, PathFillType, Point, SamplingOptions, TileMode,
};
use xfl_core::surface::{
    BlendMode as CoreBlendMode, Effect, FillRule, Gradient, GradientKind, LineCap, LineJoin,
    Paint as CorePaint, GRADIENT_HALF_EXTENT,
};

use crate::assets::BitmapStore;

pub(crate) fn sanitize(v: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

fn coord(v: f64) -> f32 {
    sanitize(v as f32)
}

pub(crate) fn affine_to_matrix(t: Affine) -> Matrix {
    let [a, b, c, d, e, f] = t.as_coeffs();
    Matrix::new_all(
        coord(a), coord(c), coord(e),
        coord(b), coord(d), coord(f),
        0.0, 0.0, 1.0,
    )
}

pub(crate) fn color4f(v: Vec4) -> Color4f {
    Color4f::new(sanitize(v.x), sanitize(v.y), sanitize(v.z), sanitize(v.w))
}

fn color_legacy(v: Vec4) -> Color {
    color4f(v).to_color()
}

pub(crate) fn kurbo_to_skia_path(bez_path: &BezPath) -> Path {
    let mut path = Path::new();
    for el in bez_path.elements() {
        match el {
            PathEl::MoveTo(p) => {
                path.move_to((coord(p.x), coord(p.y)));
            }
            PathEl::LineTo(p) => {
                path.line_to((coord(p.x), coord(p.y)));
            }
            PathEl::QuadTo(p1, p2) => {
                path.quad_to((coord(p1.x), coord(p1.y)), (coord(p2.x), coord(p2.y)));
            }
            PathEl::CurveTo(p1, p2, p3) => {
                path.cubic_to(
                    (coord(p1.x), coord(p1.y)),
                    (coord(p2.x), coord(p2.y)),
                    (coord(p3.x), coord(p3.y)),
                );
            }
            PathEl::ClosePath => {
                path.close();
            }
        }
    }
    path
}

pub(crate) fn convert_fill_rule(rule: FillRule) -> PathFillType {
    match rule {
        FillRule::NonZero => PathFillType::Winding,
        FillRule::EvenOdd => PathFillType::EvenOdd,
    }
}

pub(crate) fn convert_cap(cap: LineCap) -> PaintCap {
    match cap {
        LineCap::Butt => PaintCap::Butt,
        LineCap::Round => PaintCap::Round,
        LineCap::Square => PaintCap::Square,
    }
}

pub(crate) fn convert_join(join: LineJoin) -> PaintJoin {
    match join {
        LineJoin::Miter => PaintJoin::Miter,
        LineJoin::Round => PaintJoin::Round,
        LineJoin::Bevel => PaintJoin::Bevel,
    }
}

pub(crate) fn convert_blend_mode(mode: CoreBlendMode) -> BlendMode {
    match mode {
        CoreBlendMode::Normal => BlendMode::SrcOver,
        CoreBlendMode::Multiply => BlendMode::Multiply,
        CoreBlendMode::Screen => BlendMode::Screen,
        CoreBlendMode::Lighten => BlendMode::Lighten,
        CoreBlendMode::Darken => BlendMode::Darken,
        CoreBlendMode::Difference => BlendMode::Difference,
        CoreBlendMode::Plus => BlendMode::Plus,
        // Skia has no subtract or invert mode; difference is the closest.
        CoreBlendMode::Subtract | CoreBlendMode::Invert => BlendMode::Difference,
        CoreBlendMode::DstIn => BlendMode::DstIn,
        CoreBlendMode::DstOut => BlendMode::DstOut,
        CoreBlendMode::Overlay => BlendMode::Overlay,
        CoreBlendMode::HardLight => BlendMode::HardLight,
    }
}

/// Sets color or shader on `paint`. Returns false when nothing drawable
/// could be built.
pub(crate) fn setup_paint_shader(paint: &mut Paint, core_paint: &CorePaint, bitmaps: &BitmapStore) -> bool {
    match core_paint {
        CorePaint::Solid(color) => {
            paint.set_color4f(color4f(*color), None);
            true
        }
        CorePaint::Native { alpha, .. } => {
            paint.set_color4f(Color4f::new(0.0, 0.0, 0.0, sanitize(*alpha)), None);
            true
        }
        CorePaint::Gradient(grad) => match gradient_shader_for(grad) {
            Some(shader) => {
                paint.set_shader(shader);
                true
            }
            None => false,
        },
        CorePaint::Bitmap(bitmap) => {
            let Some(image) = bitmaps.get(&bitmap.name) else {
                return false;
            };
            let tile = if bitmap.repeat {
                TileMode::Repeat
            } else {
                TileMode::Clamp
            };
            let matrix = affine_to_matrix(bitmap.transform);
            match image.to_shader((tile, tile), SamplingOptions::default(), &matrix) {
                Some(shader) => {
                    paint.set_shader(shader);
                    true
                }
                None => false,
            }
        }
    }
}

fn gradient_shader_for(grad: &Gradient) -> Option<skia_safe::Shader> {
    if grad.stops.is_empty() {
        return None;
    }
    let colors: Vec<Color> = grad.stops.iter().map(|s| color_legacy(s.color)).collect();
    let pos: Vec<f32> = grad
        .stops
        .iter()
        .map(|s| sanitize(s.offset).clamp(0.0, 1.0))
        .collect();
    let local = affine_to_matrix(grad.transform);

    match grad.kind {
        GradientKind::Linear => {
            let (start, end) = Gradient::linear_span();
            gradient_shader::linear(
                (
                    Point::new(coord(start.x), coord(start.y)),
                    Point::new(coord(end.x), coord(end.y)),
                ),
                colors.as_slice(),
                Some(pos.as_slice()),
                TileMode::Clamp,
                None,
                &local,
            )
        }
        GradientKind::Radial => gradient_shader::radial(
            Point::new(0.0, 0.0),
            GRADIENT_HALF_EXTENT as f32,
            colors.as_slice(),
            Some(pos.as_slice()),
            TileMode::Clamp,
            None,
            &local,
        ),
    }
}

/// Chains effects in order; each one takes the previous as input.
pub(crate) fn build_filter(effects: &[Effect]) -> Option<ImageFilter> {
    let mut filter: Option<ImageFilter> = None;
    for effect in effects {
        let next_filter = match effect {
            Effect::Blur { sigma_x, sigma_y } => image_filters::blur(
                (sanitize(*sigma_x), sanitize(*sigma_y)),
                TileMode::Decal,
                filter.clone(),
                None,
            ),
            Effect::DropShadow {
                color,
                offset,
                blur,
                shadow_only,
            } => {
                let c = color_legacy(*color);
                let dx = sanitize(offset.x);
                let dy = sanitize(offset.y);
                let b = (sanitize(blur.x), sanitize(blur.y));
                if *shadow_only {
                    image_filters::drop_shadow_only((dx, dy), b, c, None, filter.clone(), None)
                } else {
                    image_filters::drop_shadow((dx, dy), b, c, None, filter.clone(), None)
                }
            }
            Effect::ColorMatrix { matrix } => image_filters::color_filter(
                color_filters::matrix_row_major(matrix, Clamp::Yes),
                filter.clone(),
                None,
            ),
        };
        // A filter Skia refuses leaves the chain as it was.
        if next_filter.is_some() {
            filter = next_filter;
        }
    }
    filter
}
