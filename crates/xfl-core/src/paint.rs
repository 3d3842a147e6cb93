//! Resolution of fill and stroke styles into drawable paints.

use crate::color::{apply_color_transform, parse_color};
use crate::diagnostics::{WarnKey, WarnOnce};
use crate::surface::{
    BitmapPaint, Gradient, GradientKind, GradientStop, LineCap, LineJoin, Paint, Stroke,
};
use crate::transform::to_affine;
use glam::Vec4;
use kurbo::Affine;
use std::collections::HashMap;
use xfl_data::model::{
    self as data, Bitmap, CapStyle, ColorTransform, FillStyle, JointStyle, StrokeStyle,
};

pub struct PaintResolver<'a> {
    bitmaps: &'a HashMap<String, Bitmap>,
}

impl<'a> PaintResolver<'a> {
    pub fn new(bitmaps: &'a HashMap<String, Bitmap>) -> Self {
        Self { bitmaps }
    }

    /// `None` means the style contributes no pixels.
    pub fn resolve_fill(
        &self,
        style: &FillStyle,
        ct: Option<&ColorTransform>,
        warnings: &mut WarnOnce,
    ) -> Option<Paint> {
        match style {
            FillStyle::Solid { color, alpha } => Some(solid(color, *alpha, ct, warnings)),
            FillStyle::LinearGradient(g) => gradient(GradientKind::Linear, g, ct, warnings),
            FillStyle::RadialGradient(g) => gradient(GradientKind::Radial, g, ct, warnings),
            FillStyle::Bitmap {
                bitmap,
                matrix,
                clipped,
            } => {
                if !self.bitmaps.contains_key(bitmap) {
                    warnings.warn(WarnKey::MissingBitmap(bitmap.clone()));
                    return None;
                }
                Some(Paint::Bitmap(BitmapPaint {
                    name: bitmap.clone(),
                    transform: matrix.as_ref().map(to_affine).unwrap_or(Affine::IDENTITY),
                    repeat: !clipped,
                }))
            }
        }
    }

    pub fn resolve_stroke(
        &self,
        style: &StrokeStyle,
        ct: Option<&ColorTransform>,
        warnings: &mut WarnOnce,
    ) -> Option<Stroke> {
        let paint = self.resolve_fill(&style.fill, ct, warnings)?;
        let width = if style.weight.is_finite() {
            style.weight.max(0.0)
        } else {
            0.0
        };
        Some(Stroke {
            paint,
            width,
            cap: match style.caps {
                CapStyle::None => LineCap::Butt,
                CapStyle::Round => LineCap::Round,
                CapStyle::Square => LineCap::Square,
            },
            join: match style.joints {
                JointStyle::Miter => LineJoin::Miter,
                JointStyle::Round => LineJoin::Round,
                JointStyle::Bevel => LineJoin::Bevel,
            },
            miter_limit: if style.miter_limit.is_finite() {
                style.miter_limit.max(1.0)
            } else {
                4.0
            },
        })
    }
}

/// Solid color with alpha, color transform applied. Unparseable colors pass
/// through untouched for the surface to interpret.
pub fn solid(
    color: &str,
    alpha: f32,
    ct: Option<&ColorTransform>,
    warnings: &mut WarnOnce,
) -> Paint {
    let alpha = if alpha.is_finite() {
        alpha.clamp(0.0, 1.0)
    } else {
        1.0
    };
    match parse_color(color) {
        Some(c) => {
            let c = Vec4::new(c.x, c.y, c.z, c.w * alpha);
            Paint::Solid(match ct {
                Some(ct) => apply_color_transform(c, ct),
                None => c,
            })
        }
        None => {
            warnings.warn(WarnKey::UnknownColor(color.to_string()));
            let alpha = match ct {
                Some(ct) => apply_color_transform(Vec4::new(0.0, 0.0, 0.0, alpha), ct).w,
                None => alpha,
            };
            Paint::Native {
                color: color.to_string(),
                alpha,
            }
        }
    }
}

fn gradient(
    kind: GradientKind,
    g: &data::Gradient,
    ct: Option<&ColorTransform>,
    warnings: &mut WarnOnce,
) -> Option<Paint> {
    if g.stops.is_empty() {
        return None;
    }
    let mut stops: Vec<GradientStop> = g
        .stops
        .iter()
        .map(|s| {
            let color = match parse_color(&s.color) {
                Some(c) => c,
                None => {
                    warnings.warn(WarnKey::UnknownColor(s.color.clone()));
                    Vec4::new(0.0, 0.0, 0.0, 1.0)
                }
            };
            let alpha = if s.alpha.is_finite() {
                s.alpha.clamp(0.0, 1.0)
            } else {
                1.0
            };
            let color = Vec4::new(color.x, color.y, color.z, color.w * alpha);
            GradientStop {
                offset: if s.ratio.is_finite() {
                    s.ratio.clamp(0.0, 1.0)
                } else {
                    0.0
                },
                color: match ct {
                    Some(ct) => apply_color_transform(color, ct),
                    None => color,
                },
            }
        })
        .collect();
    stops.sort_by(|a, b| a.offset.total_cmp(&b.offset));

    Some(Paint::Gradient(Gradient {
        kind,
        stops,
        transform: g.matrix.as_ref().map(to_affine).unwrap_or(Affine::IDENTITY),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use xfl_data::model::{GradientStop as DataStop, Matrix};

    fn no_bitmaps() -> HashMap<String, Bitmap> {
        HashMap::new()
    }

    #[test]
    fn test_solid_with_alpha_and_transform() {
        let bitmaps = no_bitmaps();
        let resolver = PaintResolver::new(&bitmaps);
        let mut warnings = WarnOnce::new();
        let ct = ColorTransform::alpha(0.5);
        let paint = resolver
            .resolve_fill(
                &FillStyle::Solid {
                    color: "#FF0000".into(),
                    alpha: 0.8,
                },
                Some(&ct),
                &mut warnings,
            )
            .unwrap();
        match paint {
            Paint::Solid(c) => {
                assert_eq!(c.x, 1.0);
                assert!((c.w - 0.4).abs() < 1e-3);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_empty_gradient_is_transparent() {
        let bitmaps = no_bitmaps();
        let resolver = PaintResolver::new(&bitmaps);
        let style = FillStyle::LinearGradient(data::Gradient::default());
        assert!(resolver
            .resolve_fill(&style, None, &mut WarnOnce::new())
            .is_none());
    }

    #[test]
    fn test_gradient_stops_sorted_and_placed() {
        let bitmaps = no_bitmaps();
        let resolver = PaintResolver::new(&bitmaps);
        let style = FillStyle::RadialGradient(data::Gradient {
            stops: vec![
                DataStop {
                    ratio: 1.0,
                    color: "#000".into(),
                    alpha: 1.0,
                },
                DataStop {
                    ratio: 0.0,
                    color: "#FFF".into(),
                    alpha: 0.5,
                },
            ],
            matrix: Some(Matrix::scale(0.1, 0.1)),
        });
        match resolver.resolve_fill(&style, None, &mut WarnOnce::new()) {
            Some(Paint::Gradient(g)) => {
                assert_eq!(g.kind, GradientKind::Radial);
                assert_eq!(g.stops[0].offset, 0.0);
                assert_eq!(g.stops[0].color, Vec4::new(1.0, 1.0, 1.0, 0.5));
                assert_eq!(g.transform, Affine::scale(0.1));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_missing_bitmap_resolves_to_nothing_and_warns_once() {
        let bitmaps = no_bitmaps();
        let resolver = PaintResolver::new(&bitmaps);
        let mut warnings = WarnOnce::new();
        let style = FillStyle::Bitmap {
            bitmap: "photo.png".into(),
            matrix: None,
            clipped: false,
        };
        assert!(resolver.resolve_fill(&style, None, &mut warnings).is_none());
        assert!(resolver.resolve_fill(&style, None, &mut warnings).is_none());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_present_bitmap_paints() {
        let mut bitmaps = no_bitmaps();
        bitmaps.insert(
            "photo.png".into(),
            Bitmap {
                name: "photo.png".into(),
                width: 4,
                height: 4,
                source: None,
            },
        );
        let resolver = PaintResolver::new(&bitmaps);
        let style = FillStyle::Bitmap {
            bitmap: "photo.png".into(),
            matrix: Some(Matrix::translate(3.0, 4.0)),
            clipped: true,
        };
        match resolver.resolve_fill(&style, None, &mut WarnOnce::new()) {
            Some(Paint::Bitmap(b)) => {
                assert!(!b.repeat);
                assert_eq!(b.transform, Affine::translate((3.0, 4.0)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_native_color_passthrough() {
        let mut warnings = WarnOnce::new();
        let paint = solid("hsl(120, 100%, 50%)", 1.0, None, &mut warnings);
        assert_eq!(
            paint,
            Paint::Native {
                color: "hsl(120, 100%, 50%)".into(),
                alpha: 1.0
            }
        );
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_stroke_hairline_and_caps() {
        let bitmaps = no_bitmaps();
        let resolver = PaintResolver::new(&bitmaps);
        let style = StrokeStyle {
            fill: FillStyle::Solid {
                color: "#000".into(),
                alpha: 1.0,
            },
            weight: f32::NAN,
            caps: CapStyle::None,
            joints: JointStyle::Bevel,
            miter_limit: 3.0,
        };
        let stroke = resolver
            .resolve_stroke(&style, None, &mut WarnOnce::new())
            .unwrap();
        assert_eq!(stroke.width, 0.0);
        assert_eq!(stroke.cap, LineCap::Butt);
        assert_eq!(stroke.join, LineJoin::Bevel);
    }
}
