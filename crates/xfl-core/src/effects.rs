//! Instance filters and blend modes in surface terms.

use crate::color::parse_color;
use crate::surface::{BlendMode, Effect};
use glam::{Vec2, Vec4};
use xfl_data::model::{self as data, Filter};

/// Blur amounts are authored as box sizes; Gaussian sigma is about half.
const BLUR_TO_SIGMA: f32 = 0.5;

pub fn convert_blend_mode(mode: data::BlendMode) -> BlendMode {
    match mode {
        data::BlendMode::Normal | data::BlendMode::Layer => BlendMode::Normal,
        data::BlendMode::Multiply => BlendMode::Multiply,
        data::BlendMode::Screen => BlendMode::Screen,
        data::BlendMode::Lighten => BlendMode::Lighten,
        data::BlendMode::Darken => BlendMode::Darken,
        data::BlendMode::Difference => BlendMode::Difference,
        data::BlendMode::Add => BlendMode::Plus,
        data::BlendMode::Subtract => BlendMode::Subtract,
        data::BlendMode::Invert => BlendMode::Invert,
        data::BlendMode::Alpha => BlendMode::DstIn,
        data::BlendMode::Erase => BlendMode::DstOut,
        data::BlendMode::Overlay => BlendMode::Overlay,
        data::BlendMode::HardLight => BlendMode::HardLight,
    }
}

/// Whether an instance needs an isolated layer of its own.
pub fn needs_layer(mode: Option<data::BlendMode>, effects: &[Effect]) -> bool {
    !effects.is_empty() || matches!(mode, Some(m) if m != data::BlendMode::Normal)
}

pub fn convert_filters(filters: &[Filter]) -> Vec<Effect> {
    filters.iter().filter_map(convert_filter).collect()
}

fn sigma(v: f32) -> f32 {
    if v.is_finite() {
        (v * BLUR_TO_SIGMA).max(0.0)
    } else {
        0.0
    }
}

fn shadow_color(color: &str, alpha: f32, strength: f32) -> Vec4 {
    let c = parse_color(color).unwrap_or(Vec4::new(0.0, 0.0, 0.0, 1.0));
    let a = (c.w * alpha * strength).clamp(0.0, 1.0);
    Vec4::new(c.x, c.y, c.z, if a.is_finite() { a } else { 0.0 })
}

fn convert_filter(filter: &Filter) -> Option<Effect> {
    match *filter {
        Filter::Blur { blur_x, blur_y } => {
            let (sx, sy) = (sigma(blur_x), sigma(blur_y));
            if sx == 0.0 && sy == 0.0 {
                return None;
            }
            Some(Effect::Blur {
                sigma_x: sx,
                sigma_y: sy,
            })
        }
        Filter::DropShadow {
            ref color,
            alpha,
            blur_x,
            blur_y,
            distance,
            angle,
            strength,
        } => {
            let rad = angle.to_radians();
            Some(Effect::DropShadow {
                color: shadow_color(color, alpha, strength),
                offset: Vec2::new(rad.cos(), rad.sin()) * distance,
                blur: Vec2::new(sigma(blur_x), sigma(blur_y)),
                shadow_only: false,
            })
        }
        Filter::Glow {
            ref color,
            alpha,
            blur_x,
            blur_y,
            strength,
        } => Some(Effect::DropShadow {
            color: shadow_color(color, alpha, strength),
            offset: Vec2::ZERO,
            blur: Vec2::new(sigma(blur_x), sigma(blur_y)),
            shadow_only: false,
        }),
        Filter::AdjustColor {
            brightness,
            contrast,
            saturation,
            hue,
        } => {
            let matrix = adjust_color_matrix(brightness, contrast, saturation, hue);
            if matrix == IDENTITY_MATRIX {
                None
            } else {
                Some(Effect::ColorMatrix { matrix })
            }
        }
    }
}

#[rustfmt::skip]
pub const IDENTITY_MATRIX: [f32; 20] = [
    1.0, 0.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0, 0.0,
    0.0, 0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.0, 1.0, 0.0,
];

/// `outer` applied after `inner`, both row-major 4x5.
pub fn concat_color_matrices(outer: &[f32; 20], inner: &[f32; 20]) -> [f32; 20] {
    let mut out = [0.0; 20];
    for row in 0..4 {
        for col in 0..5 {
            let mut v = (0..4)
                .map(|k| outer[row * 5 + k] * inner[k * 5 + col])
                .sum::<f32>();
            if col == 4 {
                v += outer[row * 5 + 4];
            }
            out[row * 5 + col] = v;
        }
    }
    out
}

/// Color matrix for the adjust-color filter. Brightness, contrast and
/// saturation are in -100..100, hue in degrees.
pub fn adjust_color_matrix(brightness: f32, contrast: f32, saturation: f32, hue: f32) -> [f32; 20] {
    let clean = |v: f32, lo: f32, hi: f32| if v.is_finite() { v.clamp(lo, hi) } else { 0.0 };
    let b = clean(brightness, -100.0, 100.0) / 100.0;
    let c = 1.0 + clean(contrast, -100.0, 100.0) / 100.0;
    let s = 1.0 + clean(saturation, -100.0, 100.0) / 100.0;
    let h = clean(hue, -180.0, 180.0).to_radians();

    #[rustfmt::skip]
    let brightness_m = [
        1.0, 0.0, 0.0, 0.0, b,
        0.0, 1.0, 0.0, 0.0, b,
        0.0, 0.0, 1.0, 0.0, b,
        0.0, 0.0, 0.0, 1.0, 0.0,
    ];
    let t = 0.5 * (1.0 - c);
    #[rustfmt::skip]
    let contrast_m = [
        c, 0.0, 0.0, 0.0, t,
        0.0, c, 0.0, 0.0, t,
        0.0, 0.0, c, 0.0, t,
        0.0, 0.0, 0.0, 1.0, 0.0,
    ];
    #[rustfmt::skip]
    let saturation_m = [
        0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s, 0.0, 0.0,
        0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s, 0.0, 0.0,
        0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s, 0.0, 0.0,
        0.0, 0.0, 0.0, 1.0, 0.0,
    ];
    let (sin, cos) = h.sin_cos();
    #[rustfmt::skip]
    let hue_m = [
        0.213 + cos * 0.787 - sin * 0.213, 0.715 - cos * 0.715 - sin * 0.715, 0.072 - cos * 0.072 + sin * 0.928, 0.0, 0.0,
        0.213 - cos * 0.213 + sin * 0.143, 0.715 + cos * 0.285 + sin * 0.140, 0.072 - cos * 0.072 - sin * 0.283, 0.0, 0.0,
        0.213 - cos * 0.213 - sin * 0.787, 0.715 - cos * 0.715 + sin * 0.715, 0.072 + cos * 0.928 + sin * 0.072, 0.0, 0.0,
        0.0, 0.0, 0.0, 1.0, 0.0,
    ];

    let mut m = IDENTITY_MATRIX;
    for step in [brightness_m, contrast_m, saturation_m, hue_m] {
        m = concat_color_matrices(&step, &m);
    }
    snap_identity(m)
}

/// Float noise from the neutral settings should still read as identity.
fn snap_identity(m: [f32; 20]) -> [f32; 20] {
    if m.iter().zip(IDENTITY_MATRIX.iter()).all(|(a, b)| (a - b).abs() < 1e-5) {
        IDENTITY_MATRIX
    } else {
        m
    }
}
