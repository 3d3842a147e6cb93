//! Color parsing and color-transform arithmetic.

use glam::Vec4;
use xfl_data::model::ColorTransform;

/// Parses `#RGB`, `#RRGGBB`, `#RRGGBBAA`, `rgb()`/`rgba()` and a handful of
/// named colors into normalized RGBA.
pub fn parse_color(s: &str) -> Option<Vec4> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }
    let lower = s.to_ascii_lowercase();
    if let Some(args) = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return parse_rgb_function(args);
    }
    named_color(&lower)
}

fn parse_hex(hex: &str) -> Option<Vec4> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize, len: usize| -> Option<f32> {
        let v = u8::from_str_radix(&hex[i..i + len], 16).ok()?;
        // Short form repeats the digit: "f" is "ff".
        let v = if len == 1 { v * 17 } else { v };
        Some(v as f32 / 255.0)
    };
    match hex.len() {
        3 => Some(Vec4::new(channel(0, 1)?, channel(1, 1)?, channel(2, 1)?, 1.0)),
        6 => Some(Vec4::new(channel(0, 2)?, channel(2, 2)?, channel(4, 2)?, 1.0)),
        8 => Some(Vec4::new(
            channel(0, 2)?,
            channel(2, 2)?,
            channel(4, 2)?,
            channel(6, 2)?,
        )),
        _ => None,
    }
}

fn parse_rgb_function(args: &str) -> Option<Vec4> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let mut rgb = [0.0f32; 3];
    for (slot, part) in rgb.iter_mut().zip(&parts) {
        let v = match part.strip_suffix('%') {
            Some(pct) => pct.parse::<f32>().ok()? / 100.0,
            None => part.parse::<f32>().ok()? / 255.0,
        };
        *slot = v.clamp(0.0, 1.0);
    }
    let a = match parts.get(3) {
        Some(a) => a.parse::<f32>().ok()?.clamp(0.0, 1.0),
        None => 1.0,
    };
    Some(Vec4::new(rgb[0], rgb[1], rgb[2], a))
}

fn named_color(name: &str) -> Option<Vec4> {
    let rgb = match name {
        "black" => 0x000000,
        "white" => 0xFFFFFF,
        "red" => 0xFF0000,
        "lime" => 0x00FF00,
        "green" => 0x008000,
        "blue" => 0x0000FF,
        "yellow" => 0xFFFF00,
        "cyan" | "aqua" => 0x00FFFF,
        "magenta" | "fuchsia" => 0xFF00FF,
        "gray" | "grey" => 0x808080,
        "silver" => 0xC0C0C0,
        "maroon" => 0x800000,
        "olive" => 0x808000,
        "navy" => 0x000080,
        "purple" => 0x800080,
        "teal" => 0x008080,
        "orange" => 0xFFA500,
        "transparent" => return Some(Vec4::ZERO),
        _ => return None,
    };
    Some(Vec4::new(
        ((rgb >> 16) & 0xFF) as f32 / 255.0,
        ((rgb >> 8) & 0xFF) as f32 / 255.0,
        (rgb & 0xFF) as f32 / 255.0,
        1.0,
    ))
}

/// `channel' = clamp(channel * multiplier + offset)` in 0..255 units.
pub fn apply_color_transform(color: Vec4, ct: &ColorTransform) -> Vec4 {
    let ch = |v: f32, mult: f32, offset: f32| ((v * 255.0 * mult + offset).clamp(0.0, 255.0)) / 255.0;
    Vec4::new(
        ch(color.x, ct.red_multiplier, ct.red_offset),
        ch(color.y, ct.green_multiplier, ct.green_offset),
        ch(color.z, ct.blue_multiplier, ct.blue_offset),
        ch(color.w, ct.alpha_multiplier, ct.alpha_offset),
    )
}

/// The transform equivalent to applying `inner` first, then `outer`.
pub fn concat_color_transforms(outer: &ColorTransform, inner: &ColorTransform) -> ColorTransform {
    ColorTransform {
        red_multiplier: inner.red_multiplier * outer.red_multiplier,
        green_multiplier: inner.green_multiplier * outer.green_multiplier,
        blue_multiplier: inner.blue_multiplier * outer.blue_multiplier,
        alpha_multiplier: inner.alpha_multiplier * outer.alpha_multiplier,
        red_offset: inner.red_offset * outer.red_multiplier + outer.red_offset,
        green_offset: inner.green_offset * outer.green_multiplier + outer.green_offset,
        blue_offset: inner.blue_offset * outer.blue_multiplier + outer.blue_offset,
        alpha_offset: inner.alpha_offset * outer.alpha_multiplier + outer.alpha_offset,
    }
}

/// Row-major 4x5 color matrix for a color transform, with offsets normalized
/// to 0..1.
pub fn color_transform_matrix(ct: &ColorTransform) -> [f32; 20] {
    #[rustfmt::skip]
    let m = [
        ct.red_multiplier, 0.0, 0.0, 0.0, ct.red_offset / 255.0,
        0.0, ct.green_multiplier, 0.0, 0.0, ct.green_offset / 255.0,
        0.0, 0.0, ct.blue_multiplier, 0.0, ct.blue_offset / 255.0,
        0.0, 0.0, 0.0, ct.alpha_multiplier, ct.alpha_offset / 255.0,
    ];
    m
}
