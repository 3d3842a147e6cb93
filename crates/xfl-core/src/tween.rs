//! Tween math: easing curves and component-wise interpolation of transforms,
//! color transforms, filters and morph-shape geometry.

use glam::Vec2;
use xfl_data::model::{
    ColorTransform, Easing, Edge, Element, Filter, Matrix, MorphShape, PathCommand, Point,
    ShapeElement,
};

pub trait Interpolatable: Sized + Clone {
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

impl Interpolatable for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Interpolatable for f64 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t as f64
    }
}

impl Interpolatable for Point {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Point::new(self.x.lerp(&other.x, t), self.y.lerp(&other.y, t))
    }
}

/// Each of the six components blends on its own; no decomposition.
impl Interpolatable for Matrix {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        let a = self.to_array();
        let b = other.to_array();
        let mut out = [0.0; 6];
        for i in 0..6 {
            out[i] = a[i].lerp(&b[i], t);
        }
        Matrix::from_array(out)
    }
}

impl Interpolatable for ColorTransform {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        ColorTransform {
            red_multiplier: self.red_multiplier.lerp(&other.red_multiplier, t),
            green_multiplier: self.green_multiplier.lerp(&other.green_multiplier, t),
            blue_multiplier: self.blue_multiplier.lerp(&other.blue_multiplier, t),
            alpha_multiplier: self.alpha_multiplier.lerp(&other.alpha_multiplier, t),
            red_offset: self.red_offset.lerp(&other.red_offset, t),
            green_offset: self.green_offset.lerp(&other.green_offset, t),
            blue_offset: self.blue_offset.lerp(&other.blue_offset, t),
            alpha_offset: self.alpha_offset.lerp(&other.alpha_offset, t),
        }
    }
}

/// Numeric parameters blend; colors and mismatched kinds hold until the end.
impl Interpolatable for Filter {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        let hold = || if t < 1.0 { self.clone() } else { other.clone() };
        match (self, other) {
            (
                Filter::Blur { blur_x, blur_y },
                Filter::Blur {
                    blur_x: bx,
                    blur_y: by,
                },
            ) => Filter::Blur {
                blur_x: blur_x.lerp(bx, t),
                blur_y: blur_y.lerp(by, t),
            },
            (
                Filter::DropShadow {
                    color,
                    alpha,
                    blur_x,
                    blur_y,
                    distance,
                    angle,
                    strength,
                },
                Filter::DropShadow {
                    color: color_b,
                    alpha: alpha_b,
                    blur_x: bx,
                    blur_y: by,
                    distance: dist_b,
                    angle: angle_b,
                    strength: strength_b,
                },
            ) => Filter::DropShadow {
                color: if t < 1.0 { color.clone() } else { color_b.clone() },
                alpha: alpha.lerp(alpha_b, t),
                blur_x: blur_x.lerp(bx, t),
                blur_y: blur_y.lerp(by, t),
                distance: distance.lerp(dist_b, t),
                angle: angle.lerp(angle_b, t),
                strength: strength.lerp(strength_b, t),
            },
            (
                Filter::Glow {
                    color,
                    alpha,
                    blur_x,
                    blur_y,
                    strength,
                },
                Filter::Glow {
                    color: color_b,
                    alpha: alpha_b,
                    blur_x: bx,
                    blur_y: by,
                    strength: strength_b,
                },
            ) => Filter::Glow {
                color: if t < 1.0 { color.clone() } else { color_b.clone() },
                alpha: alpha.lerp(alpha_b, t),
                blur_x: blur_x.lerp(bx, t),
                blur_y: blur_y.lerp(by, t),
                strength: strength.lerp(strength_b, t),
            },
            (
                Filter::AdjustColor {
                    brightness,
                    contrast,
                    saturation,
                    hue,
                },
                Filter::AdjustColor {
                    brightness: br_b,
                    contrast: co_b,
                    saturation: sa_b,
                    hue: hue_b,
                },
            ) => Filter::AdjustColor {
                brightness: brightness.lerp(br_b, t),
                contrast: contrast.lerp(co_b, t),
                saturation: saturation.lerp(sa_b, t),
                hue: hue.lerp(hue_b, t),
            },
            _ => hold(),
        }
    }
}

impl Interpolatable for Vec<Filter> {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        if self.len() != other.len() {
            return if t < 1.0 { self.clone() } else { other.clone() };
        }
        self.iter().zip(other).map(|(a, b)| a.lerp(b, t)).collect()
    }
}

/// Maps linear progress to eased progress.
pub fn ease(easing: Option<&Easing>, t: f32) -> f32 {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    match easing {
        None => t,
        Some(Easing::Acceleration(a)) => acceleration(*a, t),
        Some(Easing::Bezier(points)) => {
            let p = points.map(|p| Vec2::new(p.x as f32, p.y as f32));
            solve_cubic_bezier(p, t)
        }
    }
}

/// Power curve for the classic acceleration slider. The exponent grows with
/// the magnitude, from 1 (linear) at 0 to 3 at ±100.
pub fn acceleration(accel: f32, t: f32) -> f32 {
    if !accel.is_finite() || accel == 0.0 {
        return t;
    }
    let accel = accel.clamp(-100.0, 100.0);
    let exponent = 1.0 + accel.abs() / 50.0;
    if accel > 0.0 {
        1.0 - (1.0 - t).powf(exponent)
    } else {
        t.powf(exponent)
    }
}

fn bezier_axis(a: f32, b: f32, c: f32, d: f32, s: f32) -> f32 {
    let u = 1.0 - s;
    u * u * u * a + 3.0 * u * u * s * b + 3.0 * u * s * s * c + s * s * s * d
}

fn bezier_axis_derivative(a: f32, b: f32, c: f32, d: f32, s: f32) -> f32 {
    let u = 1.0 - s;
    3.0 * u * u * (b - a) + 6.0 * u * s * (c - b) + 3.0 * s * s * (d - c)
}

/// Finds the curve parameter whose x equals `x` and returns the y there.
pub fn solve_cubic_bezier(p: [Vec2; 4], x: f32) -> f32 {
    let [p0, p1, p2, p3] = p;
    if x <= p0.x {
        return p0.y;
    }
    if x >= p3.x {
        return p3.y;
    }

    // Newton-Raphson
    let mut s = ((x - p0.x) / (p3.x - p0.x)).clamp(0.0, 1.0);
    let mut solved = false;
    for _ in 0..8 {
        let err = bezier_axis(p0.x, p1.x, p2.x, p3.x, s) - x;
        if err.abs() < 1e-5 {
            solved = true;
            break;
        }
        let dx_ds = bezier_axis_derivative(p0.x, p1.x, p2.x, p3.x, s);
        if dx_ds.abs() < 1e-6 {
            break;
        }
        s = (s - err / dx_ds).clamp(0.0, 1.0);
    }

    // Bisection when Newton stalls on a flat tangent.
    if !solved {
        let (mut lo, mut hi) = (0.0f32, 1.0f32);
        s = 0.5;
        for _ in 0..32 {
            let v = bezier_axis(p0.x, p1.x, p2.x, p3.x, s);
            if (v - x).abs() < 1e-5 {
                break;
            }
            if v < x {
                lo = s;
            } else {
                hi = s;
            }
            s = (lo + hi) * 0.5;
        }
    }

    bezier_axis(p0.y, p1.y, p2.y, p3.y, s)
}

/// Motion-tween blend of two keyframe elements of the same kind.
pub fn tween_element(start: &Element, end: &Element, t: f32) -> Element {
    match (start, end) {
        (Element::Symbol(a), Element::Symbol(b)) if a.symbol == b.symbol => {
            let mut out = a.clone();
            out.matrix = a.matrix.lerp(&b.matrix, t);
            out.color_transform = match (&a.color_transform, &b.color_transform) {
                (None, None) => None,
                (ca, cb) => {
                    let ca = ca.unwrap_or(ColorTransform::IDENTITY);
                    let cb = cb.unwrap_or(ColorTransform::IDENTITY);
                    Some(ca.lerp(&cb, t))
                }
            };
            out.filters = a.filters.lerp(&b.filters, t);
            Element::Symbol(out)
        }
        (Element::Shape(a), Element::Shape(b)) => {
            let mut out = a.clone();
            out.matrix = a.matrix.lerp(&b.matrix, t);
            Element::Shape(out)
        }
        (Element::Bitmap(a), Element::Bitmap(b)) if a.bitmap == b.bitmap => {
            let mut out = a.clone();
            out.matrix = a.matrix.lerp(&b.matrix, t);
            Element::Bitmap(out)
        }
        (Element::Video(a), Element::Video(b)) => {
            let mut out = a.clone();
            out.matrix = a.matrix.lerp(&b.matrix, t);
            Element::Video(out)
        }
        (Element::Text(a), Element::Text(b)) => {
            let mut out = a.clone();
            out.matrix = a.matrix.lerp(&b.matrix, t);
            Element::Text(out)
        }
        _ => start.clone(),
    }
}

/// Pairs elements by position; unmatched start elements hold.
pub fn tween_elements(start: &[Element], end: &[Element], t: f32) -> Vec<Element> {
    start
        .iter()
        .enumerate()
        .map(|(i, el)| match end.get(i) {
            Some(other) => tween_element(el, other, t),
            None => el.clone(),
        })
        .collect()
}

/// Edge list of a morph at progress `t`, ready for path assembly.
pub fn morph_edges(morph: &MorphShape, t: f32) -> Vec<Edge> {
    morph
        .segments
        .iter()
        .map(|seg| {
            let mut commands = Vec::with_capacity(seg.curves.len() + 1);
            commands.push(PathCommand::MoveTo(seg.start_a.lerp(&seg.start_b, t)));
            for curve in &seg.curves {
                let anchor = curve.anchor_a.lerp(&curve.anchor_b, t);
                if curve.is_line {
                    commands.push(PathCommand::LineTo(anchor));
                } else {
                    let control = curve.control_a.lerp(&curve.control_b, t);
                    commands.push(PathCommand::QuadTo(control, anchor));
                }
            }
            Edge {
                fill_left: seg.fill_left,
                fill_right: seg.fill_right,
                stroke: seg.stroke,
                commands,
            }
        })
        .collect()
}

/// The start shape with its outline replaced by the morph at `t`.
pub fn morph_shape(start: &ShapeElement, morph: &MorphShape, t: f32) -> ShapeElement {
    ShapeElement {
        matrix: start.matrix,
        fills: start.fills.clone(),
        strokes: start.strokes.clone(),
        edges: morph_edges(morph, t),
    }
}
