use kurbo::{Affine, Point};
use xfl_data::model::{self as data, Matrix};

/// Determinants smaller than this are treated as non-invertible.
pub const DEGENERATE_DETERMINANT: f64 = 1e-4;

pub fn to_affine(m: &Matrix) -> Affine {
    Affine::new(m.to_array())
}

pub fn from_affine(a: Affine) -> Matrix {
    Matrix::from_array(a.as_coeffs())
}

pub fn to_point(p: &data::Point) -> Point {
    Point::new(p.x, p.y)
}

/// Inverse of `a`, or `None` when it is degenerate or not finite.
pub fn invert_guarded(a: Affine) -> Option<Affine> {
    let det = a.determinant();
    if !det.is_finite() || det.abs() < DEGENERATE_DETERMINANT {
        return None;
    }
    let inv = a.inverse();
    if inv.as_coeffs().iter().all(|c| c.is_finite()) {
        Some(inv)
    } else {
        None
    }
}
