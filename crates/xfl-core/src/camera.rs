//! Virtual camera: finding the camera layer and turning its transform into a
//! view matrix.

use crate::timeline::resolve_layer;
use crate::transform::{invert_guarded, to_affine};
use kurbo::{Affine, Point};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use xfl_data::model::{Element, LayerKind, Timeline};

/// Decides from a layer's name whether it drives the camera.
#[derive(Clone)]
pub struct CameraPredicate(Arc<dyn Fn(&str) -> bool + Send + Sync>);

impl CameraPredicate {
    pub fn new(f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn matches(&self, name: &str) -> bool {
        (self.0)(name)
    }
}

impl Default for CameraPredicate {
    fn default() -> Self {
        Self::new(is_camera_name)
    }
}

impl fmt::Debug for CameraPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CameraPredicate(..)")
    }
}

const CAMERA_WORDS: &[&str] = &["camera", "viewport", "kamera", "カメラ"];

/// Built-in heuristic: a case-insensitive substring match on a few words,
/// or "cam" as a whole token. Not exhaustive.
pub fn is_camera_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    if CAMERA_WORDS.iter().any(|w| lower.contains(w)) {
        return true;
    }
    lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|token| token == "cam")
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraLayer {
    pub index: usize,
    pub name: String,
    /// Set when the document names this layer explicitly.
    pub explicit: bool,
}

/// Every layer that could drive the camera, explicit index first.
pub fn camera_layers(timeline: &Timeline, predicate: &CameraPredicate) -> Vec<CameraLayer> {
    let mut found = Vec::new();
    if let Some(index) = timeline.camera_layer {
        if let Some(layer) = timeline.layers.get(index) {
            found.push(CameraLayer {
                index,
                name: layer.name.clone(),
                explicit: true,
            });
        }
    }
    for (index, layer) in timeline.layers.iter().enumerate() {
        if Some(index) == timeline.camera_layer || layer.kind == LayerKind::Folder {
            continue;
        }
        if predicate.matches(&layer.name) {
            found.push(CameraLayer {
                index,
                name: layer.name.clone(),
                explicit: false,
            });
        }
    }
    found
}

pub fn active_camera_layer(timeline: &Timeline, predicate: &CameraPredicate) -> Option<usize> {
    camera_layers(timeline, predicate).first().map(|c| c.index)
}

/// How the framed region maps onto the output for a given stage shape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewportFit {
    #[default]
    Standard,
    Wide,
    Ultrawide,
}

pub const WIDE_ASPECT: f32 = 16.0 / 9.0;
pub const ULTRAWIDE_ASPECT: f32 = 2.2;

impl ViewportFit {
    pub fn for_aspect(ratio: f32) -> Self {
        if !ratio.is_finite() {
            ViewportFit::Standard
        } else if ratio >= ULTRAWIDE_ASPECT {
            ViewportFit::Ultrawide
        } else if ratio >= WIDE_ASPECT - 1e-3 {
            ViewportFit::Wide
        } else {
            ViewportFit::Standard
        }
    }

    /// Adjusts the camera's zoom. Rotation and translation are kept.
    pub fn apply(self, camera: Affine) -> Affine {
        let [a, b, c, d, tx, ty] = camera.as_coeffs();
        let sx = a.hypot(b);
        let sy = c.hypot(d);
        if sx == 0.0 || sy == 0.0 || !sx.is_finite() || !sy.is_finite() {
            return camera;
        }
        let (zx, zy) = match self {
            ViewportFit::Standard => return camera,
            ViewportFit::Wide => (sy, sy),
            ViewportFit::Ultrawide => {
                let z = sx.min(sy);
                (z, z)
            }
        };
        Affine::new([
            a / sx * zx,
            b / sx * zx,
            c / sy * zy,
            d / sy * zy,
            tx,
            ty,
        ])
    }
}

/// The camera layer's transform at `playhead`: its first symbol instance,
/// or its first element when it holds no instance.
pub fn camera_matrix(timeline: &Timeline, layer: usize, playhead: u32) -> Option<Affine> {
    camera_pose(timeline, layer, playhead).map(|(m, _)| m)
}

/// Camera transform plus the pivot its zoom and rotation act around.
fn camera_pose(timeline: &Timeline, layer: usize, playhead: u32) -> Option<(Affine, Point)> {
    let resolved = resolve_layer(timeline.layers.get(layer)?, playhead)?;
    let element = resolved
        .elements
        .iter()
        .find(|e| matches!(e, Element::Symbol(_)))
        .or_else(|| resolved.elements.first())?;
    let pivot = match element {
        Element::Symbol(s) => s
            .transformation_point
            .filter(|p| p.is_finite())
            .map(|p| Point::new(p.x, p.y)),
        _ => None,
    };
    Some((to_affine(element.matrix()), pivot.unwrap_or(Point::ORIGIN)))
}

/// Rebuilds `camera` so its linear part scales and rotates around `pivot`
/// while its translation pans. The origin pivot leaves it unchanged.
pub fn anchor_at(camera: Affine, pivot: Point) -> Affine {
    let [a, b, c, d, tx, ty] = camera.as_coeffs();
    let linear = Affine::new([a, b, c, d, 0.0, 0.0]);
    let offset = pivot.to_vec2();
    Affine::translate((tx, ty)) * Affine::translate(offset) * linear * Affine::translate(-offset)
}

/// What the camera sees, as a transform applied ahead of every other layer.
/// `None` when there is no camera content or its matrix is degenerate.
pub fn view_transform(
    timeline: &Timeline,
    layer: usize,
    playhead: u32,
    fit: ViewportFit,
) -> Option<Affine> {
    let (camera, pivot) = camera_pose(timeline, layer, playhead)?;
    invert_guarded(anchor_at(fit.apply(camera), pivot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use xfl_data::model::{Frame, Layer, Matrix, ShapeElement, SymbolInstance};

    fn named(name: &str) -> Layer {
        Layer {
            name: name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_vocabulary() {
        for name in ["Camera", "main_CAMERA_rig", "Viewport", "Kamera 1", "カメラ", "cam", "Cam 2"] {
            assert!(is_camera_name(name), "{name}");
        }
        for name in ["Background", "Camel", "scam", "cameo"] {
            assert!(!is_camera_name(name), "{name}");
        }
    }

    #[test]
    fn test_camera_layers_explicit_first() {
        let timeline = Timeline {
            layers: vec![named("camera"), named("bg"), named("rig")],
            camera_layer: Some(2),
            ..Default::default()
        };
        let found = camera_layers(&timeline, &CameraPredicate::default());
        assert_eq!(
            found.iter().map(|c| c.index).collect::<Vec<_>>(),
            vec![2, 0]
        );
        assert!(found[0].explicit);
        assert_eq!(active_camera_layer(&timeline, &CameraPredicate::default()), Some(2));

        let custom = CameraPredicate::new(|name| name == "bg");
        let timeline = Timeline {
            camera_layer: None,
            ..timeline
        };
        assert_eq!(active_camera_layer(&timeline, &custom), Some(1));
    }

    #[test]
    fn test_fit_thresholds() {
        assert_eq!(ViewportFit::for_aspect(4.0 / 3.0), ViewportFit::Standard);
        assert_eq!(ViewportFit::for_aspect(1920.0 / 1080.0), ViewportFit::Wide);
        assert_eq!(ViewportFit::for_aspect(2.39), ViewportFit::Ultrawide);
    }

    #[test]
    fn test_fit_keeps_identity() {
        for fit in [ViewportFit::Standard, ViewportFit::Wide, ViewportFit::Ultrawide] {
            assert_eq!(fit.apply(Affine::IDENTITY), Affine::IDENTITY);
        }
        let stretched = Affine::new([2.0, 0.0, 0.0, 4.0, 5.0, 6.0]);
        assert_eq!(
            ViewportFit::Wide.apply(stretched),
            Affine::new([4.0, 0.0, 0.0, 4.0, 5.0, 6.0])
        );
        assert_eq!(
            ViewportFit::Ultrawide.apply(stretched),
            Affine::new([2.0, 0.0, 0.0, 2.0, 5.0, 6.0])
        );
    }

    #[test]
    fn test_view_transform_inverts_camera() {
        let timeline = Timeline {
            layers: vec![Layer {
                name: "camera".into(),
                frames: vec![Frame {
                    index: 0,
                    duration: 1,
                    elements: vec![Element::Shape(ShapeElement {
                        matrix: Matrix::scale(2.0, 2.0),
                        ..Default::default()
                    })],
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        };
        let view = view_transform(&timeline, 0, 0, ViewportFit::Standard).unwrap();
        assert_eq!(view * Point::new(100.0, 40.0), Point::new(50.0, 20.0));
    }

    fn camera_instance(pivot: Option<(f64, f64)>) -> Timeline {
        Timeline {
            layers: vec![Layer {
                name: "camera".into(),
                frames: vec![Frame {
                    index: 0,
                    duration: 1,
                    elements: vec![Element::Symbol(SymbolInstance {
                        symbol: "rig".into(),
                        matrix: Matrix::scale(2.0, 2.0),
                        transformation_point: pivot
                            .map(|(x, y)| xfl_data::model::Point::new(x, y)),
                        ..Default::default()
                    })],
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_zoom_is_anchored_at_pivot() {
        let plain = view_transform(&camera_instance(None), 0, 0, ViewportFit::Standard).unwrap();
        assert_eq!(plain * Point::new(100.0, 40.0), Point::new(50.0, 20.0));

        let pivoted =
            view_transform(&camera_instance(Some((200.0, 200.0))), 0, 0, ViewportFit::Standard)
                .unwrap();
        let p = pivoted * Point::new(200.0, 200.0);
        assert!((p.x - 200.0).abs() < 1e-9 && (p.y - 200.0).abs() < 1e-9);
        let q = pivoted * Point::new(100.0, 40.0);
        assert!((q.x - 150.0).abs() < 1e-9 && (q.y - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_anchor_keeps_pan() {
        let pan = Affine::translate((30.0, -10.0));
        assert_eq!(anchor_at(pan, Point::new(200.0, 200.0)), pan);
        let camera = Affine::new([2.0, 0.0, 0.0, 2.0, 5.0, 6.0]);
        assert_eq!(anchor_at(camera, Point::ORIGIN), camera);
    }
}
