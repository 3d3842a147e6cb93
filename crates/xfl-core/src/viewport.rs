use kurbo::{Affine, Point};
use serde::{Deserialize, Serialize};

/// Placement of the stage inside the output surface: a uniform scale plus
/// centering offsets, leaving letterbox bars on the long side.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub output_width: f64,
    pub output_height: f64,
}

impl Viewport {
    /// Stage drawn at 1:1 on a surface of the same size.
    pub fn identity(width: f64, height: f64) -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            output_width: width,
            output_height: height,
        }
    }

    pub fn fit(stage_width: f64, stage_height: f64, container_width: f64, container_height: f64) -> Self {
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if !(usable(stage_width)
            && usable(stage_height)
            && usable(container_width)
            && usable(container_height))
        {
            return Self::identity(stage_width, stage_height);
        }
        let scale = (container_width / stage_width).min(container_height / stage_height);
        Self {
            scale,
            offset_x: (container_width - stage_width * scale) / 2.0,
            offset_y: (container_height - stage_height * scale) / 2.0,
            output_width: container_width,
            output_height: container_height,
        }
    }

    /// Stage space to output space.
    pub fn transform(&self) -> Affine {
        Affine::translate((self.offset_x, self.offset_y)) * Affine::scale(self.scale)
    }

    /// Output space back to stage space.
    pub fn to_stage(&self, p: Point) -> Point {
        Point::new(
            (p.x - self.offset_x) / self.scale,
            (p.y - self.offset_y) / self.scale,
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::identity(0.0, 0.0)
    }
}
