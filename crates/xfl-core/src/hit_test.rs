//! Debug hit testing. [`HitTestSurface`] receives the same calls as a real
//! surface and remembers the last element painted under a query point, which
//! is the topmost one.

use crate::surface::{
    Fill, FillRule, GlyphRun, ImageDraw, LayerParams, Stroke, Surface,
};
use crate::transform::invert_guarded;
use glam::Vec4;
use kurbo::{Affine, BezPath, PathEl, Point, Shape as _};
use serde::{Deserialize, Serialize};

/// Identifies an element by the (layer, element) indices at every nesting
/// level from the main timeline down.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementTag {
    pub path: Vec<(usize, usize)>,
    pub kind: String,
    /// Name of the symbol when the element is an instance.
    pub symbol: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HitResult {
    pub element: ElementTag,
    /// The query point in the element's local coordinates.
    pub local_point: (f64, f64),
}

/// Extra reach around strokes, in local units, so hairlines stay clickable.
const STROKE_SLOP: f64 = 1.0;

#[derive(Clone, Copy, Debug)]
struct State {
    transform: Affine,
    inside_clip: bool,
}

#[derive(Debug)]
pub struct HitTestSurface {
    point: Point,
    state: State,
    stack: Vec<State>,
    open: Vec<ElementTag>,
    hit: Option<HitResult>,
}

impl HitTestSurface {
    /// `point` is in surface coordinates.
    pub fn new(point: Point) -> Self {
        Self {
            point,
            state: State {
                transform: Affine::IDENTITY,
                inside_clip: true,
            },
            stack: Vec::new(),
            open: Vec::new(),
            hit: None,
        }
    }

    pub fn into_hit(self) -> Option<HitResult> {
        self.hit
    }

    fn local_point(&self) -> Option<Point> {
        invert_guarded(self.state.transform).map(|inv| inv * self.point)
    }

    fn record(&mut self, hit: bool, local: Point) {
        if !hit || !self.state.inside_clip {
            return;
        }
        if let Some(tag) = self.open.last() {
            self.hit = Some(HitResult {
                element: tag.clone(),
                local_point: (local.x, local.y),
            });
        }
    }

    fn test(&mut self, f: impl FnOnce(Point) -> bool) {
        if let Some(local) = self.local_point() {
            let hit = f(local);
            self.record(hit, local);
        }
    }
}

/// Copy of `path` with every open subpath closed, the way fills are painted.
fn closed_subpaths(path: &BezPath) -> BezPath {
    let mut out = BezPath::new();
    let mut open = false;
    for el in path.elements() {
        match el {
            PathEl::MoveTo(_) => {
                if open {
                    out.close_path();
                }
                open = true;
            }
            PathEl::ClosePath => open = false,
            _ => {}
        }
        out.push(*el);
    }
    if open {
        out.close_path();
    }
    out
}

fn distance_to_path(path: &BezPath, p: Point) -> f64 {
    let mut best = f64::INFINITY;
    let mut start = Point::ZERO;
    let mut last = Point::ZERO;
    kurbo::flatten(path.iter(), 0.25, |el| match el {
        PathEl::MoveTo(q) => {
            start = q;
            last = q;
        }
        PathEl::LineTo(q) => {
            best = best.min(segment_distance(last, q, p));
            last = q;
        }
        PathEl::ClosePath => {
            best = best.min(segment_distance(last, start, p));
            last = start;
        }
        _ => {}
    });
    best
}

fn segment_distance(a: Point, b: Point, p: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.hypot2();
    if len_sq == 0.0 {
        return (p - a).hypot();
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).hypot()
}

impl Surface for HitTestSurface {
    fn clear(&mut self, _color: Vec4) {
        self.hit = None;
        self.stack.clear();
        self.open.clear();
        self.state = State {
            transform: Affine::IDENTITY,
            inside_clip: true,
        };
    }

    fn save(&mut self) {
        self.stack.push(self.state);
    }

    fn restore(&mut self) {
        if let Some(s) = self.stack.pop() {
            self.state = s;
        }
    }

    fn concat(&mut self, transform: Affine) {
        self.state.transform = self.state.transform * transform;
    }

    fn clip_path(&mut self, path: &BezPath) {
        let path = closed_subpaths(path);
        let inside = self
            .local_point()
            .is_some_and(|p| path.winding(p) != 0);
        self.state.inside_clip &= inside;
    }

    fn push_layer(&mut self, _params: &LayerParams) {
        self.save();
    }

    fn pop_layer(&mut self) {
        self.restore();
    }

    fn fill_path(&mut self, path: &BezPath, fill: &Fill) {
        let rule = fill.rule;
        let path = closed_subpaths(path);
        self.test(|p| {
            let winding = path.winding(p);
            match rule {
                FillRule::NonZero => winding != 0,
                FillRule::EvenOdd => winding % 2 != 0,
            }
        });
    }

    fn stroke_path(&mut self, path: &BezPath, stroke: &Stroke) {
        let reach = stroke.width as f64 / 2.0 + STROKE_SLOP;
        self.test(|p| distance_to_path(path, p) <= reach);
    }

    fn draw_image(&mut self, image: &ImageDraw) {
        let rect = image.rect();
        self.test(|p| rect.contains(p));
    }

    fn draw_text(&mut self, run: &GlyphRun) {
        let bounds = run.bounds();
        self.test(|p| bounds.contains(p));
    }

    fn begin_element(&mut self, tag: &ElementTag) {
        self.open.push(tag.clone());
    }

    fn end_element(&mut self) {
        self.open.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{LineCap, LineJoin, Paint};
    use kurbo::Rect;

    fn tag(element: usize) -> ElementTag {
        ElementTag {
            path: vec![(0, element)],
            kind: "shape".into(),
            symbol: None,
        }
    }

    fn square(x0: f64, y0: f64, size: f64) -> BezPath {
        Rect::new(x0, y0, x0 + size, y0 + size).to_path(0.1)
    }

    fn fill() -> Fill {
        Fill {
            paint: Paint::Solid(Vec4::ONE),
            rule: FillRule::EvenOdd,
        }
    }

    #[test]
    fn test_topmost_wins() {
        let mut surface = HitTestSurface::new(Point::new(15.0, 15.0));
        surface.begin_element(&tag(0));
        surface.fill_path(&square(0.0, 0.0, 20.0), &fill());
        surface.end_element();
        surface.begin_element(&tag(1));
        surface.fill_path(&square(10.0, 10.0, 20.0), &fill());
        surface.end_element();
        surface.begin_element(&tag(2));
        surface.fill_path(&square(50.0, 50.0, 20.0), &fill());
        surface.end_element();
        assert_eq!(surface.into_hit().unwrap().element, tag(1));
    }

    #[test]
    fn test_open_fill_counts_as_closed() {
        let mut open = BezPath::new();
        open.move_to((0.0, 0.0));
        open.line_to((40.0, 0.0));
        open.line_to((40.0, 40.0));
        open.line_to((0.0, 40.0));
        let mut surface = HitTestSurface::new(Point::new(5.0, 20.0));
        surface.begin_element(&tag(0));
        surface.fill_path(&open, &fill());
        surface.end_element();
        assert_eq!(surface.into_hit().unwrap().element, tag(0));
    }

    #[test]
    fn test_transform_and_clip() {
        let mut surface = HitTestSurface::new(Point::new(105.0, 5.0));
        surface.save();
        surface.concat(Affine::translate((100.0, 0.0)));
        surface.begin_element(&tag(0));
        surface.fill_path(&square(0.0, 0.0, 10.0), &fill());
        surface.end_element();
        surface.restore();
        let hit = surface.into_hit().unwrap();
        assert_eq!(hit.local_point, (5.0, 5.0));

        let mut clipped = HitTestSurface::new(Point::new(5.0, 5.0));
        clipped.save();
        clipped.clip_path(&square(50.0, 50.0, 10.0));
        clipped.begin_element(&tag(0));
        clipped.fill_path(&square(0.0, 0.0, 10.0), &fill());
        clipped.end_element();
        clipped.restore();
        assert!(clipped.into_hit().is_none());
    }

    #[test]
    fn test_stroke_reach() {
        let mut line = BezPath::new();
        line.move_to((0.0, 0.0));
        line.line_to((100.0, 0.0));
        let stroke = Stroke {
            paint: Paint::Solid(Vec4::ONE),
            width: 4.0,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            miter_limit: 4.0,
        };
        let mut near = HitTestSurface::new(Point::new(50.0, 2.5));
        near.begin_element(&tag(0));
        near.stroke_path(&line, &stroke);
        assert!(near.into_hit().is_some());

        let mut far = HitTestSurface::new(Point::new(50.0, 8.0));
        far.begin_element(&tag(0));
        far.stroke_path(&line, &stroke);
        assert!(far.into_hit().is_none());
    }
}
