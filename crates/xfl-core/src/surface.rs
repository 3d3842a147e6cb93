//! Drawing-surface abstraction and the primitives the frame renderer emits.
//!
//! The renderer never talks to a graphics backend directly. It drives a
//! [`Surface`], which keeps an affine transform stack and draws assembled
//! paths against resolved paints. [`RecordingSurface`] keeps the calls as a
//! flat display list.

use crate::hit_test::ElementTag;
use glam::{Vec2, Vec4};
use kurbo::{Affine, BezPath, Point, Rect, Shape as _};

#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
    Solid(Vec4), // R, G, B, A in 0..1
    /// A color string the core could not parse; handed to the backend as is.
    Native { color: String, alpha: f32 },
    Gradient(Gradient),
    Bitmap(BitmapPaint),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Gradient {
    pub kind: GradientKind,
    pub stops: Vec<GradientStop>,
    /// Maps gradient unit space into local shape space.
    pub transform: Affine,
}

/// Half extent of the authoring gradient square.
pub const GRADIENT_HALF_EXTENT: f64 = 819.2;

impl Gradient {
    /// Start and end of a linear gradient in gradient unit space.
    pub fn linear_span() -> (Point, Point) {
        (
            Point::new(-GRADIENT_HALF_EXTENT, 0.0),
            Point::new(GRADIENT_HALF_EXTENT, 0.0),
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GradientKind {
    Linear,
    Radial,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Vec4,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BitmapPaint {
    pub name: String,
    pub transform: Affine,
    pub repeat: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Fill {
    pub paint: Paint,
    pub rule: FillRule,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stroke {
    pub paint: Paint,
    /// Zero draws a hairline.
    pub width: f32,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillRule {
    NonZero,
    EvenOdd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineCap {
    Butt,
    Round,
    Square,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineJoin {
    Miter,
    Round,
    Bevel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendMode {
    Normal,
    Multiply,
    Screen,
    Lighten,
    Darken,
    Difference,
    Plus,
    Subtract,
    Invert,
    /// Keep destination where the source is opaque.
    DstIn,
    /// Erase destination where the source is opaque.
    DstOut,
    Overlay,
    HardLight,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    Blur {
        sigma_x: f32,
        sigma_y: f32,
    },
    DropShadow {
        color: Vec4,
        offset: Vec2,
        blur: Vec2,
        /// Knock out the source and keep only the shadow (glow-style filters keep both).
        shadow_only: bool,
    },
    ColorMatrix {
        matrix: [f32; 20],
    },
}

/// Parameters for an isolated compositing layer.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerParams {
    pub blend: BlendMode,
    pub effects: Vec<Effect>,
    pub alpha: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImageDraw {
    pub name: String,
    pub width: f32,
    pub height: f32,
    pub alpha: f32,
}

impl ImageDraw {
    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width as f64, self.height as f64)
    }
}

/// A laid-out run of text. `origin` is the left end of the baseline.
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphRun {
    pub text: String,
    pub face: String,
    pub size: f32,
    pub paint: Paint,
    pub origin: Point,
    pub letter_spacing: f32,
    pub width: f32,
}

impl GlyphRun {
    /// Approximate ink box: one em above the baseline.
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.origin.x,
            self.origin.y - self.size as f64,
            self.origin.x + self.width as f64,
            self.origin.y + self.size as f64 * 0.25,
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Pixels {
    pub width: u32,
    pub height: u32,
    /// Unpremultiplied RGBA8, row major.
    pub rgba: Vec<u8>,
}

impl Pixels {
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        Some([
            self.rgba[i],
            self.rgba[i + 1],
            self.rgba[i + 2],
            self.rgba[i + 3],
        ])
    }
}

/// The drawing surface the frame renderer paints onto.
pub trait Surface {
    /// Fills the whole surface, ignoring transform and clip.
    fn clear(&mut self, color: Vec4);
    fn save(&mut self);
    fn restore(&mut self);
    fn concat(&mut self, transform: Affine);
    fn clip_path(&mut self, path: &BezPath);
    /// Starts an isolated layer. Balanced by [`Surface::pop_layer`].
    fn push_layer(&mut self, params: &LayerParams);
    fn pop_layer(&mut self);
    fn fill_path(&mut self, path: &BezPath, fill: &Fill);
    fn stroke_path(&mut self, path: &BezPath, stroke: &Stroke);
    /// Draws a named bitmap into `(0, 0, width, height)`.
    fn draw_image(&mut self, image: &ImageDraw);
    fn draw_text(&mut self, run: &GlyphRun);

    /// Returns the advance width of `text`.
    fn measure_text(&self, text: &str, _face: &str, size: f32) -> f32 {
        text.chars().count() as f32 * size * 0.6
    }

    fn read_pixels(&mut self) -> Option<Pixels> {
        None
    }

    fn begin_element(&mut self, _tag: &ElementTag) {}
    fn end_element(&mut self) {}
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Clear(Vec4),
    Save,
    Restore,
    Clip {
        transform: Affine,
        path: BezPath,
    },
    PushLayer(LayerParams),
    PopLayer,
    Fill {
        transform: Affine,
        path: BezPath,
        fill: Fill,
    },
    Stroke {
        transform: Affine,
        path: BezPath,
        stroke: Stroke,
    },
    Image {
        transform: Affine,
        image: ImageDraw,
    },
    Text {
        transform: Affine,
        run: GlyphRun,
    },
}

/// Records every call as a [`DrawCommand`] carrying the absolute transform.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    commands: Vec<DrawCommand>,
    current: Affine,
    stack: Vec<Affine>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<DrawCommand> {
        self.commands
    }

    /// Fill commands as `(transform, path, fill)`.
    pub fn fills(&self) -> impl Iterator<Item = (Affine, &BezPath, &Fill)> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Fill {
                transform,
                path,
                fill,
            } => Some((*transform, path, fill)),
            _ => None,
        })
    }

    /// Bounding boxes of every filled path, in surface space.
    pub fn fill_bounds(&self) -> Vec<Rect> {
        self.fills()
            .map(|(transform, path, _)| (transform * path.clone()).bounding_box())
            .collect()
    }

    /// Anything that puts pixels down.
    pub fn paint_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    DrawCommand::Fill { .. }
                        | DrawCommand::Stroke { .. }
                        | DrawCommand::Image { .. }
                        | DrawCommand::Text { .. }
                )
            })
            .count()
    }
}

impl Surface for RecordingSurface {
    fn clear(&mut self, color: Vec4) {
        self.commands.clear();
        self.stack.clear();
        self.current = Affine::IDENTITY;
        self.commands.push(DrawCommand::Clear(color));
    }

    fn save(&mut self) {
        self.stack.push(self.current);
        self.commands.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        if let Some(t) = self.stack.pop() {
            self.current = t;
        }
        self.commands.push(DrawCommand::Restore);
    }

    fn concat(&mut self, transform: Affine) {
        self.current = self.current * transform;
    }

    fn clip_path(&mut self, path: &BezPath) {
        self.commands.push(DrawCommand::Clip {
            transform: self.current,
            path: path.clone(),
        });
    }

    fn push_layer(&mut self, params: &LayerParams) {
        self.stack.push(self.current);
        self.commands.push(DrawCommand::PushLayer(params.clone()));
    }

    fn pop_layer(&mut self) {
        if let Some(t) = self.stack.pop() {
            self.current = t;
        }
        self.commands.push(DrawCommand::PopLayer);
    }

    fn fill_path(&mut self, path: &BezPath, fill: &Fill) {
        self.commands.push(DrawCommand::Fill {
            transform: self.current,
            path: path.clone(),
            fill: fill.clone(),
        });
    }

    fn stroke_path(&mut self, path: &BezPath, stroke: &Stroke) {
        self.commands.push(DrawCommand::Stroke {
            transform: self.current,
            path: path.clone(),
            stroke: stroke.clone(),
        });
    }

    fn draw_image(&mut self, image: &ImageDraw) {
        self.commands.push(DrawCommand::Image {
            transform: self.current,
            image: image.clone(),
        });
    }

    fn draw_text(&mut self, run: &GlyphRun) {
        self.commands.push(DrawCommand::Text {
            transform: self.current,
            run: run.clone(),
        });
    }
}
