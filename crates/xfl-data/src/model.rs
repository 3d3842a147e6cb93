use serde::{de::SeqAccess, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Document {
    pub width: f32,
    pub height: f32,
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f32,
    #[serde(default = "default_background")]
    pub background_color: String,
    pub timelines: Vec<Timeline>,
    #[serde(default)]
    pub symbols: HashMap<String, Symbol>,
    #[serde(default)]
    pub bitmaps: HashMap<String, Bitmap>,
    #[serde(default)]
    pub sounds: HashMap<String, Sound>,
}

fn default_frame_rate() -> f32 {
    24.0
}

fn default_background() -> String {
    "#FFFFFF".to_string()
}

impl Document {
    /// The main timeline, if the document has any.
    pub fn main_timeline(&self) -> Option<&Timeline> {
        self.timelines.first()
    }

    pub fn symbol(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Timeline {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub total_frames: u32,
    /// Guide-only layers that never contribute visual output.
    #[serde(default)]
    pub reference_layers: BTreeSet<usize>,
    #[serde(default)]
    pub camera_layer: Option<usize>,
}

impl Timeline {
    /// Declared frame count, or the end of the longest layer when the
    /// declaration is missing.
    pub fn frame_count(&self) -> u32 {
        if self.total_frames > 0 {
            return self.total_frames;
        }
        self.layers
            .iter()
            .filter_map(|l| l.frames.last())
            .map(Frame::end)
            .max()
            .unwrap_or(1)
            .max(1)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Layer {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub kind: LayerKind,
    /// For masked layers: index of the mask layer in the same timeline.
    #[serde(default)]
    pub mask_layer: Option<usize>,
    /// Index of the enclosing folder layer, if any.
    #[serde(default)]
    pub parent_layer: Option<usize>,
    #[serde(default)]
    pub frames: Vec<Frame>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    #[default]
    Normal,
    Guide,
    Folder,
    Mask,
    Masked,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Frame {
    pub index: u32,
    #[serde(default = "default_duration")]
    pub duration: u32,
    #[serde(default)]
    pub tween: TweenKind,
    #[serde(default)]
    pub easing: Option<Easing>,
    #[serde(default)]
    pub morph: Option<MorphShape>,
    #[serde(default)]
    pub elements: Vec<Element>,
}

fn default_duration() -> u32 {
    1
}

impl Frame {
    /// One past the last playhead value covered by this frame.
    pub fn end(&self) -> u32 {
        self.index.saturating_add(self.duration.max(1))
    }

    pub fn contains(&self, playhead: u32) -> bool {
        playhead >= self.index && playhead < self.end()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TweenKind {
    #[default]
    None,
    Motion,
    Shape,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    /// Classic acceleration in [-100, 100]. Positive eases out, negative eases in.
    Acceleration(f32),
    /// Custom cubic-bezier easing curve: start point, two control points, end point.
    Bezier([Point; 4]),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    Shape(ShapeElement),
    Symbol(SymbolInstance),
    Bitmap(BitmapInstance),
    Video(VideoInstance),
    Text(TextElement),
}

impl Element {
    pub fn matrix(&self) -> &Matrix {
        match self {
            Element::Shape(s) => &s.matrix,
            Element::Symbol(s) => &s.matrix,
            Element::Bitmap(b) => &b.matrix,
            Element::Video(v) => &v.matrix,
            Element::Text(t) => &t.matrix,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Element::Shape(_) => "shape",
            Element::Symbol(_) => "symbol",
            Element::Bitmap(_) => "bitmap",
            Element::Video(_) => "video",
            Element::Text(_) => "text",
        }
    }
}

/// Affine transform: `x' = a*x + c*y + tx`, `y' = b*x + d*y + ty`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Matrix {
    #[serde(default = "one")]
    pub a: f64,
    #[serde(default)]
    pub b: f64,
    #[serde(default)]
    pub c: f64,
    #[serde(default = "one")]
    pub d: f64,
    #[serde(default)]
    pub tx: f64,
    #[serde(default)]
    pub ty: f64,
}

fn one() -> f64 {
    1.0
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    pub fn translate(tx: f64, ty: f64) -> Self {
        Matrix {
            tx,
            ty,
            ..Matrix::IDENTITY
        }
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Matrix {
            a: sx,
            d: sy,
            ..Matrix::IDENTITY
        }
    }

    pub fn to_array(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.tx, self.ty]
    }

    pub fn from_array(m: [f64; 6]) -> Self {
        Matrix {
            a: m[0],
            b: m[1],
            c: m[2],
            d: m[3],
            tx: m[4],
            ty: m[5],
        }
    }
}

/// Per-channel color transform. Multipliers are unit scalars, offsets are in
/// 0..255 channel units.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct ColorTransform {
    #[serde(default = "one_f32")]
    pub red_multiplier: f32,
    #[serde(default = "one_f32")]
    pub green_multiplier: f32,
    #[serde(default = "one_f32")]
    pub blue_multiplier: f32,
    #[serde(default = "one_f32")]
    pub alpha_multiplier: f32,
    #[serde(default)]
    pub red_offset: f32,
    #[serde(default)]
    pub green_offset: f32,
    #[serde(default)]
    pub blue_offset: f32,
    #[serde(default)]
    pub alpha_offset: f32,
}

fn one_f32() -> f32 {
    1.0
}

impl Default for ColorTransform {
    fn default() -> Self {
        ColorTransform::IDENTITY
    }
}

impl ColorTransform {
    pub const IDENTITY: ColorTransform = ColorTransform {
        red_multiplier: 1.0,
        green_multiplier: 1.0,
        blue_multiplier: 1.0,
        alpha_multiplier: 1.0,
        red_offset: 0.0,
        green_offset: 0.0,
        blue_offset: 0.0,
        alpha_offset: 0.0,
    };

    pub fn alpha(alpha_multiplier: f32) -> Self {
        ColorTransform {
            alpha_multiplier,
            ..ColorTransform::IDENTITY
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == ColorTransform::IDENTITY
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoopMode {
    #[default]
    Loop,
    PlayOnce,
    SingleFrame,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    #[default]
    Normal,
    Layer,
    Multiply,
    Screen,
    Lighten,
    Darken,
    Difference,
    Add,
    Subtract,
    Invert,
    Alpha,
    Erase,
    Overlay,
    HardLight,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Filter {
    Blur {
        #[serde(default = "default_blur")]
        blur_x: f32,
        #[serde(default = "default_blur")]
        blur_y: f32,
    },
    DropShadow {
        #[serde(default = "default_black")]
        color: String,
        #[serde(default = "one_f32")]
        alpha: f32,
        #[serde(default = "default_blur")]
        blur_x: f32,
        #[serde(default = "default_blur")]
        blur_y: f32,
        #[serde(default = "default_distance")]
        distance: f32,
        /// Degrees.
        #[serde(default = "default_angle")]
        angle: f32,
        #[serde(default = "one_f32")]
        strength: f32,
    },
    Glow {
        #[serde(default = "default_glow")]
        color: String,
        #[serde(default = "one_f32")]
        alpha: f32,
        #[serde(default = "default_blur")]
        blur_x: f32,
        #[serde(default = "default_blur")]
        blur_y: f32,
        #[serde(default = "one_f32")]
        strength: f32,
    },
    AdjustColor {
        #[serde(default)]
        brightness: f32,
        #[serde(default)]
        contrast: f32,
        #[serde(default)]
        saturation: f32,
        #[serde(default)]
        hue: f32,
    },
}

fn default_blur() -> f32 {
    5.0
}

fn default_distance() -> f32 {
    5.0
}

fn default_angle() -> f32 {
    45.0
}

fn default_black() -> String {
    "#000000".to_string()
}

fn default_glow() -> String {
    "#FF0000".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SymbolInstance {
    /// Name of the referenced symbol in the document's symbol table.
    pub symbol: String,
    #[serde(default)]
    pub matrix: Matrix,
    #[serde(default)]
    pub first_frame: u32,
    #[serde(default)]
    pub loop_mode: LoopMode,
    #[serde(default)]
    pub color_transform: Option<ColorTransform>,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub blend_mode: Option<BlendMode>,
    /// Pivot in the instance's local coordinates.
    #[serde(default)]
    pub transformation_point: Option<Point>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ShapeElement {
    #[serde(default)]
    pub matrix: Matrix,
    #[serde(default)]
    pub fills: Vec<FillStyle>,
    #[serde(default)]
    pub strokes: Vec<StrokeStyle>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BitmapInstance {
    pub bitmap: String,
    #[serde(default)]
    pub matrix: Matrix,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VideoInstance {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub matrix: Matrix,
    #[serde(default = "default_video_width")]
    pub width: f32,
    #[serde(default = "default_video_height")]
    pub height: f32,
}

fn default_video_width() -> f32 {
    320.0
}

fn default_video_height() -> f32 {
    240.0
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct TextElement {
    #[serde(default)]
    pub matrix: Matrix,
    #[serde(default)]
    pub runs: Vec<TextRun>,
    #[serde(default)]
    pub bounds: LayoutBox,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TextRun {
    pub characters: String,
    #[serde(default = "default_face")]
    pub face: String,
    #[serde(default = "default_text_size")]
    pub size: f32,
    #[serde(default = "default_black")]
    pub color: String,
    #[serde(default = "one_f32")]
    pub alpha: f32,
    #[serde(default)]
    pub alignment: TextAlignment,
    #[serde(default)]
    pub letter_spacing: f32,
    #[serde(default)]
    pub line_spacing: f32,
}

fn default_face() -> String {
    "sans-serif".to_string()
}

fn default_text_size() -> f32 {
    12.0
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TextAlignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct LayoutBox {
    #[serde(default)]
    pub left: f32,
    #[serde(default)]
    pub top: f32,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
}

/// A fragment of shape outline. Style indices are zero-based into the owning
/// shape's `fills` / `strokes`.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Edge {
    #[serde(default)]
    pub fill_left: Option<usize>,
    #[serde(default)]
    pub fill_right: Option<usize>,
    #[serde(default)]
    pub stroke: Option<usize>,
    #[serde(default)]
    pub commands: Vec<PathCommand>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(tag = "op", content = "pts", rename_all = "snake_case")]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    QuadTo(Point, Point),
    CubicTo(Point, Point, Point),
    Close,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FillStyle {
    Solid {
        color: String,
        #[serde(default = "one_f32")]
        alpha: f32,
    },
    LinearGradient(Gradient),
    RadialGradient(Gradient),
    Bitmap {
        bitmap: String,
        #[serde(default)]
        matrix: Option<Matrix>,
        /// Clipped bitmap fills do not repeat outside the image bounds.
        #[serde(default)]
        clipped: bool,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Gradient {
    #[serde(default)]
    pub stops: Vec<GradientStop>,
    #[serde(default)]
    pub matrix: Option<Matrix>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GradientStop {
    /// 0..1 position along the gradient.
    pub ratio: f32,
    pub color: String,
    #[serde(default = "one_f32")]
    pub alpha: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StrokeStyle {
    pub fill: FillStyle,
    #[serde(default = "one_f32")]
    pub weight: f32,
    #[serde(default)]
    pub caps: CapStyle,
    #[serde(default)]
    pub joints: JointStyle,
    #[serde(default = "default_miter")]
    pub miter_limit: f32,
}

fn default_miter() -> f32 {
    3.0
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CapStyle {
    None,
    #[default]
    Round,
    Square,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum JointStyle {
    Miter,
    #[default]
    Round,
    Bevel,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Symbol {
    pub name: String,
    #[serde(default)]
    pub kind: SymbolKind,
    pub timeline: Timeline,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    #[default]
    Graphic,
    MovieClip,
    Button,
}

/// Vertex correspondence for a shape tween, established at authoring time.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct MorphShape {
    #[serde(default)]
    pub segments: Vec<MorphSegment>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct MorphSegment {
    pub start_a: Point,
    pub start_b: Point,
    #[serde(default)]
    pub fill_left: Option<usize>,
    #[serde(default)]
    pub fill_right: Option<usize>,
    #[serde(default)]
    pub stroke: Option<usize>,
    #[serde(default)]
    pub curves: Vec<MorphCurve>,
}

/// One quadratic piece of a morph segment, given for both shapes.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct MorphCurve {
    pub control_a: Point,
    pub anchor_a: Point,
    pub control_b: Point,
    pub anchor_b: Point,
    #[serde(default)]
    pub is_line: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Bitmap {
    #[serde(default)]
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Encoded image bytes as a `data:` URI or bare base64.
    #[serde(default)]
    pub source: Option<String>,
}

/// Decoded linear PCM, interleaved.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Sound {
    #[serde(default)]
    pub name: String,
    pub sample_rate: u32,
    pub channels: u16,
    #[serde(default)]
    pub samples: Vec<f32>,
}

impl Sound {
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / (self.sample_rate as f32 * self.channels as f32)
    }
}

/// 2D point in geometry units. Serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point { x, y }
    }
}

impl Serialize for Point {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        [self.x, self.y].serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Point {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PointVisitor;
        impl<'de> serde::de::Visitor<'de> for PointVisitor {
            type Value = Point;
            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a sequence of 2 numbers")
            }
            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                // JSON has no NaN literal, so null stands in for a non-finite coordinate.
                let x: Option<f64> = seq.next_element()?.flatten();
                let y: Option<f64> = seq.next_element()?.flatten();
                while seq.next_element::<serde::de::IgnoredAny>()?.is_some() {}
                Ok(Point {
                    x: x.unwrap_or(f64::NAN),
                    y: y.unwrap_or(f64::NAN),
                })
            }
        }
        deserializer.deserialize_seq(PointVisitor)
    }
}
