//! Skia raster backend: implements the core [`Surface`] trait on top of a
//! Skia canvas, so frames from [`xfl_core::Player`] end up as pixels.

pub mod assets;
mod convert;
pub mod error;

pub use assets::{decode_source, BitmapStore, SkiaFonts};
pub use error::SkiaError;

use convert::{
    affine_to_matrix, build_filter, color4f, convert_blend_mode, convert_cap, convert_fill_rule,
    convert_join, kurbo_to_skia_path, sanitize, setup_paint_shader,
};
use glam::Vec4;
use kurbo::{Affine, BezPath};
use skia_safe::{
    canvas::{SaveLayerRec, SrcRectConstraint},
    surfaces, AlphaType, ClipOp, Color, ColorType, EncodedImageFormat, Font, FontMgr, FontStyle,
    ImageInfo, Paint, PaintStyle, Rect, Typeface,
};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use tracing::warn;
use xfl_core::surface::{Fill, GlyphRun, ImageDraw, LayerParams, Pixels, Stroke, Surface};
use xfl_core::FALLBACK_FACE;

pub struct SkiaSurface {
    surface: skia_safe::Surface,
    width: i32,
    height: i32,
    bitmaps: BitmapStore,
    typefaces: RefCell<HashMap<String, Option<Typeface>>>,
    missing_images: HashSet<String>,
}

impl SkiaSurface {
    pub fn new(width: i32, height: i32) -> Result<Self, SkiaError> {
        let info = ImageInfo::new((width, height), ColorType::RGBA8888, AlphaType::Premul, None);
        let surface = surfaces::raster(&info, None, None)
            .ok_or(SkiaError::SurfaceCreation { width, height })?;
        Ok(Self {
            surface,
            width,
            height,
            bitmaps: BitmapStore::new(),
            typefaces: RefCell::new(HashMap::new()),
            missing_images: HashSet::new(),
        })
    }

    pub fn with_bitmaps(mut self, bitmaps: BitmapStore) -> Self {
        self.set_bitmaps(bitmaps);
        self
    }

    /// Replaces the decoded bitmaps, typically after a new document loads.
    pub fn set_bitmaps(&mut self, bitmaps: BitmapStore) {
        self.bitmaps = bitmaps;
        self.missing_images.clear();
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn canvas(&mut self) -> &skia_safe::Canvas {
        self.surface.canvas()
    }

    pub fn encode_png(&mut self) -> Result<Vec<u8>, SkiaError> {
        let image = self.surface.image_snapshot();
        let data = image
            .encode(None, EncodedImageFormat::PNG, 100)
            .ok_or(SkiaError::Encode)?;
        Ok(data.as_bytes().to_vec())
    }

    fn typeface(&self, face: &str) -> Option<Typeface> {
        let mut cache = self.typefaces.borrow_mut();
        cache
            .entry(face.to_string())
            .or_insert_with(|| {
                let font_mgr = FontMgr::new();
                font_mgr
                    .match_family_style(face, FontStyle::normal())
                    .or_else(|| font_mgr.match_family_style(FALLBACK_FACE, FontStyle::normal()))
                    .or_else(|| font_mgr.match_family_style("", FontStyle::normal()))
            })
            .clone()
    }

    fn font(&self, face: &str, size: f32) -> Option<Font> {
        self.typeface(face)
            .map(|typeface| Font::new(typeface, Some(sanitize(size))))
    }
}

fn base_paint(style: PaintStyle) -> Paint {
    let mut paint = Paint::default();
    paint.set_anti_alias(true);
    paint.set_style(style);
    paint
}

impl Surface for SkiaSurface {
    fn clear(&mut self, color: Vec4) {
        let canvas = self.surface.canvas();
        canvas.restore_to_count(1);
        canvas.reset_matrix();
        canvas.clear(color4f(color));
    }

    fn save(&mut self) {
        self.surface.canvas().save();
    }

    fn restore(&mut self) {
        self.surface.canvas().restore();
    }

    fn concat(&mut self, transform: Affine) {
        self.surface.canvas().concat(&affine_to_matrix(transform));
    }

    fn clip_path(&mut self, path: &BezPath) {
        let path = kurbo_to_skia_path(path);
        self.surface
            .canvas()
            .clip_path(&path, ClipOp::Intersect, true);
    }

    fn push_layer(&mut self, params: &LayerParams) {
        let mut paint = Paint::default();
        paint.set_alpha_f(sanitize(params.alpha).clamp(0.0, 1.0));
        paint.set_blend_mode(convert_blend_mode(params.blend));
        if let Some(filter) = build_filter(&params.effects) {
            paint.set_image_filter(filter);
        }
        self.surface
            .canvas()
            .save_layer(&SaveLayerRec::default().paint(&paint));
    }

    fn pop_layer(&mut self) {
        self.surface.canvas().restore();
    }

    fn fill_path(&mut self, path: &BezPath, fill: &Fill) {
        let mut path = kurbo_to_skia_path(path);
        path.set_fill_type(convert_fill_rule(fill.rule));
        let mut paint = base_paint(PaintStyle::Fill);
        if setup_paint_shader(&mut paint, &fill.paint, &self.bitmaps) {
            self.surface.canvas().draw_path(&path, &paint);
        }
    }

    fn stroke_path(&mut self, path: &BezPath, stroke: &Stroke) {
        let path = kurbo_to_skia_path(path);
        let mut paint = base_paint(PaintStyle::Stroke);
        // Width 0 is Skia's hairline.
        paint.set_stroke_width(sanitize(stroke.width).max(0.0));
        paint.set_stroke_cap(convert_cap(stroke.cap));
        paint.set_stroke_join(convert_join(stroke.join));
        paint.set_stroke_miter(sanitize(stroke.miter_limit));
        if setup_paint_shader(&mut paint, &stroke.paint, &self.bitmaps) {
            self.surface.canvas().draw_path(&path, &paint);
        }
    }

    fn draw_image(&mut self, image: &ImageDraw) {
        let dst = Rect::from_wh(sanitize(image.width), sanitize(image.height));
        let canvas = self.surface.canvas();
        match self.bitmaps.get(&image.name) {
            Some(img) => {
                let mut paint = Paint::default();
                paint.set_alpha_f(sanitize(image.alpha).clamp(0.0, 1.0));
                let src = Rect::from_wh(img.width() as f32, img.height() as f32);
                canvas.draw_image_rect(img, Some((&src, SrcRectConstraint::Strict)), dst, &paint);
            }
            None => {
                if self.missing_images.insert(image.name.clone()) {
                    warn!(bitmap = %image.name, "bitmap not decoded, drawing placeholder");
                }
                let mut paint = Paint::default();
                paint.set_color(Color::MAGENTA);
                paint.set_style(PaintStyle::Fill);
                canvas.draw_rect(dst, &paint);
            }
        }
    }

    fn draw_text(&mut self, run: &GlyphRun) {
        let Some(font) = self.font(&run.face, run.size) else {
            return;
        };
        let mut paint = base_paint(PaintStyle::Fill);
        if !setup_paint_shader(&mut paint, &run.paint, &self.bitmaps) {
            return;
        }
        let x = run.origin.x as f32;
        let y = run.origin.y as f32;
        let canvas = self.surface.canvas();
        if run.letter_spacing == 0.0 {
            canvas.draw_str(&run.text, (x, y), &font, &paint);
            return;
        }
        let mut pen = x;
        let mut buf = [0u8; 4];
        for ch in run.text.chars() {
            let glyph = ch.encode_utf8(&mut buf);
            canvas.draw_str(&*glyph, (pen, y), &font, &paint);
            pen += font.measure_str(&*glyph, None).0 + run.letter_spacing;
        }
    }

    fn measure_text(&self, text: &str, face: &str, size: f32) -> f32 {
        match self.font(face, size) {
            Some(font) => font.measure_str(text, None).0,
            None => text.chars().count() as f32 * size * 0.6,
        }
    }

    fn read_pixels(&mut self) -> Option<Pixels> {
        let (width, height) = (self.width, self.height);
        let info = ImageInfo::new((width, height), ColorType::RGBA8888, AlphaType::Unpremul, None);
        let row_bytes = width as usize * 4;
        let mut rgba = vec![0u8; row_bytes * height as usize];
        if !self.surface.read_pixels(&info, &mut rgba, row_bytes, (0, 0)) {
            return None;
        }
        Some(Pixels {
            width: width as u32,
            height: height as u32,
            rgba,
        })
    }
}
