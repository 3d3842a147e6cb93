//! Frame rendering: walks the main timeline and every nested symbol timeline
//! at its own local frame, emitting draw calls onto a [`Surface`].

use crate::camera::{active_camera_layer, view_transform, CameraPredicate, ViewportFit};
use crate::color::{color_transform_matrix, concat_color_transforms, parse_color};
use crate::diagnostics::{WarnKey, WarnOnce};
use crate::effects::{convert_blend_mode, convert_filters, needs_layer};
use crate::hit_test::{ElementTag, HitResult, HitTestSurface};
use crate::paint::PaintResolver;
use crate::path::{AssembledShape, AssemblerConfig, PathAssembler};
use crate::surface::{
    BlendMode, Effect, Fill, FillRule, ImageDraw, LayerParams, LineCap, LineJoin, Paint, Stroke,
    Surface,
};
use crate::text::layout_text;
use crate::timeline::{
    clamp_playhead, layer_plan, local_frame, resolve_layer, DrawOrder, LayerEntry,
};
use crate::transform::to_affine;
use crate::viewport::Viewport;
use glam::Vec4;
use kurbo::{Affine, BezPath, Point, Rect, Shape as _};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, trace};
use xfl_data::model::{
    BitmapInstance, ColorTransform, Document, Element, ShapeElement, Symbol, SymbolInstance,
    SymbolKind, Timeline, VideoInstance,
};

/// Deepest chain of nested symbol instances that still renders.
pub const MAX_SYMBOL_DEPTH: usize = 32;

const SHAPE_CACHE_LIMIT: usize = 4096;

/// Caller-owned toggles, read as one snapshot per frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    /// Top-level layer indices that are switched off.
    pub hidden_layers: BTreeSet<usize>,
    pub layer_order: DrawOrder,
    pub nested_layer_order: DrawOrder,
    pub element_order: DrawOrder,
    pub follow_camera: bool,
    pub debug: bool,
}

/// Everything one frame reads and nothing it writes.
#[derive(Clone, Copy, Debug)]
pub struct Scene<'a> {
    pub document: &'a Document,
    pub settings: &'a RenderSettings,
    pub viewport: &'a Viewport,
    pub camera: &'a CameraPredicate,
    /// Font faces that are not ready and draw with the fallback face.
    pub missing_faces: &'a HashSet<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum TimelineId {
    Main,
    Symbol(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ShapeKey {
    timeline: TimelineId,
    layer: usize,
    frame: usize,
    element: usize,
    /// Bits of the eased morph progress, so each tween step caches apart.
    morph: Option<u32>,
}

/// State carried down one branch of the walk.
#[derive(Debug, Default)]
struct Branch<'a> {
    depth: usize,
    symbols: Vec<&'a str>,
    path: Vec<(usize, usize)>,
    color: Option<ColorTransform>,
}

#[derive(Debug, Default)]
pub struct FrameRenderer {
    assembler: PathAssembler,
    shapes: HashMap<ShapeKey, Arc<AssembledShape>>,
    warnings: WarnOnce,
}

impl FrameRenderer {
    pub fn new(config: AssemblerConfig) -> Self {
        Self {
            assembler: PathAssembler::new(config),
            ..Default::default()
        }
    }

    pub fn assembler_config(&self) -> AssemblerConfig {
        self.assembler.config()
    }

    /// Changing tolerances invalidates every cached path.
    pub fn set_assembler_config(&mut self, config: AssemblerConfig) {
        self.assembler = PathAssembler::new(config);
        self.shapes.clear();
    }

    /// Drops caches and warning history; called when the document changes.
    pub fn reset(&mut self) {
        self.shapes.clear();
        self.warnings.clear();
    }

    pub fn cached_shapes(&self) -> usize {
        self.shapes.len()
    }

    pub fn warnings(&self) -> &WarnOnce {
        &self.warnings
    }

    pub fn render(&mut self, scene: &Scene<'_>, surface: &mut dyn Surface, frame: i64) {
        let doc = scene.document;
        let Some(main) = doc.main_timeline() else {
            return;
        };

        let background = parse_color(&doc.background_color).unwrap_or(Vec4::ONE);
        surface.clear(background);
        surface.save();
        surface.concat(scene.viewport.transform());
        surface.clip_path(&stage_rect(doc).to_path(0.1));

        let playhead = clamp_playhead(frame, main.frame_count());
        let mut skip = None;
        if scene.settings.follow_camera {
            if let Some(camera) = active_camera_layer(main, scene.camera) {
                skip = Some(camera);
                let fit = ViewportFit::for_aspect(doc.aspect_ratio());
                match view_transform(main, camera, playhead, fit) {
                    Some(view) => surface.concat(view),
                    None => debug!(
                        layer = camera,
                        frame = playhead,
                        "camera matrix missing or degenerate, rendering unshifted"
                    ),
                }
            }
        }

        let mut branch = Branch::default();
        self.render_timeline(
            scene,
            surface,
            &TimelineId::Main,
            main,
            playhead,
            &mut branch,
            skip,
        );
        surface.restore();
    }

    /// Replays `frame` against a point and reports the topmost element
    /// painted under it. `point` is in output coordinates.
    pub fn hit_test(&mut self, scene: &Scene<'_>, frame: i64, point: Point) -> Option<HitResult> {
        let mut surface = HitTestSurface::new(point);
        self.render(scene, &mut surface, frame);
        surface.into_hit()
    }

    #[allow(clippy::too_many_arguments)]
    fn render_timeline<'a>(
        &mut self,
        scene: &Scene<'a>,
        surface: &mut dyn Surface,
        id: &TimelineId,
        timeline: &'a Timeline,
        playhead: u32,
        branch: &mut Branch<'a>,
        skip: Option<usize>,
    ) {
        let top = branch.depth == 0;
        let (order, hidden) = if top {
            (
                scene.settings.layer_order,
                Some(&scene.settings.hidden_layers),
            )
        } else {
            (scene.settings.nested_layer_order, None)
        };

        for entry in layer_plan(timeline, order, hidden, skip) {
            match entry {
                LayerEntry::Single(layer) => {
                    self.render_layer(scene, surface, id, timeline, layer, playhead, branch)
                }
                LayerEntry::Masked { mask, content } => {
                    let mut clip = BezPath::new();
                    let mut symbols = branch.symbols.clone();
                    self.mask_outline(
                        scene,
                        id,
                        timeline,
                        mask,
                        playhead,
                        Affine::IDENTITY,
                        &mut symbols,
                        &mut clip,
                    );
                    surface.save();
                    surface.clip_path(&clip);
                    for layer in content {
                        self.render_layer(scene, surface, id, timeline, layer, playhead, branch);
                    }
                    surface.restore();
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn render_layer<'a>(
        &mut self,
        scene: &Scene<'a>,
        surface: &mut dyn Surface,
        id: &TimelineId,
        timeline: &'a Timeline,
        layer: usize,
        playhead: u32,
        branch: &mut Branch<'a>,
    ) {
        let Some(resolved) = timeline
            .layers
            .get(layer)
            .and_then(|l| resolve_layer(l, playhead))
        else {
            return;
        };

        let count = resolved.elements.len();
        let order: Vec<usize> = match scene.settings.element_order {
            DrawOrder::Forward => (0..count).collect(),
            DrawOrder::Reverse => (0..count).rev().collect(),
        };
        for index in order {
            let key = ShapeKey {
                timeline: id.clone(),
                layer,
                frame: resolved.frame_index,
                element: index,
                morph: resolved.morph_progress.map(f32::to_bits),
            };
            branch.path.push((layer, index));
            self.render_element(
                scene,
                surface,
                &resolved.elements[index],
                key,
                playhead,
                branch,
            );
            branch.path.pop();
        }
    }

    fn render_element<'a>(
        &mut self,
        scene: &Scene<'a>,
        surface: &mut dyn Surface,
        element: &Element,
        key: ShapeKey,
        playhead: u32,
        branch: &mut Branch<'a>,
    ) {
        let transform = to_affine(element.matrix());
        if !transform.as_coeffs().iter().all(|c| c.is_finite()) {
            trace!(kind = element.kind_name(), "non-finite element matrix, skipped");
            return;
        }

        let tag = ElementTag {
            path: branch.path.clone(),
            kind: element.kind_name().to_string(),
            symbol: match element {
                Element::Symbol(inst) => Some(inst.symbol.clone()),
                _ => None,
            },
        };
        surface.begin_element(&tag);
        surface.save();
        surface.concat(transform);

        match element {
            Element::Shape(shape) => {
                let assembled = self.assembled(key, shape);
                self.draw_shape(scene, surface, shape, &assembled, branch.color.as_ref());
            }
            Element::Symbol(inst) => self.render_symbol(scene, surface, inst, playhead, branch),
            Element::Bitmap(bitmap) => {
                self.draw_bitmap(scene, surface, bitmap, branch.color.as_ref())
            }
            Element::Video(video) => draw_video_marker(surface, video),
            Element::Text(text) => {
                let runs = layout_text(
                    text,
                    &*surface,
                    scene.missing_faces,
                    branch.color.as_ref(),
                    &mut self.warnings,
                );
                for run in &runs {
                    surface.draw_text(run);
                }
            }
        }

        surface.restore();
        surface.end_element();
    }

    fn render_symbol<'a>(
        &mut self,
        scene: &Scene<'a>,
        surface: &mut dyn Surface,
        inst: &SymbolInstance,
        playhead: u32,
        branch: &mut Branch<'a>,
    ) {
        let Some((name, symbol)) = scene.document.symbols.get_key_value(&inst.symbol) else {
            self.warnings.warn(WarnKey::MissingSymbol(inst.symbol.clone()));
            return;
        };
        if branch.depth >= MAX_SYMBOL_DEPTH || branch.symbols.contains(&name.as_str()) {
            self.warnings.warn(WarnKey::SymbolRecursion(name.clone()));
            return;
        }

        let local = symbol_frame(inst, symbol, playhead);

        let effects = convert_filters(&inst.filters);
        let isolate = needs_layer(inst.blend_mode, &effects);
        if isolate {
            surface.push_layer(&LayerParams {
                blend: inst
                    .blend_mode
                    .map(convert_blend_mode)
                    .unwrap_or(BlendMode::Normal),
                effects,
                alpha: 1.0,
            });
        }

        let saved_color = branch.color;
        if let Some(ct) = &inst.color_transform {
            branch.color = Some(match saved_color {
                Some(outer) => concat_color_transforms(&outer, ct),
                None => *ct,
            });
        }
        branch.depth += 1;
        branch.symbols.push(name.as_str());

        self.render_timeline(
            scene,
            surface,
            &TimelineId::Symbol(name.clone()),
            &symbol.timeline,
            local,
            branch,
            None,
        );

        branch.symbols.pop();
        branch.depth -= 1;
        branch.color = saved_color;
        if isolate {
            surface.pop_layer();
        }
    }

    fn assembled(&mut self, key: ShapeKey, shape: &ShapeElement) -> Arc<AssembledShape> {
        if let Some(cached) = self.shapes.get(&key) {
            return Arc::clone(cached);
        }
        if self.shapes.len() >= SHAPE_CACHE_LIMIT {
            debug!(entries = self.shapes.len(), "shape cache full, clearing");
            self.shapes.clear();
        }
        let assembled = Arc::new(self.assembler.assemble(&shape.edges));
        self.shapes.insert(key, Arc::clone(&assembled));
        assembled
    }

    fn draw_shape(
        &mut self,
        scene: &Scene<'_>,
        surface: &mut dyn Surface,
        shape: &ShapeElement,
        assembled: &AssembledShape,
        ct: Option<&ColorTransform>,
    ) {
        let resolver = PaintResolver::new(&scene.document.bitmaps);
        // Fills sit beneath strokes.
        for (index, path) in assembled.fills() {
            let Some(style) = shape.fills.get(index) else {
                continue;
            };
            if let Some(paint) = resolver.resolve_fill(style, ct, &mut self.warnings) {
                surface.fill_path(
                    &path.to_path(),
                    &Fill {
                        paint,
                        rule: FillRule::EvenOdd,
                    },
                );
            }
        }
        for (index, path) in assembled.strokes() {
            let Some(style) = shape.strokes.get(index) else {
                continue;
            };
            if let Some(stroke) = resolver.resolve_stroke(style, ct, &mut self.warnings) {
                surface.stroke_path(&path.to_path(), &stroke);
            }
        }
    }

    fn draw_bitmap(
        &mut self,
        scene: &Scene<'_>,
        surface: &mut dyn Surface,
        instance: &BitmapInstance,
        ct: Option<&ColorTransform>,
    ) {
        let Some(bitmap) = scene.document.bitmaps.get(&instance.bitmap) else {
            self.warnings
                .warn(WarnKey::MissingBitmap(instance.bitmap.clone()));
            return;
        };
        let mut image = ImageDraw {
            name: instance.bitmap.clone(),
            width: bitmap.width as f32,
            height: bitmap.height as f32,
            alpha: 1.0,
        };
        match ct.filter(|ct| !ct.is_identity()) {
            None => surface.draw_image(&image),
            Some(ct) if alpha_only(ct) => {
                image.alpha = ct.alpha_multiplier.clamp(0.0, 1.0);
                surface.draw_image(&image);
            }
            Some(ct) => {
                surface.push_layer(&LayerParams {
                    blend: BlendMode::Normal,
                    effects: vec![Effect::ColorMatrix {
                        matrix: color_transform_matrix(ct),
                    }],
                    alpha: 1.0,
                });
                surface.draw_image(&image);
                surface.pop_layer();
            }
        }
    }

    /// Silhouette of a mask layer's content at `playhead`, in the coordinate
    /// space of `timeline`.
    #[allow(clippy::too_many_arguments)]
    fn mask_outline<'a>(
        &mut self,
        scene: &Scene<'a>,
        id: &TimelineId,
        timeline: &'a Timeline,
        layer: usize,
        playhead: u32,
        transform: Affine,
        symbols: &mut Vec<&'a str>,
        out: &mut BezPath,
    ) {
        let Some(resolved) = timeline
            .layers
            .get(layer)
            .and_then(|l| resolve_layer(l, playhead))
        else {
            return;
        };

        for (index, element) in resolved.elements.iter().enumerate() {
            let m = transform * to_affine(element.matrix());
            match element {
                Element::Shape(shape) => {
                    let key = ShapeKey {
                        timeline: id.clone(),
                        layer,
                        frame: resolved.frame_index,
                        element: index,
                        morph: resolved.morph_progress.map(f32::to_bits),
                    };
                    let assembled = self.assembled(key, shape);
                    extend(out, m * assembled.fill_outline());
                }
                Element::Symbol(inst) => {
                    let Some((name, symbol)) = scene.document.symbols.get_key_value(&inst.symbol)
                    else {
                        continue;
                    };
                    if symbols.len() >= MAX_SYMBOL_DEPTH || symbols.contains(&name.as_str()) {
                        continue;
                    }
                    let local = symbol_frame(inst, symbol, playhead);
                    let child = TimelineId::Symbol(name.clone());
                    symbols.push(name.as_str());
                    for entry in layer_plan(&symbol.timeline, DrawOrder::Forward, None, None) {
                        let layers = match entry {
                            LayerEntry::Single(l) => vec![l],
                            LayerEntry::Masked { content, .. } => content,
                        };
                        for l in layers {
                            self.mask_outline(
                                scene,
                                &child,
                                &symbol.timeline,
                                l,
                                local,
                                m,
                                symbols,
                                out,
                            );
                        }
                    }
                    symbols.pop();
                }
                Element::Bitmap(b) => {
                    if let Some(bitmap) = scene.document.bitmaps.get(&b.bitmap) {
                        let rect = Rect::new(0.0, 0.0, bitmap.width as f64, bitmap.height as f64);
                        extend(out, m * rect.to_path(0.1));
                    }
                }
                Element::Video(v) => {
                    let rect = Rect::new(0.0, 0.0, v.width as f64, v.height as f64);
                    extend(out, m * rect.to_path(0.1));
                }
                Element::Text(t) => {
                    let b = t.bounds;
                    if b.width > 0.0 && b.height > 0.0 {
                        let rect = Rect::new(
                            b.left as f64,
                            b.top as f64,
                            (b.left + b.width) as f64,
                            (b.top + b.height) as f64,
                        );
                        extend(out, m * rect.to_path(0.1));
                    }
                }
            }
        }
    }
}

fn extend(out: &mut BezPath, path: BezPath) {
    out.extend(path.elements().iter().copied());
}

fn stage_rect(doc: &Document) -> Rect {
    Rect::new(0.0, 0.0, doc.width as f64, doc.height as f64)
}

fn alpha_only(ct: &ColorTransform) -> bool {
    ct.red_multiplier == 1.0
        && ct.green_multiplier == 1.0
        && ct.blue_multiplier == 1.0
        && ct.red_offset == 0.0
        && ct.green_offset == 0.0
        && ct.blue_offset == 0.0
        && ct.alpha_offset == 0.0
}

/// Video is never decoded; its frame is shown as a fixed placeholder box.
fn draw_video_marker(surface: &mut dyn Surface, video: &VideoInstance) {
    let rect = Rect::new(0.0, 0.0, video.width as f64, video.height as f64).to_path(0.1);
    surface.fill_path(
        &rect,
        &Fill {
            paint: Paint::Solid(Vec4::new(0.2, 0.2, 0.2, 1.0)),
            rule: FillRule::NonZero,
        },
    );
    surface.stroke_path(
        &rect,
        &Stroke {
            paint: Paint::Solid(Vec4::new(0.8, 0.8, 0.8, 1.0)),
            width: 1.0,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            miter_limit: 4.0,
        },
    );
}

/// Frame a symbol instance shows while its parent sits at `playhead`.
fn symbol_frame(inst: &SymbolInstance, symbol: &Symbol, playhead: u32) -> u32 {
    match symbol.kind {
        // Buttons rest on their "up" state.
        SymbolKind::Button => 0,
        SymbolKind::Graphic | SymbolKind::MovieClip => {
            local_frame(inst, playhead, symbol.timeline.frame_count())
        }
    }
}
