//! The public player: owns the current document, the caller's transient
//! settings and the render caches.

use crate::camera::{camera_layers, CameraLayer, CameraPredicate};
use crate::error::{DocumentError, PlayerError};
use crate::hit_test::HitResult;
use crate::path::AssemblerConfig;
use crate::render::{FrameRenderer, RenderSettings, Scene};
use crate::surface::Surface;
use crate::text::{missing_faces, AllFontsReady, FontProvider};
use crate::timeline::DrawOrder;
use crate::validate::validate_document;
use crate::viewport::Viewport;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use kurbo::Point;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use xfl_data::model::{Document, Element, TextRun};

/// Identifies one `set_document` request. Only the newest ticket commits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(u64);

/// A validated document with its font readiness worked out, waiting to be
/// committed.
#[derive(Debug)]
pub struct PreparedDocument {
    ticket: LoadTicket,
    document: Arc<Document>,
    missing_faces: HashSet<String>,
}

impl PreparedDocument {
    pub fn ticket(&self) -> LoadTicket {
        self.ticket
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

type LoadResult = (LoadTicket, Result<PreparedDocument, DocumentError>);

pub struct Player {
    document: Option<Arc<Document>>,
    missing_faces: HashSet<String>,
    renderer: FrameRenderer,
    settings: RenderSettings,
    container: Option<(f64, f64)>,
    viewport: Viewport,
    camera: CameraPredicate,
    fonts: Arc<dyn FontProvider>,
    latest: LoadTicket,
    loads: (Sender<LoadResult>, Receiver<LoadResult>),
    last_frame: i64,
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Player {
    pub fn new() -> Self {
        Self {
            document: None,
            missing_faces: HashSet::new(),
            renderer: FrameRenderer::default(),
            settings: RenderSettings::default(),
            container: None,
            viewport: Viewport::default(),
            camera: CameraPredicate::default(),
            fonts: Arc::new(AllFontsReady),
            latest: LoadTicket(0),
            loads: unbounded(),
            last_frame: 0,
        }
    }

    pub fn with_fonts(mut self, fonts: Arc<dyn FontProvider>) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn set_font_provider(&mut self, fonts: Arc<dyn FontProvider>) {
        self.fonts = fonts;
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_deref()
    }

    /// Frame count of the main timeline, 0 without a document.
    pub fn frame_count(&self) -> u32 {
        self.document
            .as_deref()
            .and_then(Document::main_timeline)
            .map(|t| t.frame_count())
            .unwrap_or(0)
    }

    // ---- Loading -----------------------------------------------------

    /// Starts a new load generation, superseding every earlier one.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.latest = LoadTicket(self.latest.0 + 1);
        self.latest
    }

    /// Validation and font preparation. Touches no player state, so it can
    /// run on any thread.
    pub fn prepare(
        ticket: LoadTicket,
        document: Document,
        fonts: &dyn FontProvider,
    ) -> Result<PreparedDocument, DocumentError> {
        validate_document(&document)?;
        let missing = missing_faces(text_runs(&document), fonts);
        for face in &missing {
            warn!(face = %face, "font not ready, text falls back to sans-serif");
        }
        Ok(PreparedDocument {
            ticket,
            document: Arc::new(document),
            missing_faces: missing,
        })
    }

    /// Installs `prepared` unless a newer load has started since its ticket
    /// was issued. Returns whether it was installed.
    pub fn commit(&mut self, prepared: PreparedDocument) -> bool {
        if prepared.ticket != self.latest {
            debug!(
                ticket = prepared.ticket.0,
                latest = self.latest.0,
                "stale document load discarded"
            );
            return false;
        }
        let doc = &prepared.document;
        info!(
            width = doc.width,
            height = doc.height,
            timelines = doc.timelines.len(),
            symbols = doc.symbols.len(),
            "document installed"
        );
        self.renderer.reset();
        self.missing_faces = prepared.missing_faces;
        self.document = Some(prepared.document);
        self.last_frame = 0;
        self.refresh_viewport();
        true
    }

    /// Validates and installs `document`. On error the previous document
    /// stays in place.
    #[instrument(level = "debug", skip(self, document))]
    pub fn set_document(&mut self, document: Document) -> Result<(), PlayerError> {
        let ticket = self.begin_load();
        let prepared = Self::prepare(ticket, document, self.fonts.as_ref())?;
        self.commit(prepared);
        Ok(())
    }

    /// Prepares `document` on a background thread. Pick up the result with
    /// [`Player::poll_document`] or [`Player::wait_for_document`].
    pub fn set_document_async(&mut self, document: Document) -> LoadTicket {
        let ticket = self.begin_load();
        let tx = self.loads.0.clone();
        let fonts = Arc::clone(&self.fonts);
        std::thread::spawn(move || {
            let result = Player::prepare(ticket, document, fonts.as_ref());
            // The player may be gone already.
            let _ = tx.send((ticket, result));
        });
        ticket
    }

    /// Commits the newest finished load, if any. Stale completions are
    /// dropped without effect.
    pub fn poll_document(&mut self) -> Option<Result<bool, PlayerError>> {
        let mut outcome = None;
        while let Ok(load) = self.loads.1.try_recv() {
            if let Some(result) = self.accept(load) {
                outcome = Some(result);
            }
        }
        outcome
    }

    /// Blocks until the newest load finishes or `timeout` passes.
    pub fn wait_for_document(&mut self, timeout: Duration) -> Option<Result<bool, PlayerError>> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.loads.1.recv_timeout(remaining) {
                Ok(load) => {
                    if let Some(result) = self.accept(load) {
                        return Some(result);
                    }
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return None
                }
            }
        }
    }

    fn accept(&mut self, (ticket, result): LoadResult) -> Option<Result<bool, PlayerError>> {
        if ticket != self.latest {
            debug!(ticket = ticket.0, latest = self.latest.0, "stale document load discarded");
            return None;
        }
        Some(match result {
            Ok(prepared) => Ok(self.commit(prepared)),
            Err(err) => Err(err.into()),
        })
    }

    // ---- Rendering ---------------------------------------------------

    /// Draws one frame. Out-of-range frames clamp to the nearest end.
    #[instrument(level = "debug", skip(self, surface))]
    pub fn render_frame(&mut self, surface: &mut dyn Surface, frame: i64) -> Result<(), PlayerError> {
        let document = self.document.clone().ok_or(PlayerError::NoDocument)?;
        let settings = self.settings.clone();
        let scene = Scene {
            document: &document,
            settings: &settings,
            viewport: &self.viewport,
            camera: &self.camera,
            missing_faces: &self.missing_faces,
        };
        self.renderer.render(&scene, surface, frame);
        self.last_frame = frame;
        Ok(())
    }

    /// Topmost element under `point` (output coordinates) in the last
    /// rendered frame. Always `None` outside debug mode.
    pub fn hit_test(&mut self, point: Point) -> Result<Option<HitResult>, PlayerError> {
        let document = self.document.clone().ok_or(PlayerError::NoDocument)?;
        if !self.settings.debug {
            return Ok(None);
        }
        let settings = self.settings.clone();
        let scene = Scene {
            document: &document,
            settings: &settings,
            viewport: &self.viewport,
            camera: &self.camera,
            missing_faces: &self.missing_faces,
        };
        Ok(self.renderer.hit_test(&scene, self.last_frame, point))
    }

    // ---- Settings ----------------------------------------------------

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn set_hidden_layers(&mut self, layers: impl IntoIterator<Item = usize>) {
        self.settings.hidden_layers = layers.into_iter().collect();
    }

    pub fn set_layer_order(&mut self, order: DrawOrder) {
        self.settings.layer_order = order;
    }

    pub fn set_nested_layer_order(&mut self, order: DrawOrder) {
        self.settings.nested_layer_order = order;
    }

    pub fn set_element_order(&mut self, order: DrawOrder) {
        self.settings.element_order = order;
    }

    pub fn set_follow_camera(&mut self, follow: bool) {
        self.settings.follow_camera = follow;
    }

    pub fn follow_camera(&self) -> bool {
        self.settings.follow_camera
    }

    pub fn enable_debug_mode(&mut self) {
        self.settings.debug = true;
    }

    pub fn disable_debug_mode(&mut self) {
        self.settings.debug = false;
    }

    pub fn debug_mode(&self) -> bool {
        self.settings.debug
    }

    /// Camera candidates on the main timeline.
    pub fn camera_layers(&self) -> Vec<CameraLayer> {
        self.document
            .as_deref()
            .and_then(Document::main_timeline)
            .map(|t| camera_layers(t, &self.camera))
            .unwrap_or_default()
    }

    pub fn set_camera_predicate(&mut self, predicate: CameraPredicate) {
        self.camera = predicate;
    }

    pub fn set_assembler_config(&mut self, config: AssemblerConfig) {
        self.renderer.set_assembler_config(config);
    }

    pub fn assembler_config(&self) -> AssemblerConfig {
        self.renderer.assembler_config()
    }

    /// Recomputes output scale and letterboxing for a container of the given
    /// size.
    pub fn update_canvas_size(&mut self, width: f64, height: f64) {
        self.container = Some((width, height));
        self.refresh_viewport();
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn refresh_viewport(&mut self) {
        let Some(doc) = self.document.as_deref() else {
            return;
        };
        let (w, h) = (doc.width as f64, doc.height as f64);
        self.viewport = match self.container {
            Some((cw, ch)) => Viewport::fit(w, h, cw, ch),
            None => Viewport::identity(w, h),
        };
    }
}

fn text_runs(doc: &Document) -> impl Iterator<Item = &TextRun> {
    doc.timelines
        .iter()
        .chain(doc.symbols.values().map(|s| &s.timeline))
        .flat_map(|t| &t.layers)
        .flat_map(|l| &l.frames)
        .flat_map(|f| &f.elements)
        .filter_map(|e| match e {
            Element::Text(text) => Some(&text.runs),
            _ => None,
        })
        .flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RecordingSurface;
    use xfl_data::model::Timeline;

    fn doc(width: f32) -> Document {
        Document {
            width,
            height: 100.0,
            frame_rate: 24.0,
            background_color: "#FFFFFF".into(),
            timelines: vec![Timeline {
                total_frames: 3,
                ..Default::default()
            }],
            symbols: Default::default(),
            bitmaps: Default::default(),
            sounds: Default::default(),
        }
    }

    #[test]
    fn test_render_before_document_fails() {
        let mut player = Player::new();
        let mut surface = RecordingSurface::new();
        assert!(matches!(
            player.render_frame(&mut surface, 0),
            Err(PlayerError::NoDocument)
        ));
    }

    #[test]
    fn test_invalid_document_keeps_previous() {
        let mut player = Player::new();
        player.set_document(doc(200.0)).unwrap();
        let err = player.set_document(doc(-1.0)).unwrap_err();
        assert!(matches!(err, PlayerError::InvalidDocument(_)));
        assert_eq!(player.document().unwrap().width, 200.0);
    }

    #[test]
    fn test_stale_commit_discarded() {
        let mut player = Player::new();
        let old = player.begin_load();
        let new = player.begin_load();
        let stale = Player::prepare(old, doc(10.0), &AllFontsReady).unwrap();
        let fresh = Player::prepare(new, doc(20.0), &AllFontsReady).unwrap();
        assert!(player.commit(fresh));
        assert!(!player.commit(stale));
        assert_eq!(player.document().unwrap().width, 20.0);
    }

    #[test]
    fn test_canvas_size_letterboxes() {
        let mut player = Player::new();
        player.update_canvas_size(400.0, 100.0);
        player.set_document(doc(200.0)).unwrap();
        let vp = player.viewport();
        assert_eq!(vp.scale, 1.0);
        assert_eq!(vp.offset_x, 100.0);
    }

    #[test]
    fn test_hit_test_requires_debug_mode() {
        let mut player = Player::new();
        player.set_document(doc(100.0)).unwrap();
        assert_eq!(player.hit_test(Point::new(1.0, 1.0)).unwrap(), None);
    }
}
