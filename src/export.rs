use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use xfl_core::{DrawOrder, Player};
use xfl_data::model::Document;
use xfl_skia::{BitmapStore, SkiaFonts, SkiaSurface};

/// What to render and how.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Output size in pixels. Defaults to the stage size.
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub start: i64,
    /// Last frame, inclusive. Defaults to the final frame.
    pub end: Option<i64>,
    pub follow_camera: bool,
    pub hidden_layers: Vec<usize>,
    pub reverse_layers: bool,
}

pub fn load_document(path: &Path) -> Result<Document> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read document {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse document {}", path.display()))
}

/// Renders `options.start..=end` to `frame_00000.png`-style files in `out_dir`
/// and returns the written paths.
pub fn render_png_sequence(
    document: Document,
    options: &ExportOptions,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let width = options.width.unwrap_or(document.width.ceil() as i32);
    let height = options.height.unwrap_or(document.height.ceil() as i32);
    if width <= 0 || height <= 0 {
        bail!("Output size {}x{} is not usable", width, height);
    }

    let bitmaps = BitmapStore::from_document(&document);
    let mut surface = SkiaSurface::new(width, height)?.with_bitmaps(bitmaps);

    let mut player = Player::new().with_fonts(std::sync::Arc::new(SkiaFonts::from_system()));
    player.set_document(document)?;
    player.update_canvas_size(width as f64, height as f64);
    player.set_follow_camera(options.follow_camera);
    player.set_hidden_layers(options.hidden_layers.iter().copied());
    if options.reverse_layers {
        player.set_layer_order(DrawOrder::Reverse);
    }

    let last = player.frame_count() as i64 - 1;
    let end = options.end.unwrap_or(last).min(last);
    if end < options.start {
        bail!("Frame range {}..={} is empty", options.start, end);
    }

    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;
    info!(
        start = options.start,
        end,
        width,
        height,
        out = %out_dir.display(),
        "rendering frames"
    );

    let mut written = Vec::new();
    for frame in options.start..=end {
        player.render_frame(&mut surface, frame)?;
        let png = surface.encode_png()?;
        let path = out_dir.join(format!("frame_{:05}.png", frame));
        fs::write(&path, png).with_context(|| format!("Failed to write {}", path.display()))?;
        debug!(frame, path = %path.display(), "frame written");
        written.push(path);
    }
    Ok(written)
}
