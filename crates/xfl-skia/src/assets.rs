//! Decoded bitmaps and font availability for the Skia backend.

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use skia_safe::{Data, FontMgr, Image as SkImage};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};
use xfl_core::FontProvider;
use xfl_data::model::Document;

use crate::error::SkiaError;

/// Extracts the encoded bytes of a bitmap source: either a `data:` URI with a
/// base64 payload or bare base64.
pub fn decode_source(source: &str) -> Result<Vec<u8>, SkiaError> {
    let source = source.trim();
    let payload = match source.strip_prefix("data:") {
        Some(rest) => {
            let Some((header, data)) = rest.split_once(',') else {
                return Err(SkiaError::InvalidSource(truncate(source)));
            };
            if !header.ends_with(";base64") {
                return Err(SkiaError::InvalidSource(truncate(source)));
            }
            data
        }
        None => source,
    };
    Ok(BASE64_STANDARD.decode(payload)?)
}

fn truncate(s: &str) -> String {
    s.chars().take(32).collect()
}

/// Bitmaps of one document, decoded once up front.
#[derive(Default)]
pub struct BitmapStore {
    images: HashMap<String, SkImage>,
}

impl BitmapStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes every bitmap that carries a source. Failures are logged and the
    /// bitmap is left out.
    pub fn from_document(doc: &Document) -> Self {
        let mut store = Self::new();
        for (name, bitmap) in &doc.bitmaps {
            let Some(source) = &bitmap.source else {
                debug!(bitmap = %name, "bitmap has no embedded source");
                continue;
            };
            let image = decode_source(source).and_then(|bytes| {
                SkImage::from_encoded(Data::new_copy(&bytes))
                    .ok_or_else(|| SkiaError::InvalidSource(name.clone()))
            });
            match image {
                Ok(image) => store.insert(name.clone(), image),
                Err(err) => warn!(bitmap = %name, error = %err, "bitmap could not be decoded"),
            }
        }
        store
    }

    pub fn insert(&mut self, name: impl Into<String>, image: SkImage) {
        self.images.insert(name.into(), image);
    }

    pub fn get(&self, name: &str) -> Option<&SkImage> {
        self.images.get(name)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Generic families every Skia font manager resolves to something.
const GENERIC_FAMILIES: [&str; 3] = ["sans-serif", "serif", "monospace"];

/// Font readiness backed by the families the system font manager knows, plus
/// any registered by the host.
#[derive(Debug, Clone, Default)]
pub struct SkiaFonts {
    families: HashSet<String>,
}

impl SkiaFonts {
    pub fn from_system() -> Self {
        let families = FontMgr::new()
            .family_names()
            .map(|name| name.to_lowercase())
            .collect();
        Self { families }
    }

    /// Marks `family` as loaded, e.g. after registering it with Skia.
    pub fn register(&mut self, family: &str) {
        self.families.insert(family.to_lowercase());
    }
}

impl FontProvider for SkiaFonts {
    fn is_ready(&self, face: &str) -> bool {
        let face = face.to_lowercase();
        GENERIC_FAMILIES.contains(&face.as_str()) || self.families.contains(&face)
    }
}
