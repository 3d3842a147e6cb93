//! Structural checks run before a document is accepted by the player.

use crate::error::DocumentError;
use xfl_data::model::{Document, LayerKind, Timeline};

pub fn validate_document(doc: &Document) -> Result<(), DocumentError> {
    if doc.timelines.is_empty() {
        return Err(DocumentError::NoTimelines);
    }
    if !(doc.width.is_finite() && doc.height.is_finite()) || doc.width <= 0.0 || doc.height <= 0.0
    {
        return Err(DocumentError::InvalidStageSize {
            width: doc.width,
            height: doc.height,
        });
    }
    if !doc.frame_rate.is_finite() || doc.frame_rate <= 0.0 {
        return Err(DocumentError::InvalidFrameRate(doc.frame_rate));
    }
    for timeline in &doc.timelines {
        validate_timeline(timeline)?;
    }
    for (name, symbol) in &doc.symbols {
        if name.is_empty() {
            return Err(DocumentError::EmptySymbolName);
        }
        validate_timeline(&symbol.timeline)?;
    }
    Ok(())
}

pub fn validate_timeline(timeline: &Timeline) -> Result<(), DocumentError> {
    let layer_count = timeline.layers.len();

    if let Some(index) = timeline.camera_layer {
        if index >= layer_count {
            return Err(DocumentError::CameraOutOfRange {
                timeline: timeline.name.clone(),
                index,
            });
        }
    }
    if let Some(&index) = timeline.reference_layers.iter().find(|&&i| i >= layer_count) {
        return Err(DocumentError::ReferenceOutOfRange {
            timeline: timeline.name.clone(),
            index,
        });
    }

    for (layer_idx, layer) in timeline.layers.iter().enumerate() {
        let mut previous_end = 0u32;
        for (i, frame) in layer.frames.iter().enumerate() {
            if frame.duration == 0 {
                return Err(DocumentError::ZeroDuration {
                    timeline: timeline.name.clone(),
                    layer: layer_idx,
                    index: frame.index,
                });
            }
            if i > 0 && frame.index < previous_end {
                return Err(DocumentError::OverlappingFrames {
                    timeline: timeline.name.clone(),
                    layer: layer_idx,
                    index: frame.index,
                });
            }
            previous_end = frame.end();
        }

        if layer.kind == LayerKind::Masked {
            if let Some(mask) = layer.mask_layer {
                let is_mask = timeline
                    .layers
                    .get(mask)
                    .map(|l| l.kind == LayerKind::Mask)
                    .unwrap_or(false);
                if !is_mask {
                    return Err(DocumentError::InvalidMaskReference {
                        timeline: timeline.name.clone(),
                        layer: layer_idx,
                        mask,
                    });
                }
            }
        }
    }
    Ok(())
}
