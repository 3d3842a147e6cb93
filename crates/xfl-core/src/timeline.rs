//! Playhead resolution: which frame of a layer is showing, what its elements
//! look like mid-tween, and which local frame a nested symbol is on.

use crate::tween::{ease, morph_shape, tween_elements};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeSet;
use xfl_data::model::{
    Element, Frame, Layer, LayerKind, LoopMode, SymbolInstance, Timeline, TweenKind,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawOrder {
    #[default]
    Forward,
    Reverse,
}

/// Clamps a requested playhead into `[0, total - 1]`.
pub fn clamp_playhead(playhead: i64, total: u32) -> u32 {
    let last = total.max(1) as i64 - 1;
    playhead.clamp(0, last) as u32
}

/// Index of the frame showing at `playhead`. Past the last span the last
/// frame holds; before the first frame there is nothing.
pub fn active_frame_index(layer: &Layer, playhead: u32) -> Option<usize> {
    let idx = layer.frames.partition_point(|f| f.index <= playhead);
    if idx == 0 {
        None
    } else {
        Some(idx - 1)
    }
}

/// A layer's content at one playhead.
#[derive(Debug)]
pub struct ResolvedFrame<'a> {
    pub frame_index: usize,
    pub frame: &'a Frame,
    pub elements: Cow<'a, [Element]>,
    /// Eased progress of a shape tween, when one is in effect.
    pub morph_progress: Option<f32>,
}

pub fn resolve_layer(layer: &Layer, playhead: u32) -> Option<ResolvedFrame<'_>> {
    let frame_index = active_frame_index(layer, playhead)?;
    let frame = &layer.frames[frame_index];
    let mut resolved = ResolvedFrame {
        frame_index,
        frame,
        elements: Cow::Borrowed(frame.elements.as_slice()),
        morph_progress: None,
    };

    if frame.tween == TweenKind::None || !frame.contains(playhead) {
        return Some(resolved);
    }
    let Some(next) = layer.frames.get(frame_index + 1) else {
        return Some(resolved);
    };

    let duration = frame.duration.max(1) as f32;
    let t = ease(
        frame.easing.as_ref(),
        (playhead - frame.index) as f32 / duration,
    );

    match frame.tween {
        TweenKind::Motion => {
            resolved.elements = Cow::Owned(tween_elements(&frame.elements, &next.elements, t));
        }
        TweenKind::Shape => {
            if let Some(morph) = &frame.morph {
                let mut elements = frame.elements.clone();
                if let Some(Element::Shape(shape)) =
                    elements.iter_mut().find(|e| matches!(e, Element::Shape(_)))
                {
                    *shape = morph_shape(shape, morph, t);
                    resolved.morph_progress = Some(t);
                }
                resolved.elements = Cow::Owned(elements);
            }
        }
        TweenKind::None => {}
    }
    Some(resolved)
}

/// Local frame of a nested symbol given the parent's playhead.
pub fn local_frame(instance: &SymbolInstance, parent_playhead: u32, total: u32) -> u32 {
    let total = total.max(1) as i64;
    let first = instance.first_frame as i64;
    let elapsed = parent_playhead as i64 - first;
    let local = match instance.loop_mode {
        LoopMode::Loop => elapsed.rem_euclid(total),
        LoopMode::PlayOnce => elapsed.clamp(0, total - 1),
        LoopMode::SingleFrame => first.min(total - 1),
    };
    local as u32
}

/// One step of a timeline's paint plan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayerEntry {
    Single(usize),
    /// Content layers clipped by the silhouette of `mask`.
    Masked { mask: usize, content: Vec<usize> },
}

/// Which layers of `timeline` paint, in paint order, grouped into mask scopes.
///
/// `hidden` holds indices the caller switched off; a hidden folder hides its
/// children. `skip` drops one extra layer, the camera when following it.
pub fn layer_plan(
    timeline: &Timeline,
    order: DrawOrder,
    hidden: Option<&BTreeSet<usize>>,
    skip: Option<usize>,
) -> Vec<LayerEntry> {
    let layers = &timeline.layers;
    let is_hidden = |idx: usize| hidden.is_some_and(|h| hidden_with_parents(timeline, idx, h));

    let indices: Vec<usize> = match order {
        DrawOrder::Forward => (0..layers.len()).rev().collect(),
        DrawOrder::Reverse => (0..layers.len()).collect(),
    };

    let mut plan: Vec<LayerEntry> = Vec::new();
    for idx in indices {
        let layer = &layers[idx];
        if Some(idx) == skip
            || timeline.reference_layers.contains(&idx)
            || matches!(
                layer.kind,
                LayerKind::Guide | LayerKind::Folder | LayerKind::Mask
            )
            || is_hidden(idx)
        {
            continue;
        }

        let mask = layer.mask_layer.filter(|&m| {
            layer.kind == LayerKind::Masked
                && layers.get(m).is_some_and(|l| l.kind == LayerKind::Mask)
                && !is_hidden(m)
        });
        match mask {
            Some(m) => match plan.last_mut() {
                Some(LayerEntry::Masked { mask, content }) if *mask == m => content.push(idx),
                _ => plan.push(LayerEntry::Masked {
                    mask: m,
                    content: vec![idx],
                }),
            },
            None => plan.push(LayerEntry::Single(idx)),
        }
    }
    plan
}

fn hidden_with_parents(timeline: &Timeline, idx: usize, hidden: &BTreeSet<usize>) -> bool {
    let mut current = Some(idx);
    // Bounded walk; a malformed parent chain cannot spin forever.
    for _ in 0..=timeline.layers.len() {
        match current {
            Some(i) if hidden.contains(&i) => return true,
            Some(i) => current = timeline.layers.get(i).and_then(|l| l.parent_layer),
            None => return false,
        }
    }
    false
}
