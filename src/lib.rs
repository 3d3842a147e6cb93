//! # XFL Player
//!
//! Renders authored vector-animation documents frame by frame.
//!
//! The engine lives in [`xfl_core`] and draws through its `Surface` trait;
//! [`xfl_skia`] supplies the raster backend. This crate re-exports both and
//! adds [`export`], which writes frame ranges out as PNG files.

pub mod export;

pub use xfl_core::surface::Surface;
pub use xfl_core::{
    CameraLayer, CameraPredicate, DocumentError, DrawOrder, HitResult, Player, PlayerError,
    RenderSettings, Viewport,
};
pub use xfl_data::model::Document;
pub use xfl_skia::{SkiaError, SkiaSurface};
pub use {xfl_core, xfl_data, xfl_skia};
