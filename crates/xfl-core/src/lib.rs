//! Timeline resolution and frame rendering for authored vector-animation
//! documents.
//!
//! A [`Player`] holds one [`Document`](xfl_data::model::Document) and draws
//! any of its frames onto a [`Surface`]. Drawing goes through the surface
//! trait only, so the engine runs unchanged against a raster backend, the
//! [`RecordingSurface`] display list or the debug [`HitTestSurface`].

pub mod camera;
pub mod color;
pub mod diagnostics;
pub mod effects;
pub mod error;
pub mod hit_test;
pub mod paint;
pub mod path;
pub mod player;
pub mod render;
pub mod surface;
pub mod text;
pub mod timeline;
pub mod transform;
pub mod tween;
pub mod validate;
pub mod viewport;

pub use camera::{CameraLayer, CameraPredicate, ViewportFit};
pub use error::{DocumentError, PlayerError};
pub use hit_test::{ElementTag, HitResult, HitTestSurface};
pub use path::{AssembledShape, AssemblerConfig, PathAssembler};
pub use player::{LoadTicket, Player, PreparedDocument};
pub use render::{FrameRenderer, RenderSettings, MAX_SYMBOL_DEPTH};
pub use surface::{DrawCommand, RecordingSurface, Surface};
pub use text::{AllFontsReady, FontProvider, FALLBACK_FACE};
pub use timeline::DrawOrder;
pub use viewport::Viewport;
pub use xfl_data;
