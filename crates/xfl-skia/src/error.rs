use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkiaError {
    #[error("Failed to create a {width}x{height} raster surface")]
    SurfaceCreation { width: i32, height: i32 },
    #[error("Failed to encode frame as PNG")]
    Encode,
    #[error("Bitmap source is not a base64 payload: {0}")]
    InvalidSource(String),
    #[error("Base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),
}
