use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("No document has been set")]
    NoDocument,
    #[error("Invalid document: {0}")]
    InvalidDocument(#[from] DocumentError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    #[error("Document has no timelines")]
    NoTimelines,
    #[error("Stage size {width}x{height} is not usable")]
    InvalidStageSize { width: f32, height: f32 },
    #[error("Frame rate {0} is not usable")]
    InvalidFrameRate(f32),
    #[error("{timeline}: layer {layer} has a zero-duration frame at {index}")]
    ZeroDuration {
        timeline: String,
        layer: usize,
        index: u32,
    },
    #[error("{timeline}: layer {layer} frame at {index} overlaps or precedes the previous frame")]
    OverlappingFrames {
        timeline: String,
        layer: usize,
        index: u32,
    },
    #[error("{timeline}: layer {layer} references mask layer {mask} which is not a mask layer")]
    InvalidMaskReference {
        timeline: String,
        layer: usize,
        mask: usize,
    },
    #[error("{timeline}: camera layer index {index} is out of range")]
    CameraOutOfRange { timeline: String, index: usize },
    #[error("{timeline}: reference layer index {index} is out of range")]
    ReferenceOutOfRange { timeline: String, index: usize },
    #[error("Symbol table entry has an empty name")]
    EmptySymbolName,
}
