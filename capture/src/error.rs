use thiserror::Error;

/// Errors returned when building or decoding a [`crate::RawFrame`].
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("capture: frame buffer too short: need {need} bytes for {width}x{height}, got {got}")]
    BufferTooShort {
        width: u32,
        height: u32,
        need: usize,
        got: usize,
    },

    #[error("capture: empty frame")]
    Empty,

    #[error("capture: decode: {0}")]
    Decode(String),
}

/// Errors returned by capture collaborators.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture: camera: {0}")]
    Camera(String),

    #[error(transparent)]
    Frame(#[from] FrameError),
}
