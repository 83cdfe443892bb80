use thiserror::Error;

/// Errors returned when decoding embeddings.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("matcher: embedding byte length {0} is not a multiple of 4")]
    InvalidLength(usize),

    #[error("matcher: dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}
