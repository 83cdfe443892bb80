use thiserror::Error;

/// Errors returned by embedding extraction.
///
/// None of these are worth retrying with the same input: the caller
/// should ask for another photo.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// The model could not be loaded. Raised when the extractor is built.
    #[error("noseprint: model unavailable: {0}")]
    ModelUnavailable(String),

    /// The input image could not be read or decoded.
    #[error("noseprint: decode failure: {0}")]
    DecodeFailure(String),

    /// The inference step failed or produced an unusable vector.
    #[error("noseprint: inference failure: {0}")]
    InferenceFailure(String),
}
