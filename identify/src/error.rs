use snoutid_capture::CaptureStep;
use snoutid_profile::StoreError;
use thiserror::Error;

/// Errors from the identification and registration pipelines.
///
/// Extraction failures are not errors here: they are a regular outcome,
/// reported as [`crate::Report::ExtractionFailed`] or as a profile
/// registered without an embedding.
#[derive(Debug, Error)]
pub enum IdentifyError {
    /// The profile store failed.
    #[error("identify: store: {0}")]
    Store(#[from] StoreError),

    /// A session was submitted before every photo was accepted.
    #[error("identify: capture incomplete, still at step {0}")]
    Incomplete(CaptureStep),

    /// A blocking-pool task panicked or was aborted.
    #[error("identify: worker: {0}")]
    Worker(String),
}

impl From<tokio::task::JoinError> for IdentifyError {
    fn from(e: tokio::task::JoinError) -> Self {
        IdentifyError::Worker(e.to_string())
    }
}
