use snoutid_matcher::EmbeddingError;
use thiserror::Error;

/// Errors returned by profile stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("profile: storage error: {0}")]
    Storage(String),

    #[error("profile: serialization error: {0}")]
    Serialization(String),

    #[error("profile: corrupt embedding for profile {id}: {source}")]
    Embedding {
        id: u64,
        #[source]
        source: EmbeddingError,
    },
}
