use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EmbeddingError;

/// Number of components in a nose embedding.
pub const EMBEDDING_DIM: usize = 128;

/// Size of the binary layout of a standard embedding (128 x 4 bytes).
pub const EMBEDDING_BYTES: usize = EMBEDDING_DIM * 4;

/// A nose embedding: an ordered vector of 32-bit floats.
///
/// The model always produces [`EMBEDDING_DIM`] components, but embeddings
/// read back from storage are not re-validated; the matcher treats a
/// length mismatch as an unbounded distance.
///
/// # Binary Layout
///
/// Persistence layers store embeddings as consecutive little-endian
/// IEEE-754 `f32` values. [`Embedding::to_le_bytes`] and
/// [`Embedding::from_le_bytes`] round-trip byte for byte, NaN payloads
/// included.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    /// Creates an embedding after checking it has exactly `dim` components.
    pub fn with_dim(values: Vec<f32>, dim: usize) -> Result<Self, EmbeddingError> {
        if values.len() != dim {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dim,
                got: values.len(),
            });
        }
        Ok(Self(values))
    }

    /// Decodes consecutive little-endian `f32` values.
    pub fn from_le_bytes(bytes: &[u8]) -> Result<Self, EmbeddingError> {
        if bytes.len() % 4 != 0 {
            return Err(EmbeddingError::InvalidLength(bytes.len()));
        }
        let values = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(Self(values))
    }

    /// Encodes the embedding as consecutive little-endian `f32` values.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.0.len() * 4);
        for v in &self.0 {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

impl AsRef<[f32]> for Embedding {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

impl fmt::Debug for Embedding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Embedding")
            .field("dim", &self.0.len())
            .field("head", &&self.0[..self.0.len().min(4)])
            .finish()
    }
}
