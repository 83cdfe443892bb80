//! Nose embeddings and nearest-neighbor identity decisions.
//!
//! An [`Embedding`] is a fixed-length (128) vector of `f32` produced by the
//! noseprint model. Two embeddings describe the same dog only by distance,
//! never by exact equality.
//!
//! [`Matcher`] runs a nearest-neighbor search over stored candidates and
//! applies the decision threshold:
//!
//! ```text
//! no candidate with an embedding  -> NoData
//! nearest distance <= 0.8         -> Match (id, distance)
//! nearest distance >  0.8         -> NoMatch (closest distance)
//! ```
//!
//! The search itself sits behind [`NearestSearch`], so a brute-force
//! [`LinearScan`] can later be replaced by an indexed search without
//! touching the decision rule.

mod distance;
mod embedding;
mod error;
mod matcher;

pub use distance::euclidean_distance;
pub use embedding::{Embedding, EMBEDDING_BYTES, EMBEDDING_DIM};
pub use error::EmbeddingError;
pub use matcher::{Candidate, Decision, LinearScan, MatchResult, Matcher, Nearest, NearestSearch, MATCH_THRESHOLD};
