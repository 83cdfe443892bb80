use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::distance::euclidean_distance;
use crate::embedding::Embedding;

/// Maximum Euclidean distance (inclusive) at which two embeddings are
/// considered the same dog.
pub const MATCH_THRESHOLD: f32 = 0.8;

/// Identity decision for a query embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// The nearest candidate is within the threshold.
    Match,
    /// Candidates exist but none is within the threshold.
    NoMatch,
    /// No candidate carries an embedding to compare against.
    NoData,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Match => write!(f, "match"),
            Self::NoMatch => write!(f, "no_match"),
            Self::NoData => write!(f, "no_data"),
        }
    }
}

/// Result of matching a query embedding against stored candidates.
/// Derived on every call, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult<Id> {
    /// Matched candidate. Set only when `decision` is [`Decision::Match`].
    pub profile_id: Option<Id>,

    /// Distance to the nearest candidate. `f32::INFINITY` for
    /// [`Decision::NoData`] or when no candidate was comparable.
    pub distance: f32,

    pub decision: Decision,
}

/// Nearest candidate found by a [`NearestSearch`].
#[derive(Debug, Clone, PartialEq)]
pub struct Nearest<Id> {
    /// Closest candidate, or `None` if every candidate was at an unbounded
    /// distance (dimension mismatch).
    pub id: Option<Id>,

    pub distance: f32,
}

/// A stored record that may take part in a nearest-neighbor search.
pub trait Candidate {
    type Id: Clone;

    fn candidate_id(&self) -> Self::Id;

    /// The record's embedding; records without one are skipped.
    fn embedding(&self) -> Option<&Embedding>;
}

impl<Id: Clone> Candidate for (Id, Option<Embedding>) {
    type Id = Id;

    fn candidate_id(&self) -> Id {
        self.0.clone()
    }

    fn embedding(&self) -> Option<&Embedding> {
        self.1.as_ref()
    }
}

/// Finds the candidate nearest to a query.
///
/// Implementations must return `None` exactly when no candidate carries an
/// embedding, and must otherwise follow the same tie-break as
/// [`LinearScan`] so that swapping the search never changes a decision.
pub trait NearestSearch<Id> {
    fn nearest(&self, query: &Embedding) -> Option<Nearest<Id>>;
}

/// Brute-force O(n·d) search over a candidate slice.
///
/// # Tie-break
///
/// The minimum is tracked with a strict `<`, so among candidates at equal
/// distance the one earliest in the slice wins. Callers that need a stable
/// winner must impose their own order on the slice (stores list profiles in
/// ascending id order).
pub struct LinearScan<'a, C> {
    candidates: &'a [C],
}

impl<'a, C> LinearScan<'a, C> {
    pub fn new(candidates: &'a [C]) -> Self {
        Self { candidates }
    }
}

impl<C: Candidate> NearestSearch<C::Id> for LinearScan<'_, C> {
    fn nearest(&self, query: &Embedding) -> Option<Nearest<C::Id>> {
        let mut compared = 0usize;
        let mut best_id: Option<C::Id> = None;
        let mut best_distance = f32::INFINITY;

        for c in self.candidates {
            let Some(emb) = c.embedding() else {
                continue;
            };
            compared += 1;

            if emb.len() != query.len() {
                warn!(
                    query_dim = query.len(),
                    candidate_dim = emb.len(),
                    "matcher: skipping candidate with mismatched embedding dimension"
                );
                continue;
            }

            let distance = euclidean_distance(query.as_slice(), emb.as_slice());
            if distance < best_distance {
                best_distance = distance;
                best_id = Some(c.candidate_id());
            }
        }

        if compared == 0 {
            return None;
        }
        Some(Nearest {
            id: best_id,
            distance: best_distance,
        })
    }
}

/// Applies the distance threshold to a nearest-neighbor search.
#[derive(Debug, Clone, Copy)]
pub struct Matcher {
    threshold: f32,
}

impl Matcher {
    /// Creates a Matcher with the default threshold ([`MATCH_THRESHOLD`]).
    pub fn new() -> Self {
        Self {
            threshold: MATCH_THRESHOLD,
        }
    }

    pub fn with_threshold(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Scans `candidates` linearly and decides.
    pub fn match_candidates<C: Candidate>(
        &self,
        query: &Embedding,
        candidates: &[C],
    ) -> MatchResult<C::Id> {
        self.find(&LinearScan::new(candidates), query)
    }

    /// Runs any [`NearestSearch`] and decides.
    pub fn find<Id, S: NearestSearch<Id>>(&self, search: &S, query: &Embedding) -> MatchResult<Id> {
        self.decide(search.nearest(query))
    }

    /// Maps a search outcome to a decision. The threshold is inclusive.
    pub fn decide<Id>(&self, nearest: Option<Nearest<Id>>) -> MatchResult<Id> {
        let result = match nearest {
            None => MatchResult {
                profile_id: None,
                distance: f32::INFINITY,
                decision: Decision::NoData,
            },
            Some(Nearest {
                id: Some(id),
                distance,
            }) if distance <= self.threshold => MatchResult {
                profile_id: Some(id),
                distance,
                decision: Decision::Match,
            },
            Some(Nearest { distance, .. }) => MatchResult {
                profile_id: None,
                distance,
                decision: Decision::NoMatch,
            },
        };
        debug!(
            decision = %result.decision,
            distance = result.distance,
            threshold = self.threshold,
            "matcher: decided"
        );
        result
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new()
    }
}
