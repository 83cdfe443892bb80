use std::fmt;

use serde::Serialize;
use snoutid_matcher::Decision;
use snoutid_profile::ProfileId;

/// User-facing outcome of one identification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Report {
    /// The nearest stored dog is within the match threshold.
    Match {
        id: ProfileId,
        name: String,
        breed: String,
        distance: f32,
    },
    /// Dogs with embeddings exist but none is close enough. `distance` is
    /// the closest one seen.
    NoMatch { distance: f32 },
    /// Nothing to compare against.
    NoData,
    /// The query photo could not be turned into an embedding.
    ExtractionFailed { reason: String },
}

impl Report {
    /// The matcher decision behind this report, if the matcher ran.
    pub fn decision(&self) -> Option<Decision> {
        match self {
            Report::Match { .. } => Some(Decision::Match),
            Report::NoMatch { .. } => Some(Decision::NoMatch),
            Report::NoData => Some(Decision::NoData),
            Report::ExtractionFailed { .. } => None,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Report::Match { .. })
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Match {
                name,
                breed,
                distance,
                ..
            } => write!(
                f,
                "Match Found!\n\nName: {name}\nBreed: {breed}\n(Distance: {distance:.4})"
            ),
            // Every stored nose print had an incompatible length.
            Report::NoMatch { distance } if !distance.is_finite() => write!(
                f,
                "No match found in database.\n(No stored nose print could be compared.)"
            ),
            Report::NoMatch { distance } => write!(
                f,
                "No match found in database.\n(Closest match distance: {distance:.4})"
            ),
            Report::NoData => write!(f, "No dogs are registered in the database yet."),
            Report::ExtractionFailed { .. } => {
                write!(f, "Could not process image. Please try a clearer photo.")
            }
        }
    }
}
