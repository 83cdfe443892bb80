//! Brightness/variance heuristic for rejecting dark, blown-out or flat
//! (blurry) frames.
//!
//! Thresholds are fixed policy, not learned:
//!
//! ```text
//! acceptable = 30.0 <= brightness <= 220.0 && variance > 120.0
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::frame::RawFrame;

/// Lowest acceptable mean luma (inclusive).
pub const MIN_BRIGHTNESS: f64 = 30.0;

/// Highest acceptable mean luma (inclusive).
pub const MAX_BRIGHTNESS: f64 = 220.0;

/// Luma variance must be strictly above this.
pub const MIN_VARIANCE: f64 = 120.0;

/// Usability score of a frame, derived solely from its luma channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Mean of the luma bytes.
    pub brightness: f64,
    /// Population variance of the luma bytes.
    pub variance: f64,
    pub is_acceptable: bool,
}

/// Why a frame failed the quality gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    TooDark,
    TooBright,
    /// Not enough contrast; usually blur or a featureless surface.
    TooFlat,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooDark => write!(f, "too dark"),
            Self::TooBright => write!(f, "too bright"),
            Self::TooFlat => write!(f, "too blurry"),
        }
    }
}

impl QualityMetrics {
    /// Scores a luma buffer in a single pass.
    ///
    /// Sums are accumulated as integers, so the result does not depend on
    /// the order the bytes are visited. An empty buffer scores
    /// brightness 0 and variance 0.
    pub fn from_luma(luma: &[u8]) -> Self {
        let (sum, sum_sq) = luma.iter().fold((0u64, 0u64), |(s, sq), &b| {
            let v = b as u64;
            (s + v, sq + v * v)
        });

        let (brightness, variance) = if luma.is_empty() {
            (0.0, 0.0)
        } else {
            let n = luma.len() as u128;
            let (sum, sum_sq) = (sum as u128, sum_sq as u128);
            // n * sum_sq >= sum^2 (Cauchy-Schwarz), so this never underflows.
            let spread = n * sum_sq - sum * sum;
            (
                sum as f64 / n as f64,
                spread as f64 / (n * n) as f64,
            )
        };

        Self {
            brightness,
            variance,
            is_acceptable: (MIN_BRIGHTNESS..=MAX_BRIGHTNESS).contains(&brightness)
                && variance > MIN_VARIANCE,
        }
    }

    /// Returns the first failed rule, or `None` if acceptable.
    pub fn rejection(&self) -> Option<Rejection> {
        if self.brightness < MIN_BRIGHTNESS {
            Some(Rejection::TooDark)
        } else if self.brightness > MAX_BRIGHTNESS {
            Some(Rejection::TooBright)
        } else if self.variance <= MIN_VARIANCE {
            Some(Rejection::TooFlat)
        } else {
            None
        }
    }
}

impl fmt::Display for QualityMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "brightness {:.1}, variance {:.1}",
            self.brightness, self.variance
        )
    }
}

/// Scores a raw luma buffer.
pub fn evaluate_luma(luma: &[u8]) -> QualityMetrics {
    QualityMetrics::from_luma(luma)
}

/// Scores a frame by its luma channel.
///
/// Never fails: an encoded frame that cannot be decoded scores like an
/// empty buffer and is therefore rejected.
pub fn evaluate(frame: &RawFrame) -> QualityMetrics {
    match frame.luma() {
        Ok(luma) => QualityMetrics::from_luma(&luma),
        Err(e) => {
            warn!(error = %e, "capture: frame has no readable luma, scoring as empty");
            QualityMetrics::from_luma(&[])
        }
    }
}
