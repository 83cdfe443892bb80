use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::CaptureError;
use crate::frame::RawFrame;
use crate::quality::{self, QualityMetrics};
use crate::stability::StabilitySignal;

/// Body region photographed at each step, in capture order.
///
/// Steps only ever advance by one position, on an accepted photo.
/// [`CaptureStep::Done`] is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStep {
    Nose,
    Paw,
    Body1,
    Body2,
    Done,
}

/// The step whose photo feeds embedding extraction.
pub const EMBEDDING_STEP: CaptureStep = CaptureStep::Nose;

impl CaptureStep {
    /// Steps that take a photo, in order.
    pub const SHOTS: [CaptureStep; 4] = [Self::Nose, Self::Paw, Self::Body1, Self::Body2];

    /// The following step. `Done` stays `Done`.
    pub fn next(self) -> Self {
        match self {
            Self::Nose => Self::Paw,
            Self::Paw => Self::Body1,
            Self::Body1 => Self::Body2,
            Self::Body2 | Self::Done => Self::Done,
        }
    }

    pub fn is_done(self) -> bool {
        self == Self::Done
    }
}

impl fmt::Display for CaptureStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nose => write!(f, "NOSE"),
            Self::Paw => write!(f, "PAW"),
            Self::Body1 => write!(f, "BODY1"),
            Self::Body2 => write!(f, "BODY2"),
            Self::Done => write!(f, "DONE"),
        }
    }
}

/// Supplies a frame when the shutter fires.
///
/// The flow never controls exposure or focus; it only asks for a capture.
pub trait Camera {
    fn capture(&mut self) -> Result<RawFrame, CaptureError>;
}

/// Where the flow is within the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Camera live; shutter enabled while the device is steady.
    Acquire,
    /// A captured frame awaits accept or retake.
    Review,
    /// All photos taken.
    Done,
}

/// Result of a shutter action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutterOutcome {
    /// A frame was captured and is now under review.
    Captured,
    /// Refused: the device is not steady. No frame was requested.
    Unstable,
    /// Refused: a frame is already under review.
    Busy,
    /// Refused: the flow is complete.
    Done,
}

/// Result of accepting the frame under review.
#[derive(Debug, Clone)]
pub enum AcceptOutcome {
    /// Frame kept for `step`; the flow moved on to the next step.
    Accepted {
        step: CaptureStep,
        metrics: QualityMetrics,
    },
    /// Frame kept for the last step; every photo is taken.
    Completed {
        metrics: QualityMetrics,
        photos: CaptureSet,
    },
    /// Frame discarded by the quality gate; the step did not change.
    Rejected {
        step: CaptureStep,
        metrics: QualityMetrics,
    },
    /// Nothing is under review.
    NothingToReview,
}

/// A photo kept by the flow.
#[derive(Debug, Clone)]
pub struct CapturedPhoto {
    pub step: CaptureStep,
    pub frame: RawFrame,
    pub metrics: QualityMetrics,
}

/// Accepted photos in capture order, at most one per step.
#[derive(Debug, Clone, Default)]
pub struct CaptureSet {
    photos: Vec<CapturedPhoto>,
}

impl CaptureSet {
    pub fn photos(&self) -> &[CapturedPhoto] {
        &self.photos
    }

    pub fn get(&self, step: CaptureStep) -> Option<&CapturedPhoto> {
        self.photos.iter().find(|p| p.step == step)
    }

    /// The photo to extract an embedding from, looked up by step
    /// identity rather than position.
    pub fn embedding_photo(&self) -> Option<&CapturedPhoto> {
        self.get(EMBEDDING_STEP)
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        CaptureStep::SHOTS.iter().all(|&s| self.get(s).is_some())
    }
}

/// Drives one registration's photo acquisition.
///
/// Each step alternates between acquire (shutter gated on stability) and
/// review (accept runs the quality gate, retake discards). All actions
/// take `&mut self`, so they are serialized with respect to each other;
/// the stability signal is read only at shutter time, so a reading that
/// changes during review has no effect on the review.
pub struct CaptureFlow {
    step: CaptureStep,
    pending: Option<RawFrame>,
    photos: CaptureSet,
    stability: StabilitySignal,
}

impl CaptureFlow {
    pub fn new(stability: StabilitySignal) -> Self {
        Self {
            step: CaptureStep::Nose,
            pending: None,
            photos: CaptureSet::default(),
            stability,
        }
    }

    pub fn step(&self) -> CaptureStep {
        self.step
    }

    pub fn phase(&self) -> Phase {
        if self.step.is_done() {
            Phase::Done
        } else if self.pending.is_some() {
            Phase::Review
        } else {
            Phase::Acquire
        }
    }

    /// Whether the shutter control should be enabled right now.
    pub fn shutter_enabled(&self) -> bool {
        self.phase() == Phase::Acquire && self.stability.is_stable()
    }

    /// The frame under review, for preview.
    pub fn pending(&self) -> Option<&RawFrame> {
        self.pending.as_ref()
    }

    pub fn photos(&self) -> &CaptureSet {
        &self.photos
    }

    /// Fires the shutter. Refused without touching the camera unless the
    /// flow is acquiring and the device is steady.
    ///
    /// Camera failures leave the flow in acquire.
    pub fn shutter(&mut self, camera: &mut dyn Camera) -> Result<ShutterOutcome, CaptureError> {
        match self.phase() {
            Phase::Done => return Ok(ShutterOutcome::Done),
            Phase::Review => return Ok(ShutterOutcome::Busy),
            Phase::Acquire => {}
        }
        if !self.stability.is_stable() {
            debug!(step = %self.step, "capture: shutter refused, device unstable");
            return Ok(ShutterOutcome::Unstable);
        }

        let frame = camera.capture().inspect_err(|e| {
            warn!(step = %self.step, error = %e, "capture: camera failed");
        })?;
        debug!(step = %self.step, ?frame, "capture: frame captured");
        self.pending = Some(frame);
        Ok(ShutterOutcome::Captured)
    }

    /// Discards the frame under review without scoring it.
    /// Returns false if nothing was under review.
    pub fn retake(&mut self) -> bool {
        let discarded = self.pending.take().is_some();
        if discarded {
            debug!(step = %self.step, "capture: retake");
        }
        discarded
    }

    /// Scores the frame under review and keeps it if acceptable.
    pub fn accept(&mut self) -> AcceptOutcome {
        let Some(frame) = self.pending.take() else {
            return AcceptOutcome::NothingToReview;
        };
        let step = self.step;
        let metrics = quality::evaluate(&frame);

        if !metrics.is_acceptable {
            info!(
                %step,
                brightness = metrics.brightness,
                variance = metrics.variance,
                "capture: image rejected"
            );
            return AcceptOutcome::Rejected { step, metrics };
        }

        self.photos.photos.push(CapturedPhoto {
            step,
            frame,
            metrics,
        });
        self.step = step.next();
        info!(%step, next = %self.step, "capture: image accepted");

        if self.step.is_done() {
            AcceptOutcome::Completed {
                metrics,
                photos: self.photos.clone(),
            }
        } else {
            AcceptOutcome::Accepted { step, metrics }
        }
    }
}
