//! Stability- and quality-gated multi-shot photo capture.
//!
//! # Pipeline
//!
//! 1. [`StabilityMonitor`]: gyroscope samples -> "device is steady" signal
//! 2. [`CaptureFlow::shutter`]: requests a frame only while steady
//! 3. [`quality::evaluate`]: luma brightness/variance -> [`QualityMetrics`]
//! 4. [`CaptureFlow::accept`]: keeps acceptable frames and advances
//!    NOSE -> PAW -> BODY1 -> BODY2 -> DONE
//!
//! Once the flow reaches [`CaptureStep::Done`] it hands over a
//! [`CaptureSet`]; only the nose photo feeds embedding extraction.

mod error;
mod flow;
mod frame;
pub mod quality;
mod stability;

pub use error::{CaptureError, FrameError};
pub use flow::{
    AcceptOutcome, Camera, CaptureFlow, CaptureSet, CaptureStep, CapturedPhoto, Phase,
    ShutterOutcome, EMBEDDING_STEP,
};
pub use frame::{FrameFormat, RawFrame};
pub use quality::{QualityMetrics, Rejection};
pub use stability::{
    MotionHub, MotionListener, MotionSource, StabilityMonitor, StabilitySample, StabilitySignal,
    SubscriptionId, STABILITY_THRESHOLD,
};
