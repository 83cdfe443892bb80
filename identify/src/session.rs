use std::sync::Arc;

use snoutid_capture::{
    AcceptOutcome, Camera, CaptureError, CaptureFlow, CaptureSet, CaptureStep, MotionSource,
    ShutterOutcome, StabilityMonitor,
};
use snoutid_profile::DogDetails;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// One dog's registration, from the first shutter press until it is
/// submitted or abandoned.
///
/// The session owns its capture flow and a running stability monitor.
/// Submitting consumes it, so a session is written at most once.
pub struct RegistrationSession {
    details: DogDetails,
    flow: CaptureFlow,
    monitor: StabilityMonitor,
    cancel: CancellationToken,
}

/// What [`RegistrationSession::finish`] hands to the registrar.
pub(crate) struct Finished {
    pub details: DogDetails,
    pub step: CaptureStep,
    pub photos: CaptureSet,
    pub cancel: CancellationToken,
}

impl RegistrationSession {
    /// Starts a session. `motion` is the gyroscope feed; with `None` the
    /// shutter never enables.
    pub fn new(details: DogDetails, motion: Option<Arc<dyn MotionSource>>) -> Self {
        let monitor = StabilityMonitor::new(motion);
        monitor.start();
        let flow = CaptureFlow::new(monitor.signal());
        Self {
            details,
            flow,
            monitor,
            cancel: CancellationToken::new(),
        }
    }

    pub fn details(&self) -> &DogDetails {
        &self.details
    }

    pub fn flow(&self) -> &CaptureFlow {
        &self.flow
    }

    pub fn step(&self) -> CaptureStep {
        self.flow.step()
    }

    pub fn shutter_enabled(&self) -> bool {
        self.flow.shutter_enabled()
    }

    pub fn shutter(&mut self, camera: &mut dyn Camera) -> Result<ShutterOutcome, CaptureError> {
        self.flow.shutter(camera)
    }

    pub fn retake(&mut self) -> bool {
        self.flow.retake()
    }

    pub fn accept(&mut self) -> AcceptOutcome {
        self.flow.accept()
    }

    /// Token that abandons this session when cancelled. Hand a clone to
    /// whatever may abandon the session while a submit is in flight.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Abandons the session: the stability monitor stops (disabling the
    /// shutter) and any submit in flight drops its result unwritten.
    pub fn abandon(&self) {
        if !self.cancel.is_cancelled() {
            debug!(step = %self.flow.step(), "identify: registration abandoned");
        }
        self.cancel.cancel();
        self.monitor.stop();
    }

    pub fn is_abandoned(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn finish(self) -> Finished {
        self.monitor.stop();
        Finished {
            details: self.details,
            step: self.flow.step(),
            photos: self.flow.photos().clone(),
            cancel: self.cancel,
        }
    }
}

#[cfg(test)]
mod tests {
    use snoutid_capture::{MotionHub, RawFrame, StabilitySample};

    use super::*;

    struct StripeCamera;

    impl Camera for StripeCamera {
        fn capture(&mut self) -> Result<RawFrame, CaptureError> {
            let data: Vec<u8> = (0..32 * 32)
                .map(|i| if (i / 32) % 2 == 0 { 40 } else { 200 })
                .collect();
            Ok(RawFrame::gray(data, 32, 32)?)
        }
    }

    fn session() -> (Arc<MotionHub>, RegistrationSession) {
        let hub = Arc::new(MotionHub::new());
        let session = RegistrationSession::new(
            DogDetails::new("Rex"),
            Some(hub.clone() as Arc<dyn MotionSource>),
        );
        (hub, session)
    }

    #[test]
    fn shutter_follows_motion() {
        let (hub, mut session) = session();
        assert!(!session.shutter_enabled());
        assert_eq!(
            session.shutter(&mut StripeCamera).unwrap(),
            ShutterOutcome::Unstable
        );

        hub.push(StabilitySample::AT_REST);
        assert!(session.shutter_enabled());
        assert_eq!(
            session.shutter(&mut StripeCamera).unwrap(),
            ShutterOutcome::Captured
        );
        assert!(session.flow().pending().is_some());
        assert!(matches!(session.accept(), AcceptOutcome::Accepted { .. }));
        assert_eq!(session.step(), CaptureStep::Paw);
        assert_eq!(session.flow().photos().len(), 1);
        assert_eq!(session.details().name, "Rex");
    }

    #[test]
    fn abandon_disables_shutter() {
        let (hub, mut session) = session();
        hub.push(StabilitySample::AT_REST);
        assert!(session.shutter_enabled());

        let token = session.cancel_token();
        session.abandon();
        assert!(session.is_abandoned());
        assert!(token.is_cancelled());
        assert!(!session.shutter_enabled());
        assert_eq!(hub.subscriber_count(), 0);

        // Samples after abandonment are ignored.
        hub.push(StabilitySample::AT_REST);
        assert_eq!(
            session.shutter(&mut StripeCamera).unwrap(),
            ShutterOutcome::Unstable
        );
    }

    #[test]
    fn no_sensor_never_enables_shutter() {
        let mut session = RegistrationSession::new(DogDetails::new("Rex"), None);
        assert!(!session.shutter_enabled());
        assert_eq!(
            session.shutter(&mut StripeCamera).unwrap(),
            ShutterOutcome::Unstable
        );
    }

    #[test]
    fn finish_releases_the_sensor() {
        let (hub, session) = session();
        assert_eq!(hub.subscriber_count(), 1);
        let finished = session.finish();
        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(finished.step, CaptureStep::Nose);
        assert!(finished.photos.is_empty());
    }
}
