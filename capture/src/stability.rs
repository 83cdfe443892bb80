use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Angular rate (rad/s) each axis must stay strictly below to count as steady.
pub const STABILITY_THRESHOLD: f32 = 0.15;

/// One gyroscope reading: angular rate around three axes, in rad/s.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StabilitySample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl StabilitySample {
    /// A device at rest.
    pub const AT_REST: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// True when every axis is strictly below [`STABILITY_THRESHOLD`].
    /// NaN readings are never steady.
    pub fn is_stable(&self) -> bool {
        [self.x, self.y, self.z]
            .iter()
            .all(|a| a.abs() < STABILITY_THRESHOLD)
    }
}

/// Callback a [`MotionSource`] invokes for every sample.
pub type MotionListener = Arc<dyn Fn(StabilitySample) + Send + Sync>;

/// Handle identifying one subscription on a [`MotionSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

/// Push stream of gyroscope samples.
///
/// There is no backpressure: a listener only ever cares about the latest
/// sample. Implementations must not invoke the listener from inside
/// `subscribe`, nor while holding a lock that `subscribe` or
/// `unsubscribe` also takes ([`MotionHub`] snapshots its listeners
/// before calling them).
pub trait MotionSource: Send + Sync {
    fn subscribe(&self, listener: MotionListener) -> SubscriptionId;

    /// Removes a subscription. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);
}

/// In-process [`MotionSource`] that fans pushed samples out to every
/// subscriber. Useful for hosts without a real sensor and for tests.
#[derive(Default)]
pub struct MotionHub {
    inner: Mutex<MotionHubInner>,
}

#[derive(Default)]
struct MotionHubInner {
    listeners: BTreeMap<u64, MotionListener>,
    next_id: u64,
}

impl MotionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers a sample to all current subscribers.
    pub fn push(&self, sample: StabilitySample) {
        let listeners: Vec<MotionListener> = self.inner.lock().listeners.values().cloned().collect();
        for l in listeners {
            l(sample);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }
}

impl MotionSource for MotionHub {
    fn subscribe(&self, listener: MotionListener) -> SubscriptionId {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.listeners.insert(id, listener);
        SubscriptionId(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.lock().listeners.remove(&id.0);
    }
}

/// Read side of the stability cell. Cheap to clone; every clone observes
/// the same latest value.
#[derive(Clone, Debug, Default)]
pub struct StabilitySignal {
    stable: Arc<AtomicBool>,
}

impl StabilitySignal {
    pub fn is_stable(&self) -> bool {
        self.stable.load(Ordering::Acquire)
    }
}

/// Reduces a gyroscope stream to a single "device is steady" flag.
///
/// The monitor is the only writer of its [`StabilitySignal`]; the capture
/// flow polls the signal before each shutter action. Only the most recent
/// reduction is kept.
///
/// # Lifecycle
///
/// [`start`](Self::start) and [`stop`](Self::stop) are idempotent. Stopping
/// resets the signal to unstable, so a stale reading never enables the
/// shutter. Without a motion source the signal stays unstable forever.
pub struct StabilityMonitor {
    source: Option<Arc<dyn MotionSource>>,
    signal: StabilitySignal,
    callback: Option<Arc<dyn Fn(bool) + Send + Sync>>,
    state: Arc<Mutex<MonitorState>>,
}

#[derive(Default)]
struct MonitorState {
    subscription: Option<SubscriptionId>,
}

impl StabilityMonitor {
    /// Creates a monitor over `source`. Pass `None` when the device has no
    /// gyroscope.
    pub fn new(source: Option<Arc<dyn MotionSource>>) -> Self {
        Self {
            source,
            signal: StabilitySignal::default(),
            callback: None,
            state: Arc::new(Mutex::new(MonitorState::default())),
        }
    }

    /// Registers a callback invoked with the reduced flag on every sample.
    /// The callback runs without any monitor lock held and may call back
    /// into the monitor, including [`stop`](Self::stop).
    pub fn with_callback(mut self, callback: impl Fn(bool) + Send + Sync + 'static) -> Self {
        self.callback = Some(Arc::new(callback));
        self
    }

    pub fn signal(&self) -> StabilitySignal {
        self.signal.clone()
    }

    pub fn is_stable(&self) -> bool {
        self.signal.is_stable()
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().subscription.is_some()
    }

    /// Subscribes to the motion source. A second call while running is a
    /// no-op.
    pub fn start(&self) {
        let mut state = self.state.lock();
        if state.subscription.is_some() {
            return;
        }
        let Some(source) = &self.source else {
            warn!("capture: no motion sensor, stability stays false");
            self.signal.stable.store(false, Ordering::Release);
            return;
        };

        let stable = self.signal.stable.clone();
        let callback = self.callback.clone();
        let guard = Arc::downgrade(&self.state);
        let listener: MotionListener = Arc::new(move |sample: StabilitySample| {
            let Some(state) = guard.upgrade() else {
                return;
            };
            let s = sample.is_stable();
            {
                // Holding the state lock orders this write against stop().
                let state = state.lock();
                if state.subscription.is_none() {
                    return;
                }
                stable.store(s, Ordering::Release);
            }
            // Called unlocked, so the callback may use the monitor.
            if let Some(cb) = &callback {
                cb(s);
            }
        });

        // The listener blocks on the state lock until we return, so it
        // cannot observe the pre-subscription state.
        state.subscription = Some(source.subscribe(listener));
        debug!("capture: stability monitor started");
    }

    /// Unsubscribes and resets the signal to unstable. No-op when not running.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        let Some(id) = state.subscription.take() else {
            return;
        };
        self.signal.stable.store(false, Ordering::Release);
        drop(state);
        if let Some(source) = &self.source {
            source.unsubscribe(id);
        }
        debug!("capture: stability monitor stopped");
    }
}

impl Drop for StabilityMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Weak;
    use std::sync::atomic::AtomicUsize;

    use super::*;

    fn hub_monitor() -> (Arc<MotionHub>, StabilityMonitor) {
        let hub = Arc::new(MotionHub::new());
        let monitor = StabilityMonitor::new(Some(hub.clone() as Arc<dyn MotionSource>));
        (hub, monitor)
    }

    #[test]
    fn sample_reduction() {
        assert!(StabilitySample::AT_REST.is_stable());
        assert!(StabilitySample::new(0.149, -0.149, 0.0).is_stable());
        assert!(!StabilitySample::new(0.15, 0.0, 0.0).is_stable());
        assert!(!StabilitySample::new(0.0, -0.2, 0.0).is_stable());
        assert!(!StabilitySample::new(0.0, 0.0, f32::NAN).is_stable());
    }

    #[test]
    fn tracks_latest_sample() {
        let (hub, monitor) = hub_monitor();
        let signal = monitor.signal();
        assert!(!signal.is_stable());

        monitor.start();
        hub.push(StabilitySample::AT_REST);
        assert!(signal.is_stable());
        hub.push(StabilitySample::new(0.5, 0.0, 0.0));
        assert!(!signal.is_stable());
        hub.push(StabilitySample::new(0.01, 0.02, 0.03));
        assert!(monitor.is_stable());
    }

    #[test]
    fn callback_sees_every_sample() {
        let hub = Arc::new(MotionHub::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let stable_calls = Arc::new(AtomicUsize::new(0));
        let (c, s) = (calls.clone(), stable_calls.clone());
        let monitor = StabilityMonitor::new(Some(hub.clone() as Arc<dyn MotionSource>))
            .with_callback(move |stable| {
                c.fetch_add(1, Ordering::SeqCst);
                if stable {
                    s.fetch_add(1, Ordering::SeqCst);
                }
            });
        monitor.start();
        hub.push(StabilitySample::AT_REST);
        hub.push(StabilitySample::new(1.0, 0.0, 0.0));
        hub.push(StabilitySample::AT_REST);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(stable_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn callback_may_stop_the_monitor() {
        let hub = Arc::new(MotionHub::new());
        let slot: Arc<Mutex<Weak<StabilityMonitor>>> = Arc::new(Mutex::new(Weak::new()));
        let s = slot.clone();
        let monitor = Arc::new(
            StabilityMonitor::new(Some(hub.clone() as Arc<dyn MotionSource>)).with_callback(
                move |stable| {
                    let Some(m) = s.lock().upgrade() else {
                        return;
                    };
                    assert!(m.is_running());
                    if !stable {
                        m.stop();
                    }
                },
            ),
        );
        *slot.lock() = Arc::downgrade(&monitor);

        monitor.start();
        hub.push(StabilitySample::AT_REST);
        assert!(monitor.is_stable());

        hub.push(StabilitySample::new(1.0, 0.0, 0.0));
        assert!(!monitor.is_running());
        assert!(!monitor.is_stable());
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn start_is_idempotent() {
        let (hub, monitor) = hub_monitor();
        monitor.start();
        monitor.start();
        assert_eq!(hub.subscriber_count(), 1);
        assert!(monitor.is_running());
    }

    #[test]
    fn stop_is_idempotent_and_resets() {
        let (hub, monitor) = hub_monitor();
        monitor.stop();
        assert!(!monitor.is_running());

        monitor.start();
        hub.push(StabilitySample::AT_REST);
        assert!(monitor.is_stable());

        monitor.stop();
        monitor.stop();
        assert_eq!(hub.subscriber_count(), 0);
        assert!(!monitor.is_stable());

        // Samples after stop are ignored.
        hub.push(StabilitySample::AT_REST);
        assert!(!monitor.is_stable());
    }

    #[test]
    fn restart_after_stop() {
        let (hub, monitor) = hub_monitor();
        monitor.start();
        monitor.stop();
        monitor.start();
        assert_eq!(hub.subscriber_count(), 1);
        hub.push(StabilitySample::AT_REST);
        assert!(monitor.is_stable());
    }

    #[test]
    fn no_sensor_is_never_stable() {
        let monitor = StabilityMonitor::new(None);
        monitor.start();
        assert!(!monitor.is_stable());
        assert!(!monitor.is_running());
        monitor.stop();
    }

    #[test]
    fn drop_unsubscribes() {
        let (hub, monitor) = hub_monitor();
        monitor.start();
        drop(monitor);
        assert_eq!(hub.subscriber_count(), 0);
    }
}
