//! Outbound application events.
//!
//! The [`AccessService`](super::service::AccessService) emits these through
//! the [`EventSink`](super::ports::EventSink) port. The firmware side logs
//! them; the test harness records them to assert on the decision sequence.

use crate::beacon::BeaconId;

use super::service::SleepReason;

/// Structured events emitted by the control policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// The control loop has started.
    Started,

    /// A beacon passed validation and presence began (not emitted for
    /// refreshes while already authorized).
    BeaconAccepted { id: BeaconId, rssi: i8 },

    /// The stale window elapsed without a beacon refresh; presence dropped
    /// and the outputs re-locked.
    PresenceLost,

    /// Ignition turned on (observed while authorized).
    IgnitionOn,

    /// Ignition turned off (observed while authorized).
    IgnitionOff,

    /// Door observed open for the first time since authorization; the
    /// door-grace sleep window is now running.
    DoorOpened,

    /// The loop decided to deep-sleep; outputs were forced safe first.
    SleepRequested(SleepReason),
}
