//! Port traits — the hexagonal boundary between the control policy and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AccessService (domain)
//! ```
//!
//! Driven adapters (GPIO, log sink) implement these traits. The
//! [`AccessService`](super::service::AccessService) consumes them via
//! generics, so the policy core never touches hardware directly and runs
//! unchanged under the test mocks.

// ───────────────────────────────────────────────────────────────
// Input port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port. Implementations resolve the active-low wiring; the domain
/// only ever sees logical states.
pub trait InputPort {
    /// Door switch: true = door open.
    fn door_open(&mut self) -> bool;

    /// Ignition sense: true = ignition on.
    fn ignition_on(&mut self) -> bool;

    /// Auxiliary sense line: true = asserted. Reported in the advertisement
    /// status bitfield; the control policy itself never branches on it.
    fn aux_active(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Output port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port. Levels are logical; implementations map them to pin
/// levels (the relay is active-high locked).
pub trait OutputPort {
    /// Drive the lock relay. `true` = locked (the boot-safe state).
    fn set_relay_locked(&mut self, locked: bool);

    /// Presence indicator LED.
    fn set_led(&mut self, on: bool);

    /// Audible buzzer. The service pulses this; implementations just set the
    /// level.
    fn set_buzzer(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. The firmware routes them to the log; tests record
/// them for assertions.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
