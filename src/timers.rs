//! One-shot deadline timers over an injected monotonic clock.
//!
//! The control loop never reads a clock directly: every timeout is an
//! arm/check/disarm operation against `now_ms` supplied by the caller, so
//! tests drive synthetic time. A disarmed deadline never expires.

/// A single one-shot deadline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline {
    deadline_ms: Option<u64>,
}

impl Deadline {
    #[must_use]
    pub const fn new() -> Self {
        Self { deadline_ms: None }
    }

    /// Arm (or re-arm) to fire `window_ms` after `now_ms`.
    pub fn arm(&mut self, now_ms: u64, window_ms: u64) {
        self.deadline_ms = Some(now_ms.saturating_add(window_ms));
    }

    /// Arm only when currently disarmed; an armed deadline keeps its instant.
    pub fn arm_once(&mut self, now_ms: u64, window_ms: u64) {
        if self.deadline_ms.is_none() {
            self.arm(now_ms, window_ms);
        }
    }

    pub fn disarm(&mut self) {
        self.deadline_ms = None;
    }

    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.deadline_ms.is_some()
    }

    /// Armed and not yet due.
    #[must_use]
    pub fn pending(&self, now_ms: u64) -> bool {
        matches!(self.deadline_ms, Some(d) if now_ms < d)
    }

    /// Armed and due (`now_ms` at or past the deadline).
    #[must_use]
    pub fn expired(&self, now_ms: u64) -> bool {
        matches!(self.deadline_ms, Some(d) if now_ms >= d)
    }
}

/// The control loop's named deadlines.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimerSet {
    /// Sleep window armed at the first door-open edge with ignition off.
    pub door_grace: Deadline,
    /// Sleep ceiling armed when ignition goes off.
    pub hard_off: Deadline,
    /// Audible confirmation pulse; buzzer is high while this is pending.
    pub buzzer_pulse: Deadline,
}

impl TimerSet {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            door_grace: Deadline::new(),
            hard_off: Deadline::new(),
            buzzer_pulse: Deadline::new(),
        }
    }

    /// Disarm both ignition-off windows (ignition on, de-authorization, or
    /// fresh acceptance).
    pub fn disarm_ignition_off(&mut self) {
        self.door_grace.disarm();
        self.hard_off.disarm();
    }
}
