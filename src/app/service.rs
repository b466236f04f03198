//! Application service — the proximity-gated access control loop.
//!
//! [`AccessService`] owns the control state and implements the per-tick
//! policy: drain radio events, advance the authorization/timer state,
//! reconcile against live ignition/door levels, drive the outputs, and
//! decide when to enter deep sleep. All I/O flows through port traits
//! injected at call sites, so the whole policy runs under mock adapters
//! and a synthetic clock.
//!
//! ```text
//!   InputPort ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                 │      AccessService      │
//!  OutputPort ◀── │  presence · timers ·    │
//!                 │  sleep decision         │
//!                 └────────────────────────┘
//! ```
//!
//! Deep sleep is a terminal outcome: once a tick returns
//! [`TickOutcome::Sleep`], every later tick returns the same value without
//! re-running the policy. The caller owns the actual power-down.

use log::{info, warn};

use crate::beacon::BeaconEvent;
use crate::config::AccessConfig;
use crate::events::{AccessEvent, EventChannel};
use crate::timers::TimerSet;

use super::events::AppEvent;
use super::ports::{EventSink, InputPort, OutputPort};

// ───────────────────────────────────────────────────────────────
// Outcome types
// ───────────────────────────────────────────────────────────────

/// Why the loop decided to power down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepReason {
    /// Unauthorized for the whole scan-cycle budget.
    ScanLimit,
    /// Door opened with ignition off and the grace window elapsed.
    DoorGrace,
    /// Ignition off for the hard ceiling, door never opened.
    HardOff,
}

impl SleepReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ScanLimit => "scan limit",
            Self::DoorGrace => "door grace",
            Self::HardOff => "hard off",
        }
    }
}

/// Result of one control tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Keep ticking.
    Running,
    /// Terminal: force-safe outputs were written; the caller should enter
    /// deep sleep.
    Sleep(SleepReason),
}

// ───────────────────────────────────────────────────────────────
// Control state
// ───────────────────────────────────────────────────────────────

/// The single mutable authority over authorization and timing. Owned by
/// [`AccessService`]; mutated only inside `tick`.
#[derive(Debug, Clone, Copy)]
pub struct ControlState {
    /// True while a qualifying beacon is considered present.
    pub authorized: bool,
    /// True until the door is observed open after authorization; gates the
    /// long sleep timeout.
    pub door_latched: bool,
    /// Scan ticks accumulated while unauthorized; authorized presence
    /// suppresses the budget.
    pub scan_cycles: u32,
    /// Monotonic ms of the last accepted beacon.
    pub last_beacon_ms: Option<u64>,
    /// Monotonic ms of the last scan tick, external or synthetic. Anchored
    /// on the first tick so the synthetic fallback measures from loop start.
    pub last_scan_tick_ms: Option<u64>,
    /// Door-grace, hard-off and buzzer-pulse deadlines.
    pub timers: TimerSet,
}

impl ControlState {
    #[must_use]
    const fn new() -> Self {
        Self {
            authorized: false,
            door_latched: true,
            scan_cycles: 0,
            last_beacon_ms: None,
            last_scan_tick_ms: None,
            timers: TimerSet::new(),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// AccessService
// ───────────────────────────────────────────────────────────────

/// The access control policy core.
pub struct AccessService {
    config: AccessConfig,
    state: ControlState,
    /// Ignition level seen on the previous reconciliation, for edge events.
    prev_ignition_on: Option<bool>,
    /// Latched terminal outcome; set once, never cleared.
    pending_sleep: Option<SleepReason>,
    tick_count: u64,
}

impl AccessService {
    /// Construct the service with a fresh [`ControlState`]. The caller is
    /// expected to have run [`AccessConfig::validate`] first.
    #[must_use]
    pub fn new(config: AccessConfig) -> Self {
        Self {
            config,
            state: ControlState::new(),
            prev_ignition_on: None,
            pending_sleep: None,
            tick_count: 0,
        }
    }

    /// Announce loop start to the sink.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Started);
        info!(
            "AccessService started ({} known beacons, scan budget {} cycles)",
            self.config.known_beacons.len(),
            self.config.scan_cycle_limit
        );
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle at monotonic time `now_ms`.
    ///
    /// The `io` parameter satisfies **both** [`InputPort`] and
    /// [`OutputPort`] — this avoids a double mutable borrow while keeping
    /// the port boundary explicit.
    pub fn tick(
        &mut self,
        now_ms: u64,
        events: &EventChannel,
        io: &mut (impl InputPort + OutputPort),
        sink: &mut impl EventSink,
    ) -> TickOutcome {
        // Terminal state: the decision was already made.
        if let Some(reason) = self.pending_sleep {
            return TickOutcome::Sleep(reason);
        }
        self.tick_count += 1;

        // 1. Drain radio events.
        while let Some(event) = events.try_next() {
            match event {
                AccessEvent::Beacon(beacon) => self.accept_beacon(&beacon, now_ms, io, sink),
                AccessEvent::ScanTick => {
                    self.state.scan_cycles = self.state.scan_cycles.saturating_add(1);
                    self.state.last_scan_tick_ms = Some(now_ms);
                }
            }
        }

        // 2. Synthetic scan tick: keep the low-power budget moving even if
        //    the radio stalls.
        match self.state.last_scan_tick_ms {
            None => self.state.last_scan_tick_ms = Some(now_ms),
            Some(last) if now_ms.saturating_sub(last) >= self.config.scan_tick_ms => {
                self.state.scan_cycles = self.state.scan_cycles.saturating_add(1);
                self.state.last_scan_tick_ms = Some(now_ms);
            }
            Some(_) => {}
        }

        // 3. Staleness: beacon left range.
        if self.state.authorized {
            if let Some(last) = self.state.last_beacon_ms {
                if now_ms.saturating_sub(last) >= self.config.beacon_stale_ms {
                    self.state.authorized = false;
                    self.state.door_latched = true;
                    self.state.timers.disarm_ignition_off();
                    self.prev_ignition_on = None;
                    io.set_relay_locked(true);
                    io.set_led(false);
                    sink.emit(&AppEvent::PresenceLost);
                    info!("presence lost after {} ms silence", self.config.beacon_stale_ms);
                }
            }
        }

        // 4. Dispatch on authorization.
        if self.state.authorized {
            self.state.scan_cycles = 0;
            if let Some(reason) = self.reconcile(now_ms, io, sink) {
                return self.enter_sleep(reason, io, sink);
            }
        } else if self.state.scan_cycles >= self.config.scan_cycle_limit {
            return self.enter_sleep(SleepReason::ScanLimit, io, sink);
        }

        // 5. Buzzer pulse projection.
        io.set_buzzer(self.state.timers.buzzer_pulse.pending(now_ms));

        TickOutcome::Running
    }

    // ── Beacon acceptance ─────────────────────────────────────

    /// Validate one discovery and update presence. Rejections are logged and
    /// dropped; they never propagate as errors.
    fn accept_beacon(
        &mut self,
        beacon: &BeaconEvent,
        now_ms: u64,
        io: &mut impl OutputPort,
        sink: &mut impl EventSink,
    ) {
        let Some(floor) = self.config.rssi_floor(beacon.id) else {
            // Scanner only reports table entries, so this is unexpected.
            warn!("beacon {} not in table, dropped", beacon.id.as_str());
            return;
        };
        if !beacon.metadata_ok {
            info!("beacon {} rejected: bad payload", beacon.id.as_str());
            return;
        }
        if beacon.rssi < floor {
            info!(
                "beacon {} rejected: rssi {} below floor {}",
                beacon.id.as_str(),
                beacon.rssi,
                floor
            );
            return;
        }

        let fresh = !self.state.authorized;
        self.state.last_beacon_ms = Some(now_ms);

        if fresh {
            self.state.authorized = true;
            self.state.scan_cycles = 0;
            self.state.door_latched = true;
            self.state.timers.disarm_ignition_off();
            self.prev_ignition_on = None;
            // One confirmation chirp per presence session; an in-flight
            // pulse is never extended.
            if !self.state.timers.buzzer_pulse.pending(now_ms) {
                self.state
                    .timers
                    .buzzer_pulse
                    .arm(now_ms, self.config.buzzer_pulse_ms);
            }
            sink.emit(&AppEvent::BeaconAccepted {
                id: beacon.id,
                rssi: beacon.rssi,
            });
            info!(
                "beacon {} accepted (rssi {}), unlocking",
                beacon.id.as_str(),
                beacon.rssi
            );
        }

        // Fresh or refresh: re-assert the presence outputs. Reconciliation
        // later in the same tick overrides these while ignition is off.
        io.set_relay_locked(false);
        io.set_led(true);
    }

    // ── Ignition/door reconciliation ──────────────────────────

    /// Only runs while authorized. Reads live levels and applies the
    /// ignition-off sleep windows. Returns a reason when a window expired.
    fn reconcile(
        &mut self,
        now_ms: u64,
        io: &mut (impl InputPort + OutputPort),
        sink: &mut impl EventSink,
    ) -> Option<SleepReason> {
        let ignition_on = io.ignition_on();

        if let Some(prev) = self.prev_ignition_on {
            if prev != ignition_on {
                sink.emit(if ignition_on {
                    &AppEvent::IgnitionOn
                } else {
                    &AppEvent::IgnitionOff
                });
                info!("ignition {}", if ignition_on { "on" } else { "off" });
            }
        }
        self.prev_ignition_on = Some(ignition_on);

        if ignition_on {
            // Powered: unlocked, no windows, stay awake indefinitely.
            io.set_relay_locked(false);
            io.set_led(false);
            self.state.door_latched = true;
            self.state.timers.disarm_ignition_off();
            return None;
        }

        // Ignition off: the hard ceiling runs from the off instant.
        self.state
            .timers
            .hard_off
            .arm_once(now_ms, self.config.hard_off_ms);

        if self.state.door_latched && io.door_open() {
            // The one re-arming edge: first door-open since authorization.
            self.state.door_latched = false;
            self.state
                .timers
                .door_grace
                .arm(now_ms, self.config.door_grace_ms);
            if self.config.door_restarts_hard_window {
                self.state.timers.hard_off.arm(now_ms, self.config.hard_off_ms);
            }
            sink.emit(&AppEvent::DoorOpened);
            info!("door opened with ignition off, grace window armed");
        }

        // Locked while ignition is off, latch or not.
        io.set_relay_locked(true);
        io.set_led(true);

        if self.state.timers.door_grace.expired(now_ms) {
            return Some(SleepReason::DoorGrace);
        }
        if self.state.timers.hard_off.expired(now_ms) {
            return Some(SleepReason::HardOff);
        }
        None
    }

    // ── Sleep preparation ─────────────────────────────────────

    /// Force safe output levels and latch the terminal outcome.
    fn enter_sleep(
        &mut self,
        reason: SleepReason,
        io: &mut impl OutputPort,
        sink: &mut impl EventSink,
    ) -> TickOutcome {
        io.set_buzzer(false);
        io.set_led(false);
        io.set_relay_locked(true);
        self.pending_sleep = Some(reason);
        sink.emit(&AppEvent::SleepRequested(reason));
        warn!("sleep requested: {}", reason.as_str());
        TickOutcome::Sleep(reason)
    }

    // ── Queries ───────────────────────────────────────────────

    /// Read-only view of the control state.
    #[must_use]
    pub fn state(&self) -> &ControlState {
        &self.state
    }

    /// Total control ticks executed since startup.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// The latched sleep decision, if one was made.
    #[must_use]
    pub fn pending_sleep(&self) -> Option<SleepReason> {
        self.pending_sleep
    }

    /// Live configuration.
    #[must_use]
    pub fn config(&self) -> &AccessConfig {
        &self.config
    }
}
