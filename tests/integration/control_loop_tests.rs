//! Integration tests for the access control loop.
//!
//! These drive [`AccessService`] tick by tick with an owned event channel,
//! synthetic monotonic time and the recording I/O mock, and verify the
//! beacon-acceptance, staleness, sleep-window and low-power policies
//! end to end. No real clock or hardware is involved.

use crate::mock_hw::{MockIo, OutputCall, RecordingSink};

use mkey::app::events::AppEvent;
use mkey::app::service::{AccessService, SleepReason, TickOutcome};
use mkey::beacon::{BeaconEvent, BeaconId};
use mkey::config::AccessConfig;
use mkey::events::EventChannel;

fn make_loop() -> (AccessService, EventChannel, MockIo, RecordingSink) {
    let mut service = AccessService::new(AccessConfig::default());
    let channel = EventChannel::new();
    let io = MockIo::new();
    let mut sink = RecordingSink::new();
    service.start(&mut sink);
    (service, channel, io, sink)
}

fn fob(rssi: i8) -> BeaconEvent {
    BeaconEvent {
        id: BeaconId::Device1,
        rssi,
        metadata_ok: true,
    }
}

fn accepted_count(sink: &RecordingSink) -> usize {
    sink.events
        .iter()
        .filter(|e| matches!(e, AppEvent::BeaconAccepted { .. }))
        .count()
}

fn sleep_request_count(sink: &RecordingSink) -> usize {
    sink.events
        .iter()
        .filter(|e| matches!(e, AppEvent::SleepRequested(_)))
        .count()
}

// ── Beacon validation ─────────────────────────────────────────

#[test]
fn tokenless_beacons_never_authorize() {
    let (mut svc, ch, mut io, mut sink) = make_loop();

    for k in 0..20u64 {
        ch.notify_beacon(BeaconEvent {
            id: BeaconId::Device1,
            rssi: -30, // plenty of signal, payload is what fails
            metadata_ok: false,
        });
        let outcome = svc.tick(k * 100, &ch, &mut io, &mut sink);
        assert_eq!(outcome, TickOutcome::Running);
        assert!(!svc.state().authorized);
    }

    assert!(io.relay_locked());
    assert!(!io.ever_unlocked(), "relay must never open for a tokenless frame");
    assert_eq!(accepted_count(&sink), 0);
}

#[test]
fn below_floor_beacons_never_authorize() {
    let mut config = AccessConfig::default();
    config.known_beacons[0].rssi_min = -70;
    let mut svc = AccessService::new(config);
    let ch = EventChannel::new();
    let mut io = MockIo::new();
    let mut sink = RecordingSink::new();
    svc.start(&mut sink);

    ch.notify_beacon(fob(-71));
    svc.tick(0, &ch, &mut io, &mut sink);
    assert!(!svc.state().authorized, "one dB below the floor must be rejected");
    assert!(!io.ever_unlocked());

    // The floor itself is accepted.
    ch.notify_beacon(fob(-70));
    svc.tick(10, &ch, &mut io, &mut sink);
    assert!(svc.state().authorized);
    assert_eq!(accepted_count(&sink), 1);
}

// ── Staleness ─────────────────────────────────────────────────

#[test]
fn presence_expires_after_stale_window() {
    let (mut svc, ch, mut io, mut sink) = make_loop();
    io.ignition_on = true;

    ch.notify_beacon(fob(-50));
    svc.tick(0, &ch, &mut io, &mut sink);
    assert!(svc.state().authorized);
    assert!(!io.relay_locked(), "presence with ignition on should unlock");

    // Just inside the window the beacon is still considered present.
    assert_eq!(svc.tick(4_999, &ch, &mut io, &mut sink), TickOutcome::Running);
    assert!(svc.state().authorized);
    assert!(!io.relay_locked());

    // At exactly the stale window presence drops and the outputs secure.
    svc.tick(5_000, &ch, &mut io, &mut sink);
    assert!(!svc.state().authorized);
    assert!(io.relay_locked());
    assert!(!io.led_on());
    assert!(sink.contains(&AppEvent::PresenceLost));
}

#[test]
fn fresh_session_after_staleness_pulses_again() {
    let (mut svc, ch, mut io, mut sink) = make_loop();

    ch.notify_beacon(fob(-50));
    svc.tick(0, &ch, &mut io, &mut sink);
    svc.tick(5_000, &ch, &mut io, &mut sink);
    assert!(!svc.state().authorized);

    // Coming back into range is a new session: announced and chirped again.
    ch.notify_beacon(fob(-48));
    svc.tick(6_000, &ch, &mut io, &mut sink);
    assert!(svc.state().authorized);
    assert_eq!(accepted_count(&sink), 2);
    assert_eq!(io.buzzer_pulses(), 2);
}

// ── Door-grace window ─────────────────────────────────────────

#[test]
fn door_grace_runs_from_door_open_instant() {
    let (mut svc, ch, mut io, mut sink) = make_loop();

    // Ignition stays off; the fob refreshes presence once a second.
    ch.notify_beacon(fob(-50));
    svc.tick(0, &ch, &mut io, &mut sink);
    assert!(svc.state().authorized);
    assert!(io.relay_locked(), "ignition off keeps the relay locked even while present");

    for t in (1_000..=9_000).step_by(1_000) {
        ch.notify_beacon(fob(-50));
        assert_eq!(svc.tick(t, &ch, &mut io, &mut sink), TickOutcome::Running);
    }

    // Door opens at 10 s: the 30 s grace window runs from here.
    io.door_open = true;
    ch.notify_beacon(fob(-50));
    svc.tick(10_000, &ch, &mut io, &mut sink);
    assert!(sink.contains(&AppEvent::DoorOpened));
    io.door_open = false;

    // Closing the door (11 s) and re-opening it (20 s) must not move the
    // window — the door edge is one-shot per presence session.
    for t in (11_000..40_000).step_by(1_000) {
        io.door_open = (20_000..=21_000).contains(&t);
        ch.notify_beacon(fob(-50));
        assert_eq!(
            svc.tick(t, &ch, &mut io, &mut sink),
            TickOutcome::Running,
            "grace must not fire before 40 s (t={t})"
        );
    }
    let door_events = sink
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::DoorOpened))
        .count();
    assert_eq!(door_events, 1, "re-opening must not be a second edge");

    // 30 s after the door-open instant, not after ignition-off at t=0.
    ch.notify_beacon(fob(-50));
    assert_eq!(
        svc.tick(40_000, &ch, &mut io, &mut sink),
        TickOutcome::Sleep(SleepReason::DoorGrace)
    );
    assert!(io.relay_locked());
    assert!(!io.led_on());
    assert!(!io.buzzer_on());
}

// ── Hard ceiling ──────────────────────────────────────────────

#[test]
fn hard_ceiling_fires_despite_refreshes() {
    let (mut svc, ch, mut io, mut sink) = make_loop();

    // Ignition off, door never opens, fob parked in range the whole time.
    ch.notify_beacon(fob(-50));
    svc.tick(0, &ch, &mut io, &mut sink);

    let mut fired = None;
    for t in (1_000..=601_000).step_by(1_000) {
        ch.notify_beacon(fob(-50));
        if let TickOutcome::Sleep(reason) = svc.tick(t, &ch, &mut io, &mut sink) {
            fired = Some((t, reason));
            break;
        }
    }
    assert_eq!(
        fired,
        Some((600_000, SleepReason::HardOff)),
        "refreshes keep presence but must not defer the hard ceiling"
    );
    assert_eq!(sleep_request_count(&sink), 1);

    // Terminal: later ticks replay the outcome without running the policy.
    let calls_before = io.calls.len();
    let ticks_before = svc.tick_count();
    assert_eq!(
        svc.tick(601_000, &ch, &mut io, &mut sink),
        TickOutcome::Sleep(SleepReason::HardOff)
    );
    assert_eq!(svc.tick_count(), ticks_before);
    assert_eq!(io.calls.len(), calls_before);
    assert_eq!(sleep_request_count(&sink), 1);
}

#[test]
fn ignition_on_defers_sleep_indefinitely() {
    let (mut svc, ch, mut io, mut sink) = make_loop();
    io.ignition_on = true;

    ch.notify_beacon(fob(-50));
    svc.tick(0, &ch, &mut io, &mut sink);
    assert!(!io.relay_locked());

    // Well past the hard window: still running, because ignition is on.
    for t in (1_000..=700_000).step_by(1_000) {
        ch.notify_beacon(fob(-50));
        assert_eq!(svc.tick(t, &ch, &mut io, &mut sink), TickOutcome::Running);
    }

    // Ignition off re-anchors the hard window at the off instant.
    io.ignition_on = false;
    let mut fired = None;
    for t in (701_000..=1_400_000).step_by(1_000) {
        ch.notify_beacon(fob(-50));
        if let TickOutcome::Sleep(reason) = svc.tick(t, &ch, &mut io, &mut sink) {
            fired = Some((t, reason));
            break;
        }
    }
    assert_eq!(fired, Some((1_301_000, SleepReason::HardOff)));
    assert!(sink.contains(&AppEvent::IgnitionOff));
    assert!(io.relay_locked());
}

// ── Redesign flag: door edge vs hard window ───────────────────
//
// With equal grace and hard windows the flag becomes observable: anchored
// hard clock fires at its original deadline, restarted hard clock defers
// to the door-open instant and the grace window wins instead.

fn long_grace_config(door_restarts_hard_window: bool) -> AccessConfig {
    AccessConfig {
        door_grace_ms: 600_000,
        hard_off_ms: 600_000,
        door_restarts_hard_window,
        ..AccessConfig::default()
    }
}

fn run_door_at_300s(config: AccessConfig) -> (u64, SleepReason) {
    let mut svc = AccessService::new(config);
    let ch = EventChannel::new();
    let mut io = MockIo::new();
    let mut sink = RecordingSink::new();
    svc.start(&mut sink);

    ch.notify_beacon(fob(-50));
    svc.tick(0, &ch, &mut io, &mut sink);

    for t in (1_000..=1_000_000).step_by(1_000) {
        io.door_open = t == 300_000;
        ch.notify_beacon(fob(-50));
        if let TickOutcome::Sleep(reason) = svc.tick(t, &ch, &mut io, &mut sink) {
            return (t, reason);
        }
    }
    panic!("no sleep decision within 1000 s");
}

#[test]
fn door_open_leaves_hard_window_anchored_by_default() {
    let (t, reason) = run_door_at_300s(long_grace_config(false));
    assert_eq!((t, reason), (600_000, SleepReason::HardOff));
}

#[test]
fn legacy_flag_restarts_hard_window_on_door_open() {
    let (t, reason) = run_door_at_300s(long_grace_config(true));
    assert_eq!((t, reason), (900_000, SleepReason::DoorGrace));
}

// ── Low-power budget ──────────────────────────────────────────

#[test]
fn scan_budget_sleeps_once_via_explicit_ticks() {
    let (mut svc, ch, mut io, mut sink) = make_loop();

    let mut outcome = TickOutcome::Running;
    for k in 0..250u64 {
        ch.notify_scan_cycle();
        outcome = svc.tick(k * 10, &ch, &mut io, &mut sink);
        if k < 249 {
            assert_eq!(outcome, TickOutcome::Running, "budget not exhausted at cycle {k}");
        }
    }
    assert_eq!(outcome, TickOutcome::Sleep(SleepReason::ScanLimit));
    assert_eq!(svc.state().scan_cycles, 250);

    // Outputs forced safe, and the relay never opened along the way.
    assert!(io.relay_locked());
    assert!(!io.led_on());
    assert!(!io.buzzer_on());
    assert!(!io.ever_unlocked());
    assert_eq!(sleep_request_count(&sink), 1);

    let ticks = svc.tick_count();
    assert_eq!(
        svc.tick(9_999, &ch, &mut io, &mut sink),
        TickOutcome::Sleep(SleepReason::ScanLimit)
    );
    assert_eq!(svc.tick_count(), ticks, "terminal outcome must not re-run the policy");
}

#[test]
fn scan_budget_sleeps_via_synthetic_ticks() {
    let (mut svc, ch, mut io, mut sink) = make_loop();

    // No radio events at all: the synthetic 1 Hz fallback carries the
    // budget on its own.
    svc.tick(0, &ch, &mut io, &mut sink); // anchors the synthetic clock
    assert_eq!(svc.state().scan_cycles, 0);

    for t in (1_000..250_000).step_by(1_000) {
        assert_eq!(svc.tick(t, &ch, &mut io, &mut sink), TickOutcome::Running);
    }
    assert_eq!(svc.state().scan_cycles, 249);

    assert_eq!(
        svc.tick(250_000, &ch, &mut io, &mut sink),
        TickOutcome::Sleep(SleepReason::ScanLimit)
    );
    assert_eq!(sleep_request_count(&sink), 1);
}

// ── Idempotent acceptance ─────────────────────────────────────

#[test]
fn accepted_refresh_is_idempotent() {
    let (mut svc, ch, mut io, mut sink) = make_loop();

    ch.notify_beacon(fob(-50));
    svc.tick(0, &ch, &mut io, &mut sink);
    ch.notify_beacon(fob(-50)); // immediate duplicate
    svc.tick(10, &ch, &mut io, &mut sink);

    assert!(svc.state().authorized);
    assert_eq!(accepted_count(&sink), 1, "a refresh is not a new announcement");

    // One pulse of the defined duration, no extension from the duplicate.
    assert!(io.buzzer_on());
    svc.tick(49, &ch, &mut io, &mut sink);
    assert!(io.buzzer_on());
    svc.tick(50, &ch, &mut io, &mut sink);
    assert!(!io.buzzer_on(), "pulse ends at 50 ms");

    // Later refreshes while authorized stay silent.
    ch.notify_beacon(fob(-50));
    svc.tick(60, &ch, &mut io, &mut sink);
    assert!(!io.buzzer_on());
    assert_eq!(io.buzzer_pulses(), 1);
}

// ── Event choreography ────────────────────────────────────────

#[test]
fn door_grace_shutdown_emits_the_expected_sequence() {
    let (mut svc, ch, mut io, mut sink) = make_loop();

    ch.notify_beacon(fob(-50));
    svc.tick(0, &ch, &mut io, &mut sink);

    io.door_open = true;
    ch.notify_beacon(fob(-50));
    svc.tick(1_000, &ch, &mut io, &mut sink);
    io.door_open = false;

    for t in (2_000..31_000).step_by(1_000) {
        ch.notify_beacon(fob(-50));
        svc.tick(t, &ch, &mut io, &mut sink);
    }
    ch.notify_beacon(fob(-50));
    assert_eq!(
        svc.tick(31_000, &ch, &mut io, &mut sink),
        TickOutcome::Sleep(SleepReason::DoorGrace)
    );

    assert_eq!(
        sink.events,
        vec![
            AppEvent::Started,
            AppEvent::BeaconAccepted {
                id: BeaconId::Device1,
                rssi: -50
            },
            AppEvent::DoorOpened,
            AppEvent::SleepRequested(SleepReason::DoorGrace),
        ]
    );
}

// ── Output discipline while unauthorized ──────────────────────

#[test]
fn unauthorized_loop_keeps_outputs_secured() {
    let (mut svc, ch, mut io, mut sink) = make_loop();
    io.door_open = true;
    io.ignition_on = true; // inputs alone must never unlock anything

    for t in (0..60_000).step_by(500) {
        ch.notify_scan_cycle();
        svc.tick(t, &ch, &mut io, &mut sink);
        assert!(!svc.state().authorized);
        assert!(io.relay_locked());
        assert!(!io.led_on());
    }
    assert!(!io.calls.contains(&OutputCall::Led(true)));
    assert!(!io.ever_unlocked());
}
