//! Mock I/O adapter for integration tests.
//!
//! Records every output write so tests can assert on the full actuation
//! history without touching real GPIO registers.

use mkey::app::events::AppEvent;
use mkey::app::ports::{EventSink, InputPort, OutputPort};

// ── Output call record ────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputCall {
    RelayLocked(bool),
    Led(bool),
    Buzzer(bool),
}

// ── MockIo ────────────────────────────────────────────────────

/// Settable input levels plus the complete output write history.
pub struct MockIo {
    pub door_open: bool,
    pub ignition_on: bool,
    pub aux_active: bool,
    pub calls: Vec<OutputCall>,
}

#[allow(dead_code)]
impl MockIo {
    pub fn new() -> Self {
        Self {
            door_open: false,
            ignition_on: false,
            aux_active: false,
            calls: Vec::new(),
        }
    }

    /// Last commanded relay level. The relay boots locked, so an empty
    /// history reads as locked.
    pub fn relay_locked(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                OutputCall::RelayLocked(locked) => Some(*locked),
                _ => None,
            })
            .unwrap_or(true)
    }

    pub fn led_on(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                OutputCall::Led(on) => Some(*on),
                _ => None,
            })
            .unwrap_or(false)
    }

    pub fn buzzer_on(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                OutputCall::Buzzer(on) => Some(*on),
                _ => None,
            })
            .unwrap_or(false)
    }

    /// Count of off→on buzzer edges in the history — the number of distinct
    /// audible pulses, regardless of how often the level was re-asserted.
    pub fn buzzer_pulses(&self) -> usize {
        let mut pulses = 0;
        let mut level = false;
        for call in &self.calls {
            if let OutputCall::Buzzer(on) = call {
                if *on && !level {
                    pulses += 1;
                }
                level = *on;
            }
        }
        pulses
    }

    /// True if the relay was ever commanded unlocked.
    pub fn ever_unlocked(&self) -> bool {
        self.calls.contains(&OutputCall::RelayLocked(false))
    }
}

impl Default for MockIo {
    fn default() -> Self {
        Self::new()
    }
}

impl InputPort for MockIo {
    fn door_open(&mut self) -> bool {
        self.door_open
    }

    fn ignition_on(&mut self) -> bool {
        self.ignition_on
    }

    fn aux_active(&mut self) -> bool {
        self.aux_active
    }
}

impl OutputPort for MockIo {
    fn set_relay_locked(&mut self, locked: bool) {
        self.calls.push(OutputCall::RelayLocked(locked));
    }

    fn set_led(&mut self, on: bool) {
        self.calls.push(OutputCall::Led(on));
    }

    fn set_buzzer(&mut self, on: bool) {
        self.calls.push(OutputCall::Buzzer(on));
    }
}

// ── RecordingSink ─────────────────────────────────────────────

/// Records emitted [`AppEvent`]s in order for sequence assertions.
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}
