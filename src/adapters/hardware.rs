//! Hardware adapter — bridges real GPIO to the domain port traits.
//!
//! Owns the [`OutputBank`] and reads the input pins, exposing both through
//! [`InputPort`] and [`OutputPort`]. This is the only module the control
//! loop reaches hardware through. On non-espidf targets the underlying
//! drivers use cfg-gated simulation stubs.

use crate::app::ports::{InputPort, OutputPort};
use crate::drivers::hw_init;
use crate::drivers::outputs::OutputBank;
use crate::pins;

/// Concrete adapter over the controller's GPIO surface.
pub struct HardwareAdapter {
    outputs: OutputBank,
}

impl HardwareAdapter {
    pub fn new(outputs: OutputBank) -> Self {
        Self { outputs }
    }

    /// Force every output to its boot-safe level.
    pub fn force_safe(&mut self) {
        self.outputs.boot_defaults();
    }

    pub fn outputs(&self) -> &OutputBank {
        &self.outputs
    }
}

// ── InputPort implementation ──────────────────────────────────

impl InputPort for HardwareAdapter {
    fn door_open(&mut self) -> bool {
        pins::input_active(hw_init::gpio_read(pins::DOOR_GPIO))
    }

    fn ignition_on(&mut self) -> bool {
        pins::input_active(hw_init::gpio_read(pins::IGNITION_GPIO))
    }

    fn aux_active(&mut self) -> bool {
        pins::input_active(hw_init::gpio_read(pins::AUX_IN_GPIO))
    }
}

// ── OutputPort implementation ─────────────────────────────────

impl OutputPort for HardwareAdapter {
    fn set_relay_locked(&mut self, locked: bool) {
        self.outputs.set_relay_locked(locked);
    }

    fn set_led(&mut self, on: bool) {
        self.outputs.set_led(on);
    }

    fn set_buzzer(&mut self, on: bool) {
        self.outputs.set_buzzer(on);
    }
}
