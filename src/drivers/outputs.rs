//! Output bank driver.
//!
//! Thin level-tracking wrapper over the five output pins. Keeps the last
//! commanded level in memory so the advertisement status bits and tests can
//! query it without a hardware readback.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: writes pin levels via hw_init.
//! On host/test: tracks state in-memory only.

use crate::drivers::hw_init;
use crate::pins;

pub struct OutputBank {
    relay_locked: bool,
    led_on: bool,
    buzzer_on: bool,
    aux1_on: bool,
    aux2_on: bool,
}

impl OutputBank {
    /// Construct mirroring the boot-safe levels hw_init established.
    pub fn new() -> Self {
        Self {
            relay_locked: true,
            led_on: false,
            buzzer_on: false,
            aux1_on: false,
            aux2_on: false,
        }
    }

    /// Re-assert every boot-safe level (relay locked, everything else off).
    pub fn boot_defaults(&mut self) {
        self.set_relay_locked(true);
        self.set_buzzer(false);
        self.set_led(false);
        self.set_aux(false, false);
    }

    /// Relay is active-high locked.
    pub fn set_relay_locked(&mut self, locked: bool) {
        hw_init::gpio_write(pins::RELAY_GPIO, locked);
        self.relay_locked = locked;
    }

    pub fn set_led(&mut self, on: bool) {
        hw_init::gpio_write(pins::LED_GPIO, on);
        self.led_on = on;
    }

    pub fn set_buzzer(&mut self, on: bool) {
        hw_init::gpio_write(pins::BUZZER_GPIO, on);
        self.buzzer_on = on;
    }

    pub fn set_aux(&mut self, aux1: bool, aux2: bool) {
        hw_init::gpio_write(pins::AUX_OUT1_GPIO, aux1);
        hw_init::gpio_write(pins::AUX_OUT2_GPIO, aux2);
        self.aux1_on = aux1;
        self.aux2_on = aux2;
    }

    pub fn relay_locked(&self) -> bool {
        self.relay_locked
    }

    pub fn led_on(&self) -> bool {
        self.led_on
    }

    pub fn buzzer_on(&self) -> bool {
        self.buzzer_on
    }
}

impl Default for OutputBank {
    fn default() -> Self {
        Self::new()
    }
}
