//! One-shot GPIO initialization.
//!
//! Configures the input and output pins using raw ESP-IDF sys calls and
//! drives every output to its boot-safe level. Called once from bring-up
//! before the control loop starts. Configuration failures are reported but
//! non-fatal: the loop still runs with whatever hardware accepted config.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot GPIO initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
        }
    }
}

// ── Pin configuration ─────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn init_pins() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the control loop; single-threaded.
    unsafe {
        init_inputs()?;
        init_outputs()?;
    }
    info!("hw_init: pins configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_pins() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): pin config skipped");
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe fn init_inputs() -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: (1u64 << pins::DOOR_GPIO)
            | (1u64 << pins::AUX_IN_GPIO)
            | (1u64 << pins::IGNITION_GPIO),
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    info!("hw_init: inputs configured (door, aux, ignition; pull-up)");
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe fn init_outputs() -> Result<(), HwInitError> {
    // The relay level register is written before the pin becomes an output,
    // so it comes up locked with no unlock glitch.
    unsafe { gpio_set_level(pins::RELAY_GPIO, 1) };

    // INPUT_OUTPUT so the advertisement status bits can sample live levels.
    let cfg = gpio_config_t {
        pin_bit_mask: (1u64 << pins::BUZZER_GPIO)
            | (1u64 << pins::RELAY_GPIO)
            | (1u64 << pins::AUX_OUT1_GPIO)
            | (1u64 << pins::AUX_OUT2_GPIO)
            | (1u64 << pins::LED_GPIO),
        mode: gpio_mode_t_GPIO_MODE_INPUT_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }

    unsafe {
        gpio_set_level(pins::RELAY_GPIO, 1);
        gpio_set_level(pins::BUZZER_GPIO, 0);
        gpio_set_level(pins::AUX_OUT1_GPIO, 0);
        gpio_set_level(pins::AUX_OUT2_GPIO, 0);
        gpio_set_level(pins::LED_GPIO, 0);
    }

    info!("hw_init: outputs configured (relay boots locked)");
    Ok(())
}

// ── Level access ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access on an
    // already-configured pin; safe to call from main context.
    (unsafe { gpio_get_level(pin) }) != 0
}

/// Sim inputs idle HIGH (pull-up, nothing asserted).
#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: i32) -> bool {
    true
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level writes to an already-configured output pin;
    // main-loop context only.
    unsafe {
        gpio_set_level(pin, u32::from(high));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}
