//! Deep-sleep supervisor.
//!
//! The control loop decides *when* to sleep (scan-cycle budget, door-grace
//! window, hard ignition-off window); this module owns *how*: identifying
//! the wake cause at boot, arming the door switch as the wake source, and
//! performing the terminal descent into deep sleep.
//!
//! Wake wiring: the door switch pulls its line LOW, so EXT1 is armed in
//! all-low mode on that single pin. A door opening near the vehicle wakes
//! the controller; everything else stays asleep.

use log::{info, warn};

use crate::app::service::SleepReason;
use crate::config::AccessConfig;
use crate::pins;

// ───────────────────────────────────────────────────────────────
// Wake reason
// ───────────────────────────────────────────────────────────────

/// Why the chip is running right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeReason {
    /// Cold boot or reset; not a deep-sleep wake.
    PowerOn,
    /// EXT1 wake: the door switch closed while asleep.
    DoorWake,
    /// Timer wake (not currently armed; kept for field diagnostics).
    TimerWake,
    /// Any other ESP-IDF wakeup cause, raw value attached.
    Other(u32),
}

// ───────────────────────────────────────────────────────────────
// Power manager
// ───────────────────────────────────────────────────────────────

/// Owns the sleep/wake edge of the firmware lifecycle.
pub struct PowerManager {
    /// Delay before `esp_deep_sleep_start`, lets UART output flush.
    settle_ms: u32,
}

impl PowerManager {
    pub fn new(config: &AccessConfig) -> Self {
        Self {
            settle_ms: config.sleep_settle_ms,
        }
    }

    /// Classify this boot. Called once during bring-up, before the log
    /// banner, so the first lines already say why we are awake.
    #[cfg(target_os = "espidf")]
    pub fn determine_wake_reason(&self) -> WakeReason {
        use esp_idf_svc::sys::*;
        // SAFETY: reads a value latched by the ROM bootloader; no
        // preconditions.
        let cause = unsafe { esp_sleep_get_wakeup_cause() };
        match cause {
            esp_sleep_source_t_ESP_SLEEP_WAKEUP_UNDEFINED => WakeReason::PowerOn,
            esp_sleep_source_t_ESP_SLEEP_WAKEUP_EXT1 => WakeReason::DoorWake,
            esp_sleep_source_t_ESP_SLEEP_WAKEUP_TIMER => WakeReason::TimerWake,
            other => WakeReason::Other(other as u32),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn determine_wake_reason(&self) -> WakeReason {
        WakeReason::PowerOn
    }

    /// Arm the door switch as the EXT1 wake source. Failure is logged and
    /// tolerated: the controller still sleeps, it just will not wake on the
    /// door (power-cycle recovers it).
    #[cfg(target_os = "espidf")]
    pub fn arm_door_wake(&self) {
        use esp_idf_svc::sys::*;
        let mask = 1u64 << pins::DOOR_GPIO;
        // SAFETY: the pin number is a valid RTC-capable GPIO on this board;
        // the call only latches wake configuration.
        let rc = unsafe {
            esp_sleep_enable_ext1_wakeup(mask, esp_sleep_ext1_wakeup_mode_t_ESP_EXT1_WAKEUP_ALL_LOW)
        };
        if rc != ESP_OK as i32 {
            warn!("power: door wake arm failed (rc={}), sleep will be terminal", rc);
        } else {
            info!("power: door wake armed (gpio {}, all-low)", pins::DOOR_GPIO);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn arm_door_wake(&self) {
        info!("power(sim): door wake armed (gpio {})", pins::DOOR_GPIO);
    }

    /// Terminal descent: settle so the reason line reaches the wire, then
    /// cut over to deep sleep. On the target this does not return; the
    /// simulation logs and falls through so tests can assert the path.
    pub fn enter_deep_sleep(&self, reason: SleepReason) {
        warn!(
            "power: entering deep sleep ({}), settle {} ms",
            reason.as_str(),
            self.settle_ms
        );
        std::thread::sleep(std::time::Duration::from_millis(u64::from(self.settle_ms)));
        self.platform_deep_sleep();
    }

    #[cfg(target_os = "espidf")]
    fn platform_deep_sleep(&self) {
        self.arm_door_wake();
        // SAFETY: terminal call; the chip powers down digital logic and
        // restarts through the bootloader on wake.
        unsafe {
            esp_idf_svc::sys::esp_deep_sleep_start();
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_deep_sleep(&self) {
        self.arm_door_wake();
        info!("power(sim): deep sleep entered (process continues)");
    }
}
