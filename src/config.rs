//! System configuration parameters
//!
//! All tunable parameters for the MKEY controller. Values are fixed per
//! device class — there is no runtime provisioning surface — but they live in
//! one serializable struct so the active set can be logged at boot and so
//! tests can build variants.

use serde::{Deserialize, Serialize};

use crate::beacon::{BeaconId, KnownBeacon};
use crate::error::ConfigError;

/// Core controller configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfig {
    // --- Control loop timing ---
    /// Control loop tick period (milliseconds)
    pub tick_interval_ms: u32,
    /// Task watchdog timeout (milliseconds); fed every tick
    pub watchdog_timeout_ms: u32,

    // --- Beacon presence ---
    /// Silence after the last accepted beacon before presence is dropped (ms)
    pub beacon_stale_ms: u64,
    /// Audible confirmation pulse on beacon acceptance (ms)
    pub buzzer_pulse_ms: u64,
    /// Known beacon identities with per-identity RSSI floors
    pub known_beacons: heapless::Vec<KnownBeacon, 4>,

    // --- Low-power accounting ---
    /// Synthetic scan tick period when the radio stalls (ms)
    pub scan_tick_ms: u64,
    /// Scan cycles while unauthorized before forcing deep sleep
    pub scan_cycle_limit: u32,

    // --- Ignition-off sleep windows ---
    /// Sleep this long after the door opens with ignition off (ms)
    pub door_grace_ms: u64,
    /// Sleep this long after ignition off regardless of the door (ms)
    pub hard_off_ms: u64,
    /// Legacy behavior: the door-open edge also restarts the hard window.
    /// The redesigned default keeps the hard clock anchored at ignition-off.
    pub door_restarts_hard_window: bool,

    // --- Power ---
    /// Settle delay before deep-sleep entry, lets log output flush (ms)
    pub sleep_settle_ms: u32,
}

impl Default for AccessConfig {
    fn default() -> Self {
        let mut known_beacons = heapless::Vec::new();
        // Device-class fixtures; per-install tables replace these addresses.
        let _ = known_beacons.push(KnownBeacon {
            id: BeaconId::Device1,
            addr: [0x58, 0x2D, 0x34, 0x3B, 0x1A, 0x7C],
            rssi_min: -120,
        });
        let _ = known_beacons.push(KnownBeacon {
            id: BeaconId::Device2,
            addr: [0xE8, 0x9F, 0x6D, 0x20, 0x4C, 0x11],
            rssi_min: -120,
        });

        Self {
            // Control loop timing
            tick_interval_ms: 10,      // 100 Hz
            watchdog_timeout_ms: 10_000,

            // Beacon presence
            beacon_stale_ms: 5_000,
            buzzer_pulse_ms: 50,
            known_beacons,

            // Low-power accounting
            scan_tick_ms: 1_000,       // 1 Hz
            scan_cycle_limit: 250,     // ≈ 250 s unauthorized

            // Ignition-off sleep windows
            door_grace_ms: 30 * 1_000,
            hard_off_ms: 10 * 60 * 1_000,
            door_restarts_hard_window: false,

            // Power
            sleep_settle_ms: 500,
        }
    }
}

impl AccessConfig {
    /// Reject value combinations the control loop cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("tick_interval_ms"));
        }
        if self.watchdog_timeout_ms == 0 {
            return Err(ConfigError::ZeroInterval("watchdog_timeout_ms"));
        }
        if self.scan_tick_ms == 0 {
            return Err(ConfigError::ZeroInterval("scan_tick_ms"));
        }
        if self.scan_cycle_limit == 0 {
            return Err(ConfigError::ZeroInterval("scan_cycle_limit"));
        }
        if self.beacon_stale_ms <= u64::from(self.tick_interval_ms) {
            return Err(ConfigError::StaleWindowTooShort);
        }
        if self.door_grace_ms > self.hard_off_ms {
            return Err(ConfigError::GraceExceedsHardWindow);
        }
        if self.known_beacons.is_empty() {
            return Err(ConfigError::NoKnownBeacons);
        }
        Ok(())
    }

    /// RSSI floor for an identity, if it is in the known-beacon table.
    #[must_use]
    pub fn rssi_floor(&self, id: BeaconId) -> Option<i8> {
        self.known_beacons
            .iter()
            .find(|kb| kb.id == id)
            .map(|kb| kb.rssi_min)
    }
}
