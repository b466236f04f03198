//! GPIO pin assignments for the MKEY controller board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.
//!
//! All inputs share the same wiring convention: external switch to ground,
//! internal pull-up enabled, so a closed switch reads LOW.

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Piezo buzzer — driven HIGH for the audible confirmation pulse.
pub const BUZZER_GPIO: i32 = 0;
/// Lock relay coil. HIGH = locked (the boot-safe state), LOW = unlocked.
/// The relay must never float: it is driven HIGH before any other output.
pub const RELAY_GPIO: i32 = 2;
/// Auxiliary output 1 — spare, boots LOW.
pub const AUX_OUT1_GPIO: i32 = 3;
/// Auxiliary output 2 — spare, boots LOW.
pub const AUX_OUT2_GPIO: i32 = 4;
/// Presence indicator LED (active HIGH).
pub const LED_GPIO: i32 = 7;

// ---------------------------------------------------------------------------
// Inputs (pull-up, active-low)
// ---------------------------------------------------------------------------

/// Ignition sense. LOW = ignition on.
pub const IGNITION_GPIO: i32 = 1;
/// Door switch. LOW = door open. Also the deep-sleep wake source.
pub const DOOR_GPIO: i32 = 5;
/// Auxiliary input — spare sense line, reported in the advertisement
/// status bitfield.
pub const AUX_IN_GPIO: i32 = 6;

/// Active level for all inputs: the switch pulls the line to ground.
pub const INPUT_ACTIVE_LEVEL: bool = false;

/// True when a raw input level means "switch closed / asserted".
#[inline]
#[must_use]
pub fn input_active(level: bool) -> bool {
    level == INPUT_ACTIVE_LEVEL
}
