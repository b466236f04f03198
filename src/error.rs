//! Unified error types for the MKEY firmware.
//!
//! A single `Error` enum that every fallible subsystem converts into, keeping
//! the bring-up path's error handling uniform. All variants are `Copy` so they
//! can be passed around without allocation. Beacon rejections are not errors —
//! they are logged and dropped inside the acceptance algorithm.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Radio bring-up or lifecycle call failed.
    Radio(RadioError),
    /// Configuration values failed validation.
    Config(ConfigError),
    /// Controller initialisation failed.
    Init(InitError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Radio(e) => write!(f, "radio: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Init(e) => write!(f, "init: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Radio errors
// ---------------------------------------------------------------------------

/// BLE stack call failures. The `i32` payload is the raw ESP-IDF return code.
///
/// Start failures are transient: the lifecycle restarts the affected role on
/// its next terminal event, so callers log these rather than abort (except
/// during initial bring-up, where `Stack`/`Register` failures are fatal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// Controller or host stack init/enable failed.
    Stack(i32),
    /// GAP callback registration failed.
    Register(i32),
    /// Advertisement or scan-response payload rejected.
    AdvConfig(i32),
    /// Advertising start rejected.
    AdvStart(i32),
    /// Scan parameter set rejected.
    ScanConfig(i32),
    /// Scan start rejected.
    ScanStart(i32),
}

impl fmt::Display for RadioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stack(rc) => write!(f, "stack init failed (rc={rc})"),
            Self::Register(rc) => write!(f, "GAP callback registration failed (rc={rc})"),
            Self::AdvConfig(rc) => write!(f, "adv payload config failed (rc={rc})"),
            Self::AdvStart(rc) => write!(f, "advertising start failed (rc={rc})"),
            Self::ScanConfig(rc) => write!(f, "scan param config failed (rc={rc})"),
            Self::ScanStart(rc) => write!(f, "scan start failed (rc={rc})"),
        }
    }
}

impl From<RadioError> for Error {
    fn from(e: RadioError) -> Self {
        Self::Radio(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A timing field that must be non-zero is zero.
    ZeroInterval(&'static str),
    /// The beacon stale window is not longer than the control tick.
    StaleWindowTooShort,
    /// The door-grace window exceeds the hard-off window.
    GraceExceedsHardWindow,
    /// The known-beacon table is empty; nothing could ever authorize.
    NoKnownBeacons,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroInterval(field) => write!(f, "{field} must be non-zero"),
            Self::StaleWindowTooShort => {
                write!(f, "beacon stale window must exceed the control tick")
            }
            Self::GraceExceedsHardWindow => {
                write!(f, "door-grace window must not exceed the hard-off window")
            }
            Self::NoKnownBeacons => write!(f, "known-beacon table is empty"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Initialisation errors
// ---------------------------------------------------------------------------

/// Startup failures that leave the controller not running. Pin configuration
/// problems are deliberately absent: those are logged and the controller
/// continues in degraded mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    /// `init` was called a second time.
    AlreadyInitialized,
    /// Radio stack bring-up failed; discovery would never produce events.
    Radio(RadioError),
    /// Configuration rejected before any hardware was touched.
    Config(ConfigError),
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyInitialized => write!(f, "controller already initialised"),
            Self::Radio(e) => write!(f, "radio bring-up: {e}"),
            Self::Config(e) => write!(f, "bad configuration: {e}"),
        }
    }
}

impl From<RadioError> for InitError {
    fn from(e: RadioError) -> Self {
        Self::Radio(e)
    }
}

impl From<ConfigError> for InitError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<InitError> for Error {
    fn from(e: InitError) -> Self {
        Self::Init(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
