//! Beacon identities and discovery events.
//!
//! A beacon is a proximity credential: a BLE advertiser whose public address
//! is listed in the known-beacon table and whose manufacturer payload carries
//! the authentication token. The scanner produces one [`BeaconEvent`] per
//! qualifying discovery; the control loop consumes it exactly once.

use core::fmt::Write as _;

use serde::{Deserialize, Serialize};

/// ASCII token the fob embeds at the end of its manufacturer-specific data.
/// Some fobs prefix a 2-byte company identifier, some emit the bare token,
/// so matching is suffix-based.
pub const AUTH_TOKEN: &[u8] = b"&H123$";

/// The closed set of beacon identities this device class accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeaconId {
    /// Primary fob (typically the owner's phone).
    Device1,
    /// Secondary fob (spare tag).
    Device2,
}

impl BeaconId {
    /// Short name for log lines.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Device1 => "device1",
            Self::Device2 => "device2",
        }
    }
}

/// One qualifying discovery, produced by the scanner, consumed once by the
/// control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeaconEvent {
    /// Which fob was seen.
    pub id: BeaconId,
    /// Signal strength reported by the scan, dBm.
    pub rssi: i8,
    /// True when the manufacturer payload carried the auth token.
    pub metadata_ok: bool,
}

/// One entry of the known-beacon table: identity, public address, and the
/// per-identity RSSI acceptance floor. Fixed at init.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownBeacon {
    pub id: BeaconId,
    /// Public BDA, printable byte order.
    pub addr: [u8; 6],
    /// Discoveries weaker than this are rejected.
    pub rssi_min: i8,
}

impl KnownBeacon {
    #[must_use]
    pub fn matches(&self, addr: &[u8; 6]) -> bool {
        self.addr == *addr
    }
}

/// True when a manufacturer-specific AD value authenticates as a fob.
#[must_use]
pub fn payload_token_ok(mfg: &[u8]) -> bool {
    mfg.ends_with(AUTH_TOKEN)
}

/// Colon-separated address for log lines.
#[must_use]
pub fn fmt_addr(addr: &[u8; 6]) -> heapless::String<17> {
    let mut s = heapless::String::new();
    for (i, b) in addr.iter().enumerate() {
        if i > 0 {
            let _ = s.push(':');
        }
        let _ = write!(s, "{b:02X}");
    }
    s
}
