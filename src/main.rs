//! MKEY Firmware — Main Entry Point
//!
//! Hexagonal architecture with a fixed-period control task and terminal
//! deep sleep.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter    LogEventSink     RadioSource               │
//! │  (Input+Output)     (EventSink)      (Bluedroid GAP)           │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            AccessService (pure logic)                  │    │
//! │  │  beacon acceptance · staleness · sleep windows         │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Controller (tick pacing) · PowerManager (sleep/wake edge)     │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Module declarations ───────────────────────────────────────
pub mod app;
pub mod config;
mod beacon;
mod controller;
mod error;
mod events;
mod pins;
mod power;
mod timers;

mod adapters;
mod drivers;

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use log::{error, info, warn};

use config::AccessConfig;
use power::{PowerManager, WakeReason};

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  MKEY v{}                         ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration snapshot ─────────────────────────────
    let config = AccessConfig::default();
    match serde_json::to_string(&config) {
        Ok(json) => info!("config: {}", json),
        Err(e) => warn!("config: snapshot failed ({})", e),
    }

    // ── 3. Wake reason ────────────────────────────────────────
    let power_mgr = PowerManager::new(&config);
    match power_mgr.determine_wake_reason() {
        WakeReason::PowerOn => info!("Boot: power-on"),
        WakeReason::DoorWake => info!("Boot: door switch wake from deep sleep"),
        other => info!("Boot: {:?}", other),
    }

    // ── 4. Controller bring-up ────────────────────────────────
    let mut controller = match controller::init(config) {
        Ok(c) => c,
        Err(e) => {
            error!("controller init failed: {} — not starting", e);
            anyhow::bail!("controller init failed: {e}");
        }
    };

    info!("System ready. Entering control task.");

    // ── 5. Control task ───────────────────────────────────────
    let reason = controller.run();

    // ── 6. Terminal descent ───────────────────────────────────
    // Does not return on hardware; the next boot re-runs main().
    power_mgr.enter_deep_sleep(reason);
    Ok(())
}
