//! MKEY firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod beacon;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod pins;
pub mod power;
pub mod timers;

// Hardware-facing modules; the actual implementations are guarded by cfg
// attributes inside, with simulation stubs for host builds.
pub mod adapters;
pub mod drivers;
