//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements | Connects to                |
//! |------------|------------|----------------------------|
//! | `ble`      | EventChannel producer | Bluedroid GAP   |
//! | `hardware` | InputPort  | ESP32 GPIO inputs          |
//! |            | OutputPort | ESP32 GPIO outputs         |
//! | `log_sink` | EventSink  | Serial log output          |
//! | `time`     | —          | ESP32 high-resolution timer|

pub mod ble;
pub mod hardware;
pub mod log_sink;
pub mod time;
