//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! Tests swap in a recording sink implementing the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started => {
                info!("START | access controller ready");
            }
            AppEvent::BeaconAccepted { id, rssi } => {
                info!("AUTH | beacon accepted: {} rssi={}dBm", id.as_str(), rssi);
            }
            AppEvent::PresenceLost => {
                info!("AUTH | presence lost, outputs secured");
            }
            AppEvent::IgnitionOn => {
                info!("IGN | on");
            }
            AppEvent::IgnitionOff => {
                info!("IGN | off");
            }
            AppEvent::DoorOpened => {
                info!("DOOR | opened");
            }
            AppEvent::SleepRequested(reason) => {
                warn!("SLEEP | requested: {}", reason.as_str());
            }
        }
    }
}
