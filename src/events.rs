//! Bounded event channel between the radio context and the control loop.
//!
//! Events are produced by the BLE stack's callback context (discovery
//! results, scan-cycle completions) and consumed by the control loop, one
//! drain per tick. Enqueue is non-blocking drop-on-full: the radio context
//! must never stall, and a dropped event is recovered by the next synthetic
//! or staleness tick anyway.
//!
//! ```text
//! ┌──────────────────┐  BeaconEvent  ┌───────────────┐
//! │ BLE GAP callback │──────────────▶│               │
//! │  (radio context) │   ScanTick    │  Control Loop │
//! │                  │──────────────▶│  (consumer)   │
//! └──────────────────┘               └───────────────┘
//! ```
//!
//! The firmware uses the single [`EVENT_CHANNEL`] static (BLE callbacks need
//! a `'static` producer handle); tests construct their own [`EventChannel`]
//! instances for isolation.

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::beacon::BeaconEvent;

/// Channel depth. Discovery bursts beyond this are shed, not queued.
const EVENT_DEPTH: usize = 8;

/// Everything the radio context can tell the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessEvent {
    /// A qualifying discovery (address known, RSSI and token attached).
    Beacon(BeaconEvent),
    /// One scan cycle finished; advances the low-power budget.
    ScanTick,
}

/// Bounded MPSC event channel with drop-on-full producers.
pub struct EventChannel {
    channel: Channel<CriticalSectionRawMutex, AccessEvent, EVENT_DEPTH>,
    dropped: AtomicU32,
}

impl EventChannel {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Enqueue a discovery. Never blocks; returns `false` when the channel
    /// was full and the event was shed.
    pub fn notify_beacon(&self, event: BeaconEvent) -> bool {
        self.push(AccessEvent::Beacon(event))
    }

    /// Enqueue a scan-cycle completion. Never blocks; returns `false` when
    /// the tick was shed.
    pub fn notify_scan_cycle(&self) -> bool {
        self.push(AccessEvent::ScanTick)
    }

    fn push(&self, event: AccessEvent) -> bool {
        if self.channel.try_send(event).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    /// Pop the next pending event, if any. Single-consumer; called only from
    /// the control loop's context.
    pub fn try_next(&self) -> Option<AccessEvent> {
        self.channel.try_receive().ok()
    }

    /// Total events shed since boot.
    pub fn dropped_count(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// The firmware's channel instance, shared with the BLE callback glue.
pub static EVENT_CHANNEL: EventChannel = EventChannel::new();
