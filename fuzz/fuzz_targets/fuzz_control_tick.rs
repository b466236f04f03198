//! Fuzz target: access control loop
//!
//! Decodes the fuzz input into a stream of radio events, input flips and
//! time advances, drives the control loop with it, and checks the core
//! safety invariant after every tick: the relay is never open without an
//! authorized presence.
//!
//! cargo fuzz run fuzz_control_tick

#![no_main]

use libfuzzer_sys::fuzz_target;
use mkey::app::events::AppEvent;
use mkey::app::ports::{EventSink, InputPort, OutputPort};
use mkey::app::service::AccessService;
use mkey::beacon::{BeaconEvent, BeaconId};
use mkey::config::AccessConfig;
use mkey::events::EventChannel;

struct FuzzIo {
    door_open: bool,
    ignition_on: bool,
    relay_locked: bool,
}

impl InputPort for FuzzIo {
    fn door_open(&mut self) -> bool {
        self.door_open
    }
    fn ignition_on(&mut self) -> bool {
        self.ignition_on
    }
    fn aux_active(&mut self) -> bool {
        false
    }
}

impl OutputPort for FuzzIo {
    fn set_relay_locked(&mut self, locked: bool) {
        self.relay_locked = locked;
    }
    fn set_led(&mut self, _on: bool) {}
    fn set_buzzer(&mut self, _on: bool) {}
}

struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let mut svc = AccessService::new(AccessConfig::default());
    let ch = EventChannel::new();
    let mut io = FuzzIo {
        door_open: false,
        ignition_on: false,
        relay_locked: true,
    };
    let mut sink = NullSink;
    let mut now = 0u64;

    for chunk in data.chunks(2) {
        let op = chunk[0];
        let arg = chunk.get(1).copied().unwrap_or(0);
        match op % 6 {
            0 => {
                ch.notify_beacon(BeaconEvent {
                    id: BeaconId::Device1,
                    rssi: arg as i8,
                    metadata_ok: op & 0x40 != 0,
                });
            }
            1 => {
                ch.notify_scan_cycle();
            }
            2 => now += u64::from(arg) * 100,
            3 => io.door_open = arg & 1 != 0,
            4 => io.ignition_on = arg & 1 != 0,
            _ => now += u64::from(arg),
        }
        svc.tick(now, &ch, &mut io, &mut sink);
        if !svc.state().authorized {
            assert!(io.relay_locked, "relay open without authorization");
        }
    }
});
