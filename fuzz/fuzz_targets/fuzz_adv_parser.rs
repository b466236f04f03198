//! Fuzz target: advertisement parsing and classification
//!
//! Drives arbitrary byte sequences through the AD-structure walker and the
//! beacon classifier and asserts that they never panic and never return
//! out-of-bounds payload slices.
//!
//! cargo fuzz run fuzz_adv_parser

#![no_main]

use libfuzzer_sys::fuzz_target;
use mkey::adapters::ble::{classify_adv, find_mfg_data};
use mkey::beacon::{payload_token_ok, BeaconId, KnownBeacon};

const FOB_ADDR: [u8; 6] = [0x58, 0x2D, 0x34, 0x3B, 0x1A, 0x7C];

fuzz_target!(|data: &[u8]| {
    if let Some(mfg) = find_mfg_data(data) {
        assert!(mfg.len() <= data.len(), "payload slice exceeds the frame");
        let _ = payload_token_ok(mfg);
    }

    let mut known: heapless::Vec<KnownBeacon, 4> = heapless::Vec::new();
    let _ = known.push(KnownBeacon {
        id: BeaconId::Device1,
        addr: FOB_ADDR,
        rssi_min: -120,
    });

    // The leading six bytes double as the transmitter address, so known and
    // unknown senders are both exercised.
    if data.len() >= 6 {
        let addr = [data[0], data[1], data[2], data[3], data[4], data[5]];
        let _ = classify_adv(&known, &addr, -40, data);
    }
    if let Some(ev) = classify_adv(&known, &FOB_ADDR, -40, data) {
        assert_eq!(ev.id, BeaconId::Device1);
    }
});
