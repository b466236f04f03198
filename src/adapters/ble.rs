//! BLE radio adapter — beacon discovery source and status advertiser.
//!
//! Runs both GAP roles at once and feeds the control loop through the
//! bounded [`EVENT_CHANNEL`](crate::events::EVENT_CHANNEL):
//!
//! - **Advertiser**: connectable undirected advertising carrying the
//!   service UUID and a live status bitfield; the device name rides in
//!   the scan response. Restarts itself after every disconnect.
//! - **Scanner**: active scanning in 1-second bursts. Each qualifying
//!   discovery becomes a `BeaconEvent`; each finished burst becomes a
//!   `ScanTick`, then the next burst starts immediately.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: Bluedroid dual-role GAP via `esp_idf_svc::sys`.
//! - **all other targets**: simulation stubs for host-side tests; payload
//!   assembly, advertisement parsing and role transitions are pure and
//!   shared with the target build.
//!
//! ## Advertisement layout (bit-exact)
//!
//! | AD structure        | Bytes                                    |
//! |---------------------|------------------------------------------|
//! | Flags               | `02 01 06`                               |
//! | 128-bit UUID (cmpl) | `11 07` + service UUID little-endian     |
//! | Manufacturer data   | `05 FF E5 02 <status> 01`                |
//! | Scan rsp: name      | `05 09 "MKEY"`                           |

use log::info;

use crate::beacon::{self, BeaconEvent, KnownBeacon};
use crate::drivers::hw_init;
use crate::error::RadioError;
use crate::events::EVENT_CHANNEL;
use crate::pins;

// ───────────────────────────────────────────────────────────────
// Constants
// ───────────────────────────────────────────────────────────────

/// Advertised device name (scan response).
pub const DEVICE_NAME: &str = "MKEY";

/// Bluetooth SIG company identifier carried in the manufacturer data,
/// transmitted little-endian.
pub const COMPANY_ID: u16 = 0x02E5;

/// Firmware revision byte, last octet of the manufacturer data.
pub const FW_VERSION: u8 = 0x01;

/// 128-bit primary service UUID (`f505f04b-2066-5069-8775-830fcfc57339`).
pub const SERVICE_UUID: u128 = 0xf505f04b_2066_5069_8775_830fcfc57339;

/// Preferred ATT MTU announced after a central connects.
pub const PREFERRED_MTU: u16 = 512;

/// Advertising interval bounds in 0.625 ms units (20–40 ms).
pub const ADV_INT_MIN: u16 = 0x20;
pub const ADV_INT_MAX: u16 = 0x40;

/// Scan interval and window in 0.625 ms units. Equal values give a 100 %
/// duty cycle within a burst.
pub const SCAN_INTERVAL: u16 = 0x30;
pub const SCAN_WINDOW: u16 = 0x30;

/// Scan burst length in seconds. Each burst completion is one scan cycle.
pub const SCAN_BURST_SECS: u32 = 1;

// AD structure types (Core Specification Supplement, Part A).
const AD_TYPE_FLAGS: u8 = 0x01;
const AD_TYPE_UUID128_COMPLETE: u8 = 0x07;
const AD_TYPE_NAME_COMPLETE: u8 = 0x09;
const AD_TYPE_MFG_DATA: u8 = 0xFF;

/// LE General Discoverable + BR/EDR Not Supported.
const ADV_FLAGS: u8 = 0x06;

// Status bitfield layout. Bits 5–7 are reserved and always zero.
pub const STATUS_BIT_DOOR: u8 = 0;
/// Update-in-progress. There is no OTA path, so this is hardwired to 0.
pub const STATUS_BIT_UPDATE: u8 = 1;
pub const STATUS_BIT_IGNITION: u8 = 2;
pub const STATUS_BIT_RELAY: u8 = 3;
pub const STATUS_BIT_AUX_IN: u8 = 4;

// ───────────────────────────────────────────────────────────────
// Role state
// ───────────────────────────────────────────────────────────────

/// Advertising role. Never rests in `Idle` while the controller runs: a
/// disconnect or completed advertisement immediately re-enters
/// `Advertising`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvRole {
    Idle,
    Advertising,
    Connected,
}

/// Scanning role. A finished burst restarts scanning at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanRole {
    Idle,
    Scanning,
}

// ───────────────────────────────────────────────────────────────
// Payload assembly
// ───────────────────────────────────────────────────────────────

/// Sample the live status bitfield from the GPIO level registers.
/// Output pins are configured INPUT_OUTPUT so their levels read back.
#[must_use]
pub fn status_bits() -> u8 {
    let mut bits = 0u8;
    if hw_init::gpio_read(pins::DOOR_GPIO) {
        bits |= 1 << STATUS_BIT_DOOR;
    }
    if hw_init::gpio_read(pins::IGNITION_GPIO) {
        bits |= 1 << STATUS_BIT_IGNITION;
    }
    if hw_init::gpio_read(pins::RELAY_GPIO) {
        bits |= 1 << STATUS_BIT_RELAY;
    }
    if hw_init::gpio_read(pins::AUX_IN_GPIO) {
        bits |= 1 << STATUS_BIT_AUX_IN;
    }
    bits
}

/// Assemble the primary advertisement: flags, the complete 128-bit service
/// UUID, and the 4-byte manufacturer block (company ID little-endian,
/// status bitfield, firmware version).
#[must_use]
pub fn build_adv_payload(status: u8) -> heapless::Vec<u8, 31> {
    let mut adv = heapless::Vec::new();
    let _ = adv.extend_from_slice(&[0x02, AD_TYPE_FLAGS, ADV_FLAGS]);
    let _ = adv.push(0x11);
    let _ = adv.push(AD_TYPE_UUID128_COMPLETE);
    let _ = adv.extend_from_slice(&SERVICE_UUID.to_le_bytes());
    let _ = adv.extend_from_slice(&[0x05, AD_TYPE_MFG_DATA]);
    let _ = adv.extend_from_slice(&COMPANY_ID.to_le_bytes());
    let _ = adv.push(status);
    let _ = adv.push(FW_VERSION);
    adv
}

/// Assemble the scan response: the complete local name on its own, keeping
/// the primary payload under the 31-byte ceiling.
#[must_use]
pub fn build_scan_rsp() -> heapless::Vec<u8, 31> {
    let mut rsp = heapless::Vec::new();
    let _ = rsp.push(1 + DEVICE_NAME.len() as u8);
    let _ = rsp.push(AD_TYPE_NAME_COMPLETE);
    let _ = rsp.extend_from_slice(DEVICE_NAME.as_bytes());
    rsp
}

// ───────────────────────────────────────────────────────────────
// Advertisement parsing
// ───────────────────────────────────────────────────────────────

/// Walk the AD structures of a received advertisement and return the
/// manufacturer-specific payload (type `0xFF`), if present and well formed.
/// Stops at a zero length byte or at any structure that runs past the
/// buffer end.
#[must_use]
pub fn find_mfg_data(adv: &[u8]) -> Option<&[u8]> {
    let mut i = 0usize;
    while i < adv.len() {
        let len = adv[i] as usize;
        if len == 0 {
            return None;
        }
        let end = i + 1 + len;
        if end > adv.len() {
            return None;
        }
        if adv[i + 1] == AD_TYPE_MFG_DATA {
            return Some(&adv[i + 2..end]);
        }
        i = end;
    }
    None
}

/// Classify one received advertisement against the known-beacon table.
///
/// Returns an event only when the transmitting address is known. The token
/// check result rides along as `metadata_ok`; the acceptance algorithm in
/// the control loop makes the reject decision, so weak or tokenless frames
/// from a known address are still reported.
#[must_use]
pub fn classify_adv(
    known: &[KnownBeacon],
    addr: &[u8; 6],
    rssi: i8,
    adv: &[u8],
) -> Option<BeaconEvent> {
    let entry = known.iter().find(|k| k.matches(addr))?;
    let metadata_ok = find_mfg_data(adv).is_some_and(beacon::payload_token_ok);
    Some(BeaconEvent {
        id: entry.id,
        rssi,
        metadata_ok,
    })
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF static state
// ───────────────────────────────────────────────────────────────
//
// Bluedroid callbacks are C function pointers that cannot capture Rust
// closures. The known-beacon table is installed here at radio start; GAP
// callbacks run in the Bluedroid task (not ISR), so std Mutex is safe.

#[cfg(target_os = "espidf")]
static KNOWN_BEACONS: std::sync::Mutex<heapless::Vec<KnownBeacon, 4>> =
    std::sync::Mutex::new(heapless::Vec::new());

#[cfg(target_os = "espidf")]
fn adv_params() -> esp_idf_svc::sys::esp_ble_adv_params_t {
    use esp_idf_svc::sys::*;
    esp_ble_adv_params_t {
        adv_int_min: ADV_INT_MIN,
        adv_int_max: ADV_INT_MAX,
        adv_type: esp_ble_adv_type_t_ADV_TYPE_IND,
        own_addr_type: esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC,
        channel_map: esp_ble_adv_channel_t_ADV_CHNL_ALL,
        adv_filter_policy: esp_ble_adv_filter_t_ADV_FILTER_ALLOW_SCAN_ANY_CON_ANY,
        // SAFETY: remaining fields of this C struct are plain integers and
        // valid all-zero.
        ..unsafe { core::mem::zeroed() }
    }
}

/// Re-configure the primary advertisement with a freshly sampled status
/// byte. The raw-data-set completion chain restarts advertising.
#[cfg(target_os = "espidf")]
fn refresh_and_advertise() {
    use esp_idf_svc::sys::*;
    let adv = build_adv_payload(status_bits());
    // SAFETY: Bluedroid copies the buffer before the call returns.
    let rc = unsafe { esp_ble_gap_config_adv_data_raw(adv.as_ptr() as *mut u8, adv.len() as u32) };
    if rc != ESP_OK as i32 {
        log::warn!("BLE: adv payload refresh rejected (rc={})", rc);
    }
}

#[cfg(target_os = "espidf")]
fn start_scan_burst() {
    use esp_idf_svc::sys::*;
    // SAFETY: scanning parameters were installed during bring-up.
    let rc = unsafe { esp_ble_gap_start_scanning(SCAN_BURST_SECS) };
    if rc != ESP_OK as i32 {
        log::warn!("BLE: scan burst start rejected (rc={})", rc);
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn gap_event_handler(
    event: esp_idf_svc::sys::esp_gap_ble_cb_event_t,
    param: *mut esp_idf_svc::sys::esp_ble_gap_cb_param_t,
) {
    use esp_idf_svc::sys::*;
    match event {
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_DATA_RAW_SET_COMPLETE_EVT => {
            let rsp = build_scan_rsp();
            // SAFETY: Bluedroid copies the buffer before the call returns.
            unsafe {
                esp_ble_gap_config_scan_rsp_data_raw(rsp.as_ptr() as *mut u8, rsp.len() as u32);
            }
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_SCAN_RSP_DATA_RAW_SET_COMPLETE_EVT => {
            let mut params = adv_params();
            // SAFETY: params lives across the call; Bluedroid copies it.
            unsafe {
                esp_ble_gap_start_advertising(&mut params);
            }
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_START_COMPLETE_EVT => {
            // SAFETY: union field selected by the event discriminant.
            let status = unsafe { (*param).adv_start_cmpl.status };
            if status == esp_bt_status_t_ESP_BT_STATUS_SUCCESS {
                log::info!("BLE: advertising started");
            } else {
                log::warn!("BLE: advertising start failed (status={})", status);
            }
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_STOP_COMPLETE_EVT => {
            log::info!("BLE: advertising stopped");
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_SCAN_PARAM_SET_COMPLETE_EVT => {
            start_scan_burst();
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_SCAN_START_COMPLETE_EVT => {
            // SAFETY: union field selected by the event discriminant.
            let status = unsafe { (*param).scan_start_cmpl.status };
            if status != esp_bt_status_t_ESP_BT_STATUS_SUCCESS {
                log::warn!("BLE: scan start failed (status={})", status);
            }
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_SCAN_RESULT_EVT => {
            // SAFETY: union field selected by the event discriminant.
            let r = unsafe { &(*param).scan_rst };
            match r.search_evt {
                esp_gap_search_evt_t_ESP_GAP_SEARCH_INQ_RES_EVT => {
                    handle_scan_result(r);
                }
                esp_gap_search_evt_t_ESP_GAP_SEARCH_INQ_CMPL_EVT => {
                    // One burst = one scan cycle; shed ticks are re-created
                    // by the synthetic path.
                    let _ = EVENT_CHANNEL.notify_scan_cycle();
                    start_scan_burst();
                }
                _ => {}
            }
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_SCAN_STOP_COMPLETE_EVT => {
            log::info!("BLE: scanning stopped");
        }
        _ => {}
    }
}

#[cfg(target_os = "espidf")]
fn handle_scan_result(r: &esp_idf_svc::sys::esp_ble_gap_cb_param_t_ble_scan_result_evt_param) {
    use esp_idf_svc::sys::*;
    // Fobs use fixed public addresses; everything else is noise.
    if r.ble_addr_type != esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC {
        return;
    }
    let addr: [u8; 6] = r.bda;
    let rssi = r.rssi as i8;
    // Active scan: token may ride in the advertisement or the scan
    // response, so both regions are searched.
    let total = (r.adv_data_len as usize + r.scan_rsp_len as usize).min(r.ble_adv.len());
    let adv = &r.ble_adv[..total];

    let Ok(known) = KNOWN_BEACONS.lock() else {
        return;
    };
    if let Some(ev) = classify_adv(&known, &addr, rssi, adv) {
        let _ = EVENT_CHANNEL.notify_beacon(ev);
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn gatts_event_handler(
    event: esp_idf_svc::sys::esp_gatts_cb_event_t,
    gatts_if: esp_idf_svc::sys::esp_gatt_if_t,
    param: *mut esp_idf_svc::sys::esp_ble_gatts_cb_param_t,
) {
    use esp_idf_svc::sys::*;
    match event {
        esp_gatts_cb_event_t_ESP_GATTS_REG_EVT => {
            log::info!("BLE: GATTS app registered (if={})", gatts_if);
        }
        esp_gatts_cb_event_t_ESP_GATTS_CONNECT_EVT => {
            // SAFETY: union field selected by the event discriminant.
            let conn_id = unsafe { (*param).connect.conn_id };
            log::info!("BLE: central connected (conn_id={})", conn_id);
        }
        esp_gatts_cb_event_t_ESP_GATTS_MTU_EVT => {
            // SAFETY: union field selected by the event discriminant.
            let mtu = unsafe { (*param).mtu.mtu };
            log::info!("BLE: MTU negotiated ({})", mtu);
        }
        esp_gatts_cb_event_t_ESP_GATTS_DISCONNECT_EVT => {
            log::info!("BLE: central disconnected, restarting advertising");
            // Self-healing: re-sample status and re-enter Advertising.
            refresh_and_advertise();
        }
        _ => {}
    }
}

// ───────────────────────────────────────────────────────────────
// Radio source
// ───────────────────────────────────────────────────────────────

/// The discovery source: owns both GAP role states and the known-beacon
/// table the scanner classifies against.
///
/// On the target, connection tracking lives in the Bluedroid callback
/// context, which heals role drops directly; the fields here mirror what
/// the control task last observed and drive the simulation on host builds.
pub struct RadioSource {
    adv: AdvRole,
    scan: ScanRole,
    known: heapless::Vec<KnownBeacon, 4>,
}

impl RadioSource {
    pub fn new(known: heapless::Vec<KnownBeacon, 4>) -> Self {
        Self {
            adv: AdvRole::Idle,
            scan: ScanRole::Idle,
            known,
        }
    }

    /// Bring up the radio and enter both roles. Failures here are fatal to
    /// init: a controller that can never discover a beacon must not run.
    pub fn start(&mut self) -> Result<(), RadioError> {
        self.platform_start()?;
        self.adv = AdvRole::Advertising;
        self.scan = ScanRole::Scanning;
        info!(
            "BLE: up, advertising as '{}', scanning for {} known fob(s)",
            DEVICE_NAME,
            self.known.len()
        );
        Ok(())
    }

    /// Stop both roles before deep-sleep entry.
    pub fn stop(&mut self) {
        self.platform_stop();
        self.adv = AdvRole::Idle;
        self.scan = ScanRole::Idle;
        info!("BLE: down");
    }

    pub fn adv_role(&self) -> AdvRole {
        self.adv
    }

    pub fn scan_role(&self) -> ScanRole {
        self.scan
    }

    // ── Role transitions ──────────────────────────────────────

    pub fn on_central_connected(&mut self) {
        if self.adv != AdvRole::Idle {
            self.adv = AdvRole::Connected;
        }
    }

    /// Disconnect never parks the role: an operational controller goes
    /// straight back to Advertising.
    pub fn on_central_disconnected(&mut self) {
        if self.adv != AdvRole::Idle {
            self.adv = AdvRole::Advertising;
        }
    }

    /// A scan burst finished: account one scan cycle and keep scanning.
    pub fn on_scan_burst_complete(&mut self) {
        if self.scan == ScanRole::Scanning {
            let _ = EVENT_CHANNEL.notify_scan_cycle();
        }
    }

    /// Inject one received advertisement, as the scan callback would.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_inject_adv(&self, addr: &[u8; 6], rssi: i8, adv: &[u8]) -> bool {
        match classify_adv(&self.known, addr, rssi, adv) {
            Some(ev) => EVENT_CHANNEL.notify_beacon(ev),
            None => false,
        }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_start(&mut self) -> Result<(), RadioError> {
        use esp_idf_svc::sys::*;

        if let Ok(mut table) = KNOWN_BEACONS.lock() {
            *table = self.known.clone();
        }

        unsafe {
            // Release classic BT memory (BLE-only mode saves ~30 KB).
            esp_bt_controller_mem_release(esp_bt_mode_t_ESP_BT_MODE_CLASSIC_BT);

            let mut bt_cfg = esp_bt_controller_config_t::default();
            let rc = esp_bt_controller_init(&mut bt_cfg);
            if rc != ESP_OK as i32 {
                return Err(RadioError::Stack(rc));
            }
            let rc = esp_bt_controller_enable(esp_bt_mode_t_ESP_BT_MODE_BLE);
            if rc != ESP_OK as i32 {
                return Err(RadioError::Stack(rc));
            }
            let rc = esp_bluedroid_init();
            if rc != ESP_OK as i32 {
                return Err(RadioError::Stack(rc));
            }
            let rc = esp_bluedroid_enable();
            if rc != ESP_OK as i32 {
                return Err(RadioError::Stack(rc));
            }

            let rc = esp_ble_gap_register_callback(Some(gap_event_handler));
            if rc != ESP_OK as i32 {
                return Err(RadioError::Register(rc));
            }
            // GATTS registration is only for connect/disconnect/MTU events;
            // no service is exposed.
            let rc = esp_ble_gatts_register_callback(Some(gatts_event_handler));
            if rc != ESP_OK as i32 {
                return Err(RadioError::Register(rc));
            }
            let rc = esp_ble_gatts_app_register(0);
            if rc != ESP_OK as i32 {
                return Err(RadioError::Register(rc));
            }
            let rc = esp_ble_gatt_set_local_mtu(PREFERRED_MTU);
            if rc != ESP_OK as i32 {
                log::warn!("BLE: local MTU preference rejected (rc={})", rc);
            }

            let rc = esp_ble_gap_set_device_name(b"MKEY\0".as_ptr() as *const _);
            if rc != ESP_OK as i32 {
                return Err(RadioError::AdvConfig(rc));
            }

            // Advertising starts from the raw-data-set completion chain.
            let adv = build_adv_payload(status_bits());
            let rc = esp_ble_gap_config_adv_data_raw(adv.as_ptr() as *mut u8, adv.len() as u32);
            if rc != ESP_OK as i32 {
                return Err(RadioError::AdvConfig(rc));
            }

            // Scanning starts from the parameter-set completion event.
            let mut scan_params = esp_ble_scan_params_t {
                scan_type: esp_ble_scan_type_t_BLE_SCAN_TYPE_ACTIVE,
                own_addr_type: esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC,
                scan_filter_policy: esp_ble_scan_filter_t_BLE_SCAN_FILTER_ALLOW_ALL,
                scan_interval: SCAN_INTERVAL,
                scan_window: SCAN_WINDOW,
                scan_duplicate: esp_ble_scan_duplicate_t_BLE_SCAN_DUPLICATE_ENABLE,
            };
            let rc = esp_ble_gap_set_scan_params(&mut scan_params);
            if rc != ESP_OK as i32 {
                return Err(RadioError::ScanConfig(rc));
            }
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start(&mut self) -> Result<(), RadioError> {
        info!(
            "BLE(sim): advertising '{}' (service {:032x})",
            DEVICE_NAME, SERVICE_UUID
        );
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_stop(&mut self) {
        use esp_idf_svc::sys::*;
        unsafe {
            esp_ble_gap_stop_scanning();
            esp_ble_gap_stop_advertising();
            esp_bluedroid_disable();
            esp_bluedroid_deinit();
            esp_bt_controller_disable();
            esp_bt_controller_deinit();
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_stop(&mut self) {
        info!("BLE(sim): stopped");
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
