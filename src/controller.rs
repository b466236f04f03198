//! Controller bring-up and the periodic control task.
//!
//! [`init`] assembles the whole outer ring — pins, wake source, watchdog,
//! radio — around an [`AccessService`] core and hands back a running
//! [`Controller`]. [`Controller::run`] is the firmware's control task: one
//! fixed-period tick at a time until the core decides to sleep, which is
//! terminal.
//!
//! Bring-up failure classes: configuration rejections and radio bring-up
//! failures abort with an [`InitError`]; pin and watchdog problems degrade
//! with a warning, because the loop can still do useful work without them.

use core::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use log::{info, warn};

use crate::adapters::ble::RadioSource;
use crate::adapters::hardware::HardwareAdapter;
use crate::adapters::log_sink::LogEventSink;
use crate::adapters::time::MonotonicClock;
use crate::app::service::{AccessService, SleepReason, TickOutcome};
use crate::config::AccessConfig;
use crate::drivers::hw_init;
use crate::drivers::outputs::OutputBank;
use crate::drivers::watchdog::Watchdog;
use crate::error::InitError;
use crate::events::EVENT_CHANNEL;
use crate::power::PowerManager;

/// One controller per boot. `init` is idempotent-guarded, not re-entrant.
static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// The assembled firmware: policy core plus every adapter it drives.
pub struct Controller {
    service: AccessService,
    hw: HardwareAdapter,
    sink: LogEventSink,
    radio: RadioSource,
    watchdog: Watchdog,
    clock: MonotonicClock,
    tick_interval_ms: u32,
}

/// Validate the configuration and bring the hardware up around it.
///
/// A second call warns and returns [`InitError::AlreadyInitialized`]. A
/// failed call releases the guard so a corrected configuration can retry.
pub fn init(config: AccessConfig) -> Result<Controller, InitError> {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        warn!("controller: init called twice");
        return Err(InitError::AlreadyInitialized);
    }
    match try_init(config) {
        Ok(controller) => Ok(controller),
        Err(e) => {
            INITIALIZED.store(false, Ordering::SeqCst);
            Err(e)
        }
    }
}

fn try_init(config: AccessConfig) -> Result<Controller, InitError> {
    config.validate()?;

    if let Err(e) = hw_init::init_pins() {
        warn!("controller: pin config failed ({e}), continuing degraded");
    }

    // Armed again right before deep-sleep entry; arming here too means a
    // watchdog reset mid-run still leaves the door as a wake source.
    PowerManager::new(&config).arm_door_wake();

    let watchdog = Watchdog::new(config.watchdog_timeout_ms);

    let mut radio = RadioSource::new(config.known_beacons.clone());
    radio.start()?;

    let tick_interval_ms = config.tick_interval_ms;
    let controller = Controller {
        service: AccessService::new(config),
        hw: HardwareAdapter::new(OutputBank::new()),
        sink: LogEventSink::new(),
        radio,
        watchdog,
        clock: MonotonicClock::new(),
        tick_interval_ms,
    };
    info!("controller: up, tick every {} ms", tick_interval_ms);
    Ok(controller)
}

impl Controller {
    /// The control task. Ticks the core at the configured period, feeding
    /// the watchdog each cycle, until the core latches a sleep decision.
    /// Returns the reason; the caller performs the actual descent.
    pub fn run(&mut self) -> SleepReason {
        self.service.start(&mut self.sink);
        let period = Duration::from_millis(u64::from(self.tick_interval_ms));
        loop {
            let now_ms = self.clock.uptime_ms();
            let outcome = self
                .service
                .tick(now_ms, &EVENT_CHANNEL, &mut self.hw, &mut self.sink);
            self.watchdog.feed();

            if let TickOutcome::Sleep(reason) = outcome {
                self.radio.stop();
                return reason;
            }
            thread::sleep(period);
        }
    }

    pub fn service(&self) -> &AccessService {
        &self.service
    }
}
