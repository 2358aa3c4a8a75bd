//! SNTP-backed wall clock adapter.
//!
//! Implements [`ClockPort`]: zone-adjusted Unix timestamps, re-synchronized
//! out of band against a remote time service. `now_local` never blocks and
//! never fails — before the first successful sync (or after a failed one)
//! it keeps serving time derived from the system clock's last-known value,
//! which on the device means the boot epoch until SNTP first lands.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::sntp::EspSntp` exchange with
//!   a bounded completion wait; the IDF applies the result to the system
//!   clock, which `SystemTime` then reflects.
//! - **all other targets**: the host clock is already synchronized; a
//!   simulation flag can force sync failures for tests.

use std::time::{SystemTime, UNIX_EPOCH};

use log::info;

use crate::app::ports::{ClockError, ClockPort};
use crate::config::NodeConfig;

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, Ordering};

#[cfg(not(target_os = "espidf"))]
static SIM_SYNC_FAIL: AtomicBool = AtomicBool::new(false);

/// Force simulated synchronization to fail.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_sync_fail(fail: bool) {
    SIM_SYNC_FAIL.store(fail, Ordering::Relaxed);
}

pub struct SntpClock {
    server: heapless::String<48>,
    timezone_offset_secs: i32,
    timeout_ms: u32,
    synced: bool,
}

impl SntpClock {
    pub fn new(cfg: &NodeConfig) -> Self {
        Self {
            server: cfg.time_server.clone(),
            timezone_offset_secs: cfg.timezone_offset_secs,
            timeout_ms: cfg.http_timeout_ms,
            synced: false,
        }
    }

    pub fn is_synced(&self) -> bool {
        self.synced
    }

    #[cfg(target_os = "espidf")]
    fn platform_sync(&mut self) -> Result<(), ClockError> {
        use esp_idf_svc::sntp::{EspSntp, SntpConf, SyncStatus};

        // One-shot exchange: the result lands in the system clock, so the
        // SNTP service does not need to outlive the sync.
        let conf = SntpConf {
            servers: [self.server.as_str()],
            ..SntpConf::default()
        };
        let sntp = EspSntp::new(&conf).map_err(|_| ClockError::SyncFailed)?;

        // Bounded wait: poll for completion, then give up for this cycle.
        let deadline = self.timeout_ms / 100;
        for _ in 0..deadline.max(1) {
            if sntp.get_sync_status() == SyncStatus::Completed {
                return Ok(());
            }
            esp_idf_hal::delay::FreeRtos::delay_ms(100);
        }
        Err(ClockError::Timeout)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_sync(&mut self) -> Result<(), ClockError> {
        let _ = self.timeout_ms;
        if SIM_SYNC_FAIL.load(Ordering::Relaxed) {
            return Err(ClockError::SyncFailed);
        }
        Ok(())
    }
}

impl ClockPort for SntpClock {
    fn now_local(&self) -> i64 {
        let utc = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs() as i64);
        utc + i64::from(self.timezone_offset_secs)
    }

    fn synchronize(&mut self) -> Result<(), ClockError> {
        self.platform_sync()?;
        if !self.synced {
            info!("clock: first sync against {} complete", self.server);
        }
        self.synced = true;
        Ok(())
    }
}
