//! HTTP delivery adapter for the relay endpoint.
//!
//! Implements [`DeliveryPort`] — one short-timeout GET per record against
//! the configured relay host (a PushingBox-style scenario that forwards
//! device-identified parameters into a spreadsheet).
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real HTTP round-trip via
//!   `esp_idf_svc::http::client::EspHttpConnection`.
//! - **all other targets**: simulation stub with injectable failure for
//!   host-side tests.
//!
//! Success is judged by the status code and a peek at the response body:
//! the relay answers 200 even for some rejected scenarios, with an error
//! marker in the body.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

#[cfg(not(target_os = "espidf"))]
use log::{info, warn};

use crate::app::ports::{DeliveryError, DeliveryPort};
use crate::config::NodeConfig;

#[cfg(not(target_os = "espidf"))]
static SIM_PUSH_FAIL: AtomicBool = AtomicBool::new(false);
#[cfg(not(target_os = "espidf"))]
static SIM_PUSH_COUNT: AtomicU32 = AtomicU32::new(0);

/// Force every simulated push to time out.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_push_fail(fail: bool) {
    SIM_PUSH_FAIL.store(fail, Ordering::Relaxed);
}

/// Number of pushes attempted since process start (simulation).
#[cfg(not(target_os = "espidf"))]
pub fn sim_push_count() -> u32 {
    SIM_PUSH_COUNT.load(Ordering::Relaxed)
}

pub struct HttpPushClient {
    host: heapless::String<48>,
    timeout_ms: u32,
}

impl HttpPushClient {
    pub fn new(cfg: &NodeConfig) -> Self {
        Self {
            host: cfg.push_host.clone(),
            timeout_ms: cfg.http_timeout_ms,
        }
    }

    #[cfg(target_os = "espidf")]
    fn platform_push(&mut self, path_and_query: &str) -> Result<(), DeliveryError> {
        use esp_idf_svc::http::Method;
        use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

        let mut url = String::with_capacity(self.host.len() + path_and_query.len() + 8);
        url.push_str("http://");
        url.push_str(&self.host);
        url.push_str(path_and_query);

        let mut conn = EspHttpConnection::new(&Configuration {
            timeout: Some(core::time::Duration::from_millis(u64::from(self.timeout_ms))),
            ..Default::default()
        })
        .map_err(|_| DeliveryError::ConnectFailed)?;

        conn.initiate_request(Method::Get, &url, &[])
            .map_err(|_| DeliveryError::ConnectFailed)?;
        conn.initiate_response()
            .map_err(|_| DeliveryError::Timeout)?;

        let status = conn.status();
        if !(200..300).contains(&status) {
            return Err(DeliveryError::BadStatus(status));
        }

        // The relay reports scenario errors in the body of a 200.
        let mut buf = [0u8; 64];
        let n = conn.read(&mut buf).unwrap_or(0);
        let body = core::str::from_utf8(&buf[..n]).unwrap_or("");
        if body.contains("\"error\"") {
            return Err(DeliveryError::Rejected);
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_push(&mut self, path_and_query: &str) -> Result<(), DeliveryError> {
        SIM_PUSH_COUNT.fetch_add(1, Ordering::Relaxed);
        if SIM_PUSH_FAIL.load(Ordering::Relaxed) {
            warn!("push(sim): simulated timeout for {path_and_query}");
            return Err(DeliveryError::Timeout);
        }
        info!(
            "push(sim): GET http://{}{} within {}ms",
            self.host, path_and_query, self.timeout_ms
        );
        Ok(())
    }
}

impl DeliveryPort for HttpPushClient {
    fn push(&mut self, path_and_query: &str) -> Result<(), DeliveryError> {
        self.platform_push(path_and_query)
    }
}
