//! Delivery of pending observations to the remote ingestion endpoint.
//!
//! Each pending observation gets at most one attempt per cycle and a
//! bounded total attempt budget; exhaustion sends it to the error log and
//! out of the pending set (it stays in the durable log). Every network
//! failure is retryable — there is no fatal condition that halts the node.

use core::fmt::Write as _;

use heapless::Vec;
use log::{info, warn};

use crate::config::NodeConfig;

use super::events::AppEvent;
use super::observation::Observation;
use super::ports::{DeliveryPort, EventSink, VolumePort};
use super::store::{PendingEntry, RecordStore, PENDING_CAPACITY};

/// Byte bound for one request line (path plus query parameters).
pub const URL_CAPACITY: usize = 192;

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The endpoint acknowledged the record.
    Delivered,
    /// Network-layer failure; the observation stays pending.
    Retryable,
}

pub struct UploadClient {
    device_id: heapless::String<24>,
    path: heapless::String<24>,
    max_attempts: u8,
}

impl UploadClient {
    pub fn new(cfg: &NodeConfig) -> Self {
        Self {
            device_id: cfg.device_id.clone(),
            path: cfg.push_path.clone(),
            max_attempts: cfg.max_delivery_attempts,
        }
    }

    /// Format one observation as the relay request line:
    /// `<path>?devid=..&ts=..&depth=..&state=..&raw=..`.
    fn request_line(&self, obs: &Observation) -> heapless::String<URL_CAPACITY> {
        let mut url = heapless::String::new();
        let _ = write!(
            url,
            "{}?devid={}&ts={}&depth={:.2}&state={}",
            self.path,
            self.device_id,
            obs.timestamp,
            obs.depth_mm,
            obs.state.tag()
        );
        match obs.raw {
            Some(raw) => {
                let _ = write!(url, "&raw={raw:.2}");
            }
            None => {
                let _ = url.push_str("&raw=NA");
            }
        }
        url
    }

    /// One attempt for one observation.
    pub fn deliver(
        &self,
        obs: &Observation,
        net: &mut impl DeliveryPort,
    ) -> DeliveryOutcome {
        let url = self.request_line(obs);
        match net.push(&url) {
            Ok(()) => DeliveryOutcome::Delivered,
            Err(e) => {
                warn!("delivery failed for ts={}: {e}", obs.timestamp);
                DeliveryOutcome::Retryable
            }
        }
    }

    /// Attempt every undelivered pending observation once, oldest first.
    pub fn flush_pending(
        &self,
        store: &mut RecordStore,
        vol: &mut impl VolumePort,
        net: &mut impl DeliveryPort,
        sink: &mut impl EventSink,
    ) {
        // Snapshot: the set mutates as entries deliver or get abandoned.
        let snapshot: Vec<PendingEntry, PENDING_CAPACITY> =
            store.pending().iter().copied().collect();

        for entry in &snapshot {
            if entry.delivered {
                continue;
            }
            let ts = entry.observation.timestamp;
            let attempts = store.record_attempt(ts);

            match self.deliver(&entry.observation, net) {
                DeliveryOutcome::Delivered => {
                    store.mark_delivered(ts);
                    info!("delivered ts={ts} (attempt {attempts})");
                    sink.emit(&AppEvent::Delivered {
                        timestamp: ts,
                        attempts,
                    });
                }
                DeliveryOutcome::Retryable => {
                    if attempts >= self.max_attempts {
                        store.log_error(
                            vol,
                            ts,
                            &format!("delivery abandoned after {attempts} attempts"),
                        );
                        store.abandon(ts);
                        warn!("delivery abandoned for ts={ts} after {attempts} attempts");
                        sink.emit(&AppEvent::DeliveryAbandoned {
                            timestamp: ts,
                            attempts,
                        });
                    }
                }
            }
        }

        store.compact();
    }
}
