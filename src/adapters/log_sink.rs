//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to the
//! leveled logger (UART / USB-CDC in production). This replaces the old
//! macro-gated serial printing: verbosity is a runtime logger configuration,
//! not a compile switch.

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
            AppEvent::Recorded {
                observation,
                retained,
                rejected,
            } => {
                info!(
                    "OBS   | ts={} depth={:.2}mm state={} raw={} kept={}/{}",
                    observation.timestamp,
                    observation.depth_mm,
                    observation.state.tag(),
                    observation
                        .raw
                        .map_or_else(|| "NA".to_string(), |r| format!("{r:.2}")),
                    retained,
                    retained + rejected,
                );
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {} -> {}", from.tag(), to.tag());
            }
            AppEvent::Rotated { active } => {
                info!("LOG   | rotated, now appending to {active}");
            }
            AppEvent::Delivered {
                timestamp,
                attempts,
            } => {
                info!("PUSH  | ts={timestamp} delivered (attempt {attempts})");
            }
            AppEvent::DeliveryAbandoned {
                timestamp,
                attempts,
            } => {
                warn!("PUSH  | ts={timestamp} abandoned after {attempts} attempts");
            }
            AppEvent::ClockSynced => {
                info!("CLOCK | synchronized");
            }
            AppEvent::Started => {
                info!("START | cycle loop entered");
            }
        }
    }
}
