//! Outbound application events.
//!
//! The [`NodeService`](super::service::NodeService) emits these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other side
//! decide what to do with them — today the serial log, later perhaps a
//! telemetry channel.

use super::observation::{LevelState, Observation};

/// Structured events emitted by the pipeline.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The node finished booting and entered the cycle loop.
    Started,

    /// An observation was classified and appended to the active log file.
    Recorded {
        observation: Observation,
        /// Samples retained / rejected by the smoothing pass; both zero
        /// on an ERR cycle.
        retained: u8,
        rejected: u8,
    },

    /// The flume state changed between consecutive cycles.
    StateChanged { from: LevelState, to: LevelState },

    /// The active log file crossed its size limit; the roles toggled and
    /// the newly active file was truncated.
    Rotated { active: &'static str },

    /// A pending observation was acknowledged by the remote endpoint.
    Delivered { timestamp: i64, attempts: u8 },

    /// A pending observation exhausted its attempt budget and will not be
    /// retried again.
    DeliveryAbandoned { timestamp: i64, attempts: u8 },

    /// Wall-clock time was re-synchronized against the time service.
    ClockSynced,
}
