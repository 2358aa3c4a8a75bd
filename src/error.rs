//! Unified error types for the flume monitor node.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! cycle loop's error handling uniform. All variants are `Copy` so they can
//! be passed through the orchestrator and into log lines without allocation.
//! None of these escalates to a process abort: every fault degrades to a
//! logged, best-effort outcome within the cycle that detected it.

use core::fmt;

use crate::app::ports::{ClockError, DeliveryError, SensorError, StorageError};

// ---------------------------------------------------------------------------
// Top-level node error
// ---------------------------------------------------------------------------

/// Every fallible operation in the node funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The level sensor could not be read or returned out-of-range data.
    Sensor(SensorError),
    /// An append to the rotating log pair (or the error log) failed.
    Storage(StorageError),
    /// Delivery to the remote ingestion endpoint failed.
    Delivery(DeliveryError),
    /// Time synchronization failed; timestamps fall back to last-known time.
    Clock(ClockError),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Delivery(e) => write!(f, "delivery: {e}"),
            Self::Clock(e) => write!(f, "clock: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<DeliveryError> for Error {
    fn from(e: DeliveryError) -> Self {
        Self::Delivery(e)
    }
}

impl From<ClockError> for Error {
    fn from(e: ClockError) -> Self {
        Self::Clock(e)
    }
}

/// Node-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
