//! Port traits — the hexagonal boundary between the pipeline and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ NodeService (domain)
//! ```
//!
//! Driven adapters (level sensor, SD volume, HTTP push, SNTP clock, event
//! sinks) implement these traits. The [`NodeService`](super::service::NodeService)
//! consumes them via generics at call sites, so the pipeline never touches
//! hardware directly. Every adapter call is expected to be bounded by a
//! timeout internally; on expiry it returns the typed error for that cycle
//! rather than blocking the loop.

use core::fmt;

use super::observation::RawSample;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the sampler calls this once per draw.
pub trait SensorPort {
    /// Take a single raw distance reading.
    ///
    /// Adapters flag physically implausible values via [`RawSample::valid`]
    /// and reserve `Err` for draws that produced no value at all.
    fn sample(&mut self) -> Result<RawSample, SensorError>;
}

/// Errors from [`SensorPort`] draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC read returned an error.
    ReadFailed,
    /// Reading is outside the physically plausible window.
    OutOfRange,
    /// The sensor did not respond within the adapter's deadline.
    Timeout,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed => write!(f, "read failed"),
            Self::OutOfRange => write!(f, "reading out of range"),
            Self::Timeout => write!(f, "sensor timeout"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Volume port (driven adapter: domain ↔ durable storage)
// ───────────────────────────────────────────────────────────────

/// Append-oriented durable storage, addressed by file name.
///
/// The store only ever appends, truncates, and sizes whole files; there is
/// no read-back path in the pipeline (records are write-once, harvest
/// happens out of band by pulling the card).
pub trait VolumePort {
    /// Append `data` to the named file, creating it if absent.
    fn append(&mut self, name: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Discard the named file's contents (size becomes zero).
    fn truncate(&mut self, name: &str) -> Result<(), StorageError>;

    /// Current size of the named file in bytes; 0 if it does not exist.
    fn size(&self, name: &str) -> Result<u64, StorageError>;
}

/// Errors from [`VolumePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// The write did not complete.
    WriteFailed,
    /// The volume is full.
    Full,
    /// A serialized record exceeded the configured capacity bound.
    RecordTooLarge,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteFailed => write!(f, "write failed"),
            Self::Full => write!(f, "volume full"),
            Self::RecordTooLarge => write!(f, "record exceeds capacity bound"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Delivery port (driven adapter: domain → remote ingestion)
// ───────────────────────────────────────────────────────────────

/// Outbound port: one parameterized call to the fixed relay endpoint.
///
/// The adapter owns host resolution, the socket, the request timeout, and
/// the success judgement (status code and body inspection). A non-2xx
/// response is an error here — the uploader treats every error as
/// retryable.
pub trait DeliveryPort {
    /// Push one record's parameters as `GET <path_and_query>` to the
    /// configured host.
    fn push(&mut self, path_and_query: &str) -> Result<(), DeliveryError>;
}

/// Errors from [`DeliveryPort`] exchanges. All are retryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// TCP connect failed or was refused.
    ConnectFailed,
    /// No complete response within the request timeout.
    Timeout,
    /// The endpoint answered with a non-success status.
    BadStatus(u16),
    /// The response arrived but the body did not acknowledge the record.
    Rejected,
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed => write!(f, "connect failed"),
            Self::Timeout => write!(f, "request timeout"),
            Self::BadStatus(code) => write!(f, "HTTP status {code}"),
            Self::Rejected => write!(f, "endpoint rejected record"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: domain ↔ wall-clock time)
// ───────────────────────────────────────────────────────────────

/// Wall-clock time, zone-adjusted, synchronized out of band.
///
/// `now_local` must never block and never fail: after a failed or missing
/// synchronization it keeps returning time derived from the last-known
/// sync point (or the boot epoch before the first one).
pub trait ClockPort {
    /// Current zone-adjusted Unix timestamp (seconds).
    fn now_local(&self) -> i64;

    /// Exchange with the remote time service and adopt its time.
    fn synchronize(&mut self) -> Result<(), ClockError>;
}

/// Errors from [`ClockPort::synchronize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockError {
    /// The time service did not answer within the deadline.
    Timeout,
    /// The exchange completed but produced no usable time.
    SyncFailed,
}

impl fmt::Display for ClockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "time service timeout"),
            Self::SyncFailed => write!(f, "synchronization failed"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The pipeline emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go (serial log today;
/// a future MQTT adapter would implement the same trait).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
