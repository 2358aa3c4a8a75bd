//! Pipeline data model: raw samples, smoothed readings, level states, and
//! the durable observation record.
//!
//! One `Observation` is created per cycle and never mutated afterwards;
//! delivery bookkeeping lives in the store's pending entries, not here.

use serde::{Deserialize, Serialize};

use super::ports::StorageError;

/// Byte bound for one serialized record line, newline included. A record
/// that would exceed this is refused, not truncated.
pub const RECORD_CAPACITY: usize = 192;

/// A single raw sensor reading.
///
/// `valid == false` marks a reading the adapter judged physically
/// implausible; the sampler counts it against the fault majority but never
/// averages it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    /// Distance from sensor to the reflecting surface (mm)
    pub distance_mm: f32,
    pub valid: bool,
}

impl RawSample {
    pub fn new(distance_mm: f32) -> Self {
        Self {
            distance_mm,
            valid: true,
        }
    }

    pub fn invalid(distance_mm: f32) -> Self {
        Self {
            distance_mm,
            valid: false,
        }
    }
}

/// One smoothed reading per cycle, with the batch bookkeeping that feeds
/// structured logging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedReading {
    /// Outlier-filtered mean distance (mm)
    pub distance_mm: f32,
    /// Samples retained after outlier rejection
    pub retained: u8,
    /// Samples excluded as outliers
    pub rejected: u8,
}

/// Operational condition of the flume for one cycle.
///
/// Pure function of (depth, calibration); no memory across cycles. The
/// depth ordering ZERO < OK < FULL < OVERFILL is exposed via [`rank`];
/// ERR is independent of depth and EMPTY is a reserved legacy tag.
///
/// [`rank`]: LevelState::rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LevelState {
    Empty,
    Ok,
    Full,
    Overfill,
    Err,
    Zero,
}

impl LevelState {
    /// The fixed tag written into durable records and delivery parameters.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Empty => "EMPTY",
            Self::Ok => "OK",
            Self::Full => "FULL",
            Self::Overfill => "OVERFILL",
            Self::Err => "ERR",
            Self::Zero => "ZERO",
        }
    }

    /// Position in the depth ordering ZERO < OK < FULL < OVERFILL.
    /// `None` for the depth-independent states.
    pub fn rank(self) -> Option<u8> {
        match self {
            Self::Zero => Some(0),
            Self::Ok => Some(1),
            Self::Full => Some(2),
            Self::Overfill => Some(3),
            Self::Empty | Self::Err => None,
        }
    }
}

/// Truncate (not round) to two decimal places: 3.456 → 3.45.
pub fn trim_precision(value: f32) -> f32 {
    ((value * 100.0) as i64) as f32 / 100.0
}

/// One timestamped observation, created once per cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// Zone-adjusted Unix timestamp (seconds)
    pub timestamp: i64,
    /// Smoothed raw input (mm); `None` when the cycle faulted
    pub raw: Option<f32>,
    /// Calibrated depth, clamped and truncated to two decimals (mm)
    pub depth_mm: f32,
    pub state: LevelState,
}

/// Durable wire shape of one record line. Depth is carried as fixed
/// two-decimal text so the file format is stable regardless of float
/// printing behaviour.
#[derive(Serialize, Deserialize)]
struct RecordLine {
    ts: i64,
    depth: String,
    state: LevelState,
    raw: Option<f32>,
}

impl Observation {
    pub fn new(timestamp: i64, raw: Option<f32>, depth_mm: f32, state: LevelState) -> Self {
        Self {
            timestamp,
            raw,
            depth_mm: trim_precision(depth_mm),
            state,
        }
    }

    /// Serialize to one newline-terminated JSON record.
    ///
    /// `capacity` is the explicit byte bound of the serialization contract;
    /// a record that would exceed it yields [`StorageError::RecordTooLarge`].
    pub fn to_record_line(&self, capacity: usize) -> Result<String, StorageError> {
        let line = RecordLine {
            ts: self.timestamp,
            depth: format!("{:.2}", self.depth_mm),
            state: self.state,
            raw: self.raw,
        };
        let mut out = serde_json::to_string(&line).map_err(|_| StorageError::WriteFailed)?;
        out.push('\n');
        if out.len() > capacity {
            return Err(StorageError::RecordTooLarge);
        }
        Ok(out)
    }

    /// Parse one record line back into an observation (diagnostics and
    /// tests; the pipeline itself never reads records back).
    pub fn from_record_line(line: &str) -> Option<Self> {
        let rec: RecordLine = serde_json::from_str(line.trim_end()).ok()?;
        let depth_mm: f32 = rec.depth.parse().ok()?;
        Some(Self {
            timestamp: rec.ts,
            raw: rec.raw,
            depth_mm,
            state: rec.state,
        })
    }
}
