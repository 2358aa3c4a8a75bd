//! Per-cycle batch smoothing with single-spike rejection.
//!
//! Draws a fixed-size batch of raw readings, computes a first-pass mean,
//! excludes any sample deviating from it by more than a configured fraction
//! of the dynamic range, then recomputes the mean over the retained subset.
//! Deliberately simpler than a median/robust estimator: tolerant of one
//! isolated spike per batch, not of systemic sensor fault.

use core::fmt;

use heapless::Vec;

use crate::config::{CalibrationConfig, MAX_BATCH_SAMPLES};

use super::observation::SmoothedReading;
use super::ports::SensorPort;

/// The whole cycle's sampling failed; downstream this becomes an ERR
/// observation, never a crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFault {
    /// A majority of draws failed or were out of range.
    MajorityFaulted { faulted: u8, drawn: u8 },
    /// Outlier rejection left nothing to average.
    NothingRetained,
}

impl fmt::Display for SampleFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MajorityFaulted { faulted, drawn } => {
                write!(f, "{faulted}/{drawn} draws faulted")
            }
            Self::NothingRetained => write!(f, "no samples retained after spike rejection"),
        }
    }
}

pub struct SensorSampler {
    batch: u8,
    /// Absolute deviation limit derived from the spike fraction and the
    /// calibrated dynamic range (mm).
    spike_limit_mm: f32,
}

impl SensorSampler {
    pub fn new(cal: &CalibrationConfig) -> Self {
        Self {
            batch: cal.samples_per_cycle,
            spike_limit_mm: cal.spike_fraction * cal.span_mm(),
        }
    }

    /// Draw one batch and reduce it to a single smoothed reading.
    pub fn sample(&self, port: &mut impl SensorPort) -> Result<SmoothedReading, SampleFault> {
        let mut values: Vec<f32, MAX_BATCH_SAMPLES> = Vec::new();
        let mut faulted: u8 = 0;

        for _ in 0..self.batch {
            match port.sample() {
                Ok(s) if s.valid => {
                    // Capacity equals the validated config bound.
                    let _ = values.push(s.distance_mm);
                }
                Ok(_) | Err(_) => faulted += 1,
            }
        }

        if u16::from(faulted) * 2 > u16::from(self.batch) {
            return Err(SampleFault::MajorityFaulted {
                faulted,
                drawn: self.batch,
            });
        }
        if values.is_empty() {
            return Err(SampleFault::NothingRetained);
        }

        let first_pass = mean(&values);
        let mut retained: Vec<f32, MAX_BATCH_SAMPLES> = Vec::new();
        for &v in &values {
            if (v - first_pass).abs() <= self.spike_limit_mm {
                let _ = retained.push(v);
            }
        }

        if retained.is_empty() {
            return Err(SampleFault::NothingRetained);
        }

        Ok(SmoothedReading {
            distance_mm: mean(&retained),
            retained: retained.len() as u8,
            rejected: (values.len() - retained.len()) as u8,
        })
    }
}

fn mean(values: &[f32]) -> f32 {
    let sum: f32 = values.iter().sum();
    sum / values.len() as f32
}
