//! Depth calibration and operational-state classification.
//!
//! The sensor measures distance to the water surface, so depth is the
//! empty-level distance minus the reading, less the slump correction when
//! the flume geometry calls for it. Classification runs on the pre-clamp
//! depth (otherwise OVERFILL would be unreachable); the reported depth is
//! clamped to the usable span and truncated to two decimals to match the
//! durable record precision.
//!
//! Stateless by design: each cycle classifies in isolation, with no
//! hysteresis across cycles.

use crate::config::CalibrationConfig;

use super::observation::{trim_precision, LevelState, SmoothedReading};

pub struct LevelClassifier {
    cal: CalibrationConfig,
}

impl LevelClassifier {
    pub fn new(cal: &CalibrationConfig) -> Self {
        Self { cal: *cal }
    }

    /// Convert a smoothed reading into (calibrated depth, state).
    pub fn classify(&self, reading: &SmoothedReading) -> (f32, LevelState) {
        let cal = &self.cal;

        let mut depth = cal.empty_level_mm - reading.distance_mm;
        if cal.slump_correction {
            depth -= cal.slump_mm;
        }
        // The dip holds water below the true floor; never report negative.
        let depth = depth.max(0.0);

        let span = cal.span_mm();
        let state = if depth <= cal.zero_epsilon_mm {
            LevelState::Zero
        } else if depth < span - cal.zero_epsilon_mm {
            LevelState::Ok
        } else if depth < span + cal.overfill_margin_mm {
            LevelState::Full
        } else {
            LevelState::Overfill
        };

        (trim_precision(depth.min(span)), state)
    }
}
