//! Analog distance/level sensor adapter.
//!
//! The level sensor hangs above the flume and returns a voltage
//! proportional to the distance to the reflecting surface, read through an
//! ADC channel. Counts convert linearly to millimetres with a bench-derived
//! scale.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads the ADC channel via the legacy oneshot API.
//! On host/test: reads from static atomics for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::app::observation::RawSample;
use crate::app::ports::{SensorError, SensorPort};

#[cfg(not(target_os = "espidf"))]
static SIM_LEVEL_MM: AtomicU32 = AtomicU32::new(0);
#[cfg(not(target_os = "espidf"))]
static SIM_FAIL: AtomicBool = AtomicBool::new(false);

/// Inject the simulated distance reading (mm).
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_level_mm(mm: f32) {
    SIM_LEVEL_MM.store(mm.to_bits(), Ordering::Relaxed);
}

/// Force every simulated draw to fail.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_fail(fail: bool) {
    SIM_FAIL.store(fail, Ordering::Relaxed);
}

/// Millimetres per ADC count at 12-bit width and 11 dB attenuation,
/// measured against a tape target on the bench.
const MM_PER_COUNT: f32 = 0.32;

/// Physically plausible distance window (mm). Readings outside are flagged
/// invalid rather than averaged into the batch.
const MIN_PLAUSIBLE_MM: f32 = 10.0;
const MAX_PLAUSIBLE_MM: f32 = 1200.0;

pub struct AnalogLevelSensor {
    adc_channel: i32,
}

impl AnalogLevelSensor {
    pub fn new(adc_channel: i32) -> Self {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: one-time channel configuration from the single
            // main-task context before any draw.
            unsafe {
                esp_idf_sys::adc1_config_width(esp_idf_sys::adc_bits_width_t_ADC_WIDTH_BIT_12);
                esp_idf_sys::adc1_config_channel_atten(
                    adc_channel as esp_idf_sys::adc1_channel_t,
                    esp_idf_sys::adc_atten_t_ADC_ATTEN_DB_11,
                );
            }
        }
        Self { adc_channel }
    }

    #[cfg(target_os = "espidf")]
    fn read_counts(&mut self) -> Result<u16, SensorError> {
        // SAFETY: channel was configured in `new`.
        let raw = unsafe {
            esp_idf_sys::adc1_get_raw(self.adc_channel as esp_idf_sys::adc1_channel_t)
        };
        if raw < 0 {
            return Err(SensorError::ReadFailed);
        }
        Ok(raw as u16)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_counts(&mut self) -> Result<u16, SensorError> {
        let _ = self.adc_channel;
        if SIM_FAIL.load(Ordering::Relaxed) {
            return Err(SensorError::ReadFailed);
        }
        let mm = f32::from_bits(SIM_LEVEL_MM.load(Ordering::Relaxed));
        Ok((mm / MM_PER_COUNT) as u16)
    }
}

impl SensorPort for AnalogLevelSensor {
    fn sample(&mut self) -> Result<RawSample, SensorError> {
        let counts = self.read_counts()?;
        let distance_mm = f32::from(counts) * MM_PER_COUNT;

        if !(MIN_PLAUSIBLE_MM..=MAX_PLAUSIBLE_MM).contains(&distance_mm) {
            return Ok(RawSample::invalid(distance_mm));
        }
        Ok(RawSample::new(distance_mm))
    }
}
