//! System configuration parameters
//!
//! All tunable parameters for the flume monitor node. Everything here is
//! fixed at boot: the config is built from defaults (or compiled-in
//! overrides), validated once, and never mutated afterwards — there is no
//! runtime reconfiguration surface.

use serde::{Deserialize, Serialize};

/// Upper bound on the per-cycle sample batch (stack-allocated in the sampler).
pub const MAX_BATCH_SAMPLES: usize = 32;

/// Millimetres per inch. The flume geometry is surveyed in inches.
pub fn in_to_mm(inches: f32) -> f32 {
    inches * 25.4
}

/// Inches per millimetre.
pub fn mm_to_in(mm: f32) -> f32 {
    mm / 25.4
}

// --- Surveyed flume geometry (inches) ---
// Sensor face sits 9.25" above the dry flume floor; a full flume reads
// 3.00" of water; the slump dip below the sensor holds another 1.2".
const SENSOR_HEIGHT_IN: f32 = 9.25;
const RISER_HEIGHT_IN: f32 = 0.00;
const FILL_HEIGHT_IN: f32 = 3.00;
const FLUME_SLUMP_IN: f32 = 1.2;

/// Calibration constants for the level sensor over the flume.
///
/// The sensor measures distance to the water surface, so a lower raw
/// distance means a higher water level. `empty_level_mm` is the distance to
/// the dry floor; `full_level_mm` the distance to the surface when full.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Distance from sensor to flume floor when empty (mm)
    pub empty_level_mm: f32,
    /// Distance from sensor to water surface when full (mm)
    pub full_level_mm: f32,
    /// Whether to correct for the slump dip beneath the sensor
    pub slump_correction: bool,
    /// Depth of the slump dip (mm)
    pub slump_mm: f32,
    /// Outlier rejection threshold, as a fraction of the dynamic range
    pub spike_fraction: f32,
    /// Raw readings drawn per cycle for smoothing
    pub samples_per_cycle: u8,
    /// Depths within this of zero classify as ZERO (mm)
    pub zero_epsilon_mm: f32,
    /// Depth must exceed the full threshold by this much to classify
    /// as OVERFILL (mm)
    pub overfill_margin_mm: f32,
}

impl CalibrationConfig {
    /// Usable depth span: distance between empty and full levels (mm).
    pub fn span_mm(&self) -> f32 {
        self.empty_level_mm - self.full_level_mm
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        let empty_level_mm = in_to_mm(SENSOR_HEIGHT_IN + RISER_HEIGHT_IN);
        Self {
            empty_level_mm,
            full_level_mm: empty_level_mm - in_to_mm(FILL_HEIGHT_IN),
            slump_correction: true,
            slump_mm: in_to_mm(FLUME_SLUMP_IN),
            spike_fraction: 0.14,
            samples_per_cycle: 8,
            zero_epsilon_mm: 0.5,
            overfill_margin_mm: 10.0,
        }
    }
}

/// Core node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Sensor geometry and smoothing constants
    pub calibration: CalibrationConfig,

    // --- Timing ---
    /// Observation cycle interval (seconds)
    pub cycle_interval_secs: u32,
    /// Clock re-synchronization interval (seconds, much coarser than cycles)
    pub clock_sync_interval_secs: u32,
    /// Per-request timeout for delivery and time-sync exchanges (ms)
    pub http_timeout_ms: u32,

    // --- Durable storage ---
    /// Active log file rotates once its size crosses this limit (bytes)
    pub rotation_limit_bytes: u64,

    // --- Delivery ---
    /// Attempts per observation before it is abandoned to the error log
    pub max_delivery_attempts: u8,
    /// Device identifier on the relay service
    pub device_id: heapless::String<24>,
    /// Relay service host
    pub push_host: heapless::String<48>,
    /// Relay service path
    pub push_path: heapless::String<24>,

    // --- Clock ---
    /// Remote time service host
    pub time_server: heapless::String<48>,
    /// Fixed zone adjustment applied to synchronized time (seconds, signed)
    pub timezone_offset_secs: i32,
}

fn fixed<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    let _ = out.push_str(s);
    out
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            calibration: CalibrationConfig::default(),

            cycle_interval_secs: 60,
            clock_sync_interval_secs: 3600,
            http_timeout_ms: 5000,

            rotation_limit_bytes: 64 * 1024,

            max_delivery_attempts: 3,
            device_id: fixed("v18CD7A17B3D3A00"),
            push_host: fixed("api.pushingbox.com"),
            push_path: fixed("/pushingbox"),

            time_server: fixed("pool.ntp.org"),
            timezone_offset_secs: -18000,
        }
    }
}

/// Range-check every field once at boot. Inconsistent geometry is rejected,
/// not silently clamped.
pub fn validate_config(cfg: &NodeConfig) -> Result<(), &'static str> {
    let cal = &cfg.calibration;
    if !(cal.empty_level_mm > 0.0) {
        return Err("empty_level_mm must be positive");
    }
    if !(cal.full_level_mm > 0.0 && cal.full_level_mm < cal.empty_level_mm) {
        return Err("full_level_mm must be positive and below empty_level_mm");
    }
    if cal.slump_mm < 0.0 || cal.slump_mm >= cal.span_mm() {
        return Err("slump_mm must be in [0, span)");
    }
    if !(cal.spike_fraction > 0.0 && cal.spike_fraction <= 1.0) {
        return Err("spike_fraction must be in (0, 1]");
    }
    if cal.samples_per_cycle == 0 || cal.samples_per_cycle as usize > MAX_BATCH_SAMPLES {
        return Err("samples_per_cycle must be 1..=32");
    }
    if cal.zero_epsilon_mm < 0.0 || cal.zero_epsilon_mm >= cal.span_mm() / 2.0 {
        return Err("zero_epsilon_mm must be small relative to the span");
    }
    if cal.overfill_margin_mm < 0.0 {
        return Err("overfill_margin_mm must be non-negative");
    }
    if !(1..=86_400).contains(&cfg.cycle_interval_secs) {
        return Err("cycle_interval_secs must be 1..=86400");
    }
    if cfg.clock_sync_interval_secs < cfg.cycle_interval_secs {
        return Err("clock_sync_interval_secs must be at least one cycle");
    }
    if !(100..=60_000).contains(&cfg.http_timeout_ms) {
        return Err("http_timeout_ms must be 100..=60000");
    }
    if cfg.rotation_limit_bytes < 1024 {
        return Err("rotation_limit_bytes must be at least 1 KiB");
    }
    if !(1..=10).contains(&cfg.max_delivery_attempts) {
        return Err("max_delivery_attempts must be 1..=10");
    }
    if cfg.device_id.is_empty() {
        return Err("device_id must not be empty");
    }
    if cfg.push_host.is_empty() || cfg.push_path.is_empty() {
        return Err("push_host and push_path must not be empty");
    }
    if cfg.time_server.is_empty() {
        return Err("time_server must not be empty");
    }
    Ok(())
}
