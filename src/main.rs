//! Flume monitor node — main entry point.
//!
//! Hexagonal architecture with a strictly sequential cycle loop.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │                                                              │
//! │  AnalogLevelSensor   SdVolume   HttpPushClient   SntpClock   │
//! │  (SensorPort)        (VolumePort) (DeliveryPort) (ClockPort) │
//! │  LogEventSink (EventSink)                                    │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ───────────────        │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────┐      │
//! │  │             NodeService (pure logic)               │      │
//! │  │  sampler · classifier · store · uploader           │      │
//! │  └────────────────────────────────────────────────────┘      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use log::info;

use flumenode::adapters::analog_level::AnalogLevelSensor;
use flumenode::adapters::http_push::HttpPushClient;
use flumenode::adapters::log_sink::LogEventSink;
use flumenode::adapters::sd_volume::SdVolume;
use flumenode::adapters::sntp_clock::SntpClock;
use flumenode::app::service::NodeService;
use flumenode::config::NodeConfig;

/// Level sensor return line: analog input channel 2.
const LEVEL_ADC_CHANNEL: i32 = 2;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init().context("logger init")?;

    info!("flumenode v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Boot-time configuration ────────────────────────────
    // The full surface is fixed here; there is no runtime
    // reconfiguration path.
    let config = NodeConfig::default();

    // ── 3. Construct adapters ─────────────────────────────────
    let mut sensor = AnalogLevelSensor::new(LEVEL_ADC_CHANNEL);

    #[cfg(target_os = "espidf")]
    let mut volume = SdVolume::mount()
        .map_err(|e| anyhow::anyhow!("SD mount failed: {e}"))?;
    #[cfg(not(target_os = "espidf"))]
    let mut volume =
        SdVolume::new("flume-data").map_err(|e| anyhow::anyhow!("volume open failed: {e}"))?;

    let mut net = HttpPushClient::new(&config);
    let mut clock = SntpClock::new(&config);
    let mut sink = LogEventSink::new();

    // ── 4. Construct the service ──────────────────────────────
    let mut node = NodeService::open(config, &mut volume)
        .map_err(|e| anyhow::anyhow!("service open failed: {e}"))?;
    node.start(&mut sink);

    // ── 5. Cycle loop ─────────────────────────────────────────
    // One cycle runs to completion, then the task sleeps out the
    // remainder of the interval. Every collaborator call inside the
    // cycle is bounded by its adapter's timeout, so a slow dependency
    // costs at most one cycle period.
    let interval = node.cycle_interval();
    loop {
        node.run_cycle(&mut sensor, &mut volume, &mut net, &mut clock, &mut sink);
        std::thread::sleep(interval);
    }
}
