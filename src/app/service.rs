//! Node service — the orchestrator that drives one observation cycle.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                 │         NodeService          │
//!  ClockPort  ──▶ │ sampler · classifier · store │ ──▶ DeliveryPort
//!                 │          uploader            │
//!                 └──────────────┬───────────────┘
//!                                ▼
//!                            VolumePort
//! ```
//!
//! Strictly sequential: each cycle runs sample → classify → persist →
//! deliver to completion before the next begins, so the storage and
//! network peripherals are never addressed at the same time. Ports are
//! injected at call sites, making the whole pipeline testable with mock
//! adapters.

use core::time::Duration;

use log::{error, info, warn};

use crate::config::{validate_config, NodeConfig};
use crate::error::{Error, Result};

use super::classifier::LevelClassifier;
use super::events::AppEvent;
use super::observation::{LevelState, Observation};
use super::ports::{ClockPort, DeliveryPort, EventSink, SensorPort, VolumePort};
use super::sampler::SensorSampler;
use super::store::RecordStore;
use super::uploader::UploadClient;

pub struct NodeService {
    config: NodeConfig,
    sampler: SensorSampler,
    classifier: LevelClassifier,
    store: RecordStore,
    uploader: UploadClient,

    cycle_count: u64,
    /// Cycles between clock synchronizations (coarser than sampling).
    sync_every: u32,
    cycles_since_sync: u32,
    /// Carried into ERR observations, whose depth is non-authoritative.
    last_depth_mm: f32,
    last_state: Option<LevelState>,
}

impl NodeService {
    /// Validate the configuration and open the record store on the volume.
    pub fn open(config: NodeConfig, vol: &mut impl VolumePort) -> Result<Self> {
        validate_config(&config).map_err(Error::Config)?;

        let store = RecordStore::open(vol, config.rotation_limit_bytes)?;
        let sampler = SensorSampler::new(&config.calibration);
        let classifier = LevelClassifier::new(&config.calibration);
        let uploader = UploadClient::new(&config);
        let sync_every = (config.clock_sync_interval_secs / config.cycle_interval_secs).max(1);

        Ok(Self {
            config,
            sampler,
            classifier,
            store,
            uploader,
            cycle_count: 0,
            sync_every,
            // Sync on the very first cycle.
            cycles_since_sync: sync_every,
            last_depth_mm: 0.0,
            last_state: None,
        })
    }

    pub fn start(&mut self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Started);
        info!(
            "node started: cycle={}s, sync every {} cycles, active log {}",
            self.config.cycle_interval_secs,
            self.sync_every,
            self.store.active_file()
        );
    }

    /// How long the main loop sleeps between cycles.
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.config.cycle_interval_secs))
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    pub fn pending_len(&self) -> usize {
        self.store.pending().len()
    }

    pub fn last_state(&self) -> Option<LevelState> {
        self.last_state
    }

    /// Run one full cycle: sync clock when due, sample, classify, persist,
    /// then attempt delivery of everything pending, oldest first.
    pub fn run_cycle(
        &mut self,
        sensor: &mut impl SensorPort,
        vol: &mut impl VolumePort,
        net: &mut impl DeliveryPort,
        clock: &mut impl ClockPort,
        sink: &mut impl EventSink,
    ) {
        self.cycle_count += 1;

        // 1. Clock refresh on the coarse cadence. Failure degrades to the
        //    last-known time and waits for the next due point.
        if self.cycles_since_sync >= self.sync_every {
            match clock.synchronize() {
                Ok(()) => {
                    info!("clock synchronized");
                    sink.emit(&AppEvent::ClockSynced);
                }
                Err(e) => warn!("clock sync failed ({e}), keeping last-known time"),
            }
            self.cycles_since_sync = 0;
        }
        self.cycles_since_sync += 1;

        let ts = clock.now_local();

        // 2./3. Sample and classify, or synthesize an ERR observation.
        let (obs, retained, rejected) = match self.sampler.sample(sensor) {
            Ok(reading) => {
                let (depth_mm, state) = self.classifier.classify(&reading);
                self.last_depth_mm = depth_mm;
                (
                    Observation::new(ts, Some(reading.distance_mm), depth_mm, state),
                    reading.retained,
                    reading.rejected,
                )
            }
            Err(fault) => {
                warn!("sampling fault: {fault}");
                (
                    Observation::new(ts, None, self.last_depth_mm, LevelState::Err),
                    0,
                    0,
                )
            }
        };

        // 4. Persist. A failed append goes to the error log; the
        //    observation stays eligible for delivery from memory.
        match self.store.append(vol, &obs) {
            Ok(appended) => {
                if appended.rotated {
                    info!("log rotated, now appending to {}", self.store.active_file());
                    sink.emit(&AppEvent::Rotated {
                        active: self.store.active_file(),
                    });
                }
            }
            Err(e) => {
                error!("record append failed: {e}");
                self.store
                    .log_error(vol, ts, &format!("append failed: {e}"));
            }
        }

        if let Some(prev) = self.last_state {
            if prev != obs.state {
                sink.emit(&AppEvent::StateChanged {
                    from: prev,
                    to: obs.state,
                });
            }
        }
        self.last_state = Some(obs.state);

        sink.emit(&AppEvent::Recorded {
            observation: obs,
            retained,
            rejected,
        });

        // 5. Enqueue and flush, oldest first. The storage write above has
        //    completed before the first network exchange begins.
        self.store.push_pending(vol, obs);
        self.uploader
            .flush_pending(&mut self.store, vol, net, sink);
    }
}
