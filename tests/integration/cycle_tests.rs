//! Integration tests for the full cycle pipeline: sample → classify →
//! persist → deliver, driven through [`NodeService`] with mock adapters.

use crate::mock_ports::{MemVolume, MockSensor, ScriptedNet, TestClock, VecSink};

use flumenode::app::events::AppEvent;
use flumenode::app::observation::{trim_precision, LevelState, Observation};
use flumenode::app::ports::VolumePort;
use flumenode::app::service::NodeService;
use flumenode::app::store::{ERROR_LOG, LOG_FILES};
use flumenode::config::NodeConfig;

fn cfg_no_slump() -> NodeConfig {
    let mut cfg = NodeConfig::default();
    cfg.calibration.slump_correction = false;
    cfg
}

fn open(cfg: NodeConfig, vol: &mut MemVolume) -> NodeService {
    NodeService::open(cfg, vol).expect("service open")
}

/// Run `n` cycles, advancing the clock one interval per cycle.
#[allow(clippy::too_many_arguments)]
fn run_cycles(
    n: usize,
    node: &mut NodeService,
    sensor: &mut MockSensor,
    vol: &mut MemVolume,
    net: &mut ScriptedNet,
    clock: &mut TestClock,
    sink: &mut VecSink,
) {
    for _ in 0..n {
        node.run_cycle(sensor, vol, net, clock, sink);
        clock.now += 60;
    }
}

fn last_record(vol: &MemVolume, file: &str) -> Observation {
    let line = vol.last_line(file).expect("a record line");
    Observation::from_record_line(&line).expect("parsable record")
}

// ── Threshold scenarios ───────────────────────────────────────

#[test]
fn steady_empty_level_records_zero() {
    let cfg = cfg_no_slump();
    let mut sensor = MockSensor::steady(cfg.calibration.empty_level_mm);
    let mut vol = MemVolume::new();
    let mut net = ScriptedNet::accepting();
    let mut clock = TestClock::at(1_722_945_600);
    let mut sink = VecSink::new();

    let mut node = open(cfg, &mut vol);
    run_cycles(1, &mut node, &mut sensor, &mut vol, &mut net, &mut clock, &mut sink);

    let obs = last_record(&vol, LOG_FILES[0]);
    assert_eq!(obs.depth_mm, 0.0);
    assert_eq!(obs.state, LevelState::Zero);
    assert_eq!(obs.timestamp, 1_722_945_600);
}

#[test]
fn steady_full_level_records_full_span() {
    let cfg = cfg_no_slump();
    let span = cfg.calibration.span_mm();
    let mut sensor = MockSensor::steady(cfg.calibration.full_level_mm);
    let mut vol = MemVolume::new();
    let mut net = ScriptedNet::accepting();
    let mut clock = TestClock::at(1_722_945_600);
    let mut sink = VecSink::new();

    let mut node = open(cfg, &mut vol);
    run_cycles(1, &mut node, &mut sensor, &mut vol, &mut net, &mut clock, &mut sink);

    let obs = last_record(&vol, LOG_FILES[0]);
    assert_eq!(obs.depth_mm, trim_precision(span));
    assert_eq!(obs.state, LevelState::Full);
}

#[test]
fn beyond_overfill_margin_records_overfill() {
    let cfg = cfg_no_slump();
    let distance = cfg.calibration.full_level_mm - cfg.calibration.overfill_margin_mm - 1.0;
    let mut sensor = MockSensor::steady(distance);
    let mut vol = MemVolume::new();
    let mut net = ScriptedNet::accepting();
    let mut clock = TestClock::at(1_722_945_600);
    let mut sink = VecSink::new();

    let mut node = open(cfg, &mut vol);
    run_cycles(1, &mut node, &mut sensor, &mut vol, &mut net, &mut clock, &mut sink);

    let obs = last_record(&vol, LOG_FILES[0]);
    assert_eq!(obs.state, LevelState::Overfill);
}

// ── Sensor fault degradation ──────────────────────────────────

#[test]
fn all_fault_batch_records_err_without_crash() {
    let cfg = cfg_no_slump();
    let mut sensor = MockSensor::steady(0.0);
    sensor.failing = true;
    let mut vol = MemVolume::new();
    let mut net = ScriptedNet::accepting();
    let mut clock = TestClock::at(1_722_945_600);
    let mut sink = VecSink::new();

    let mut node = open(cfg, &mut vol);
    run_cycles(1, &mut node, &mut sensor, &mut vol, &mut net, &mut clock, &mut sink);

    let line = vol.last_line(LOG_FILES[0]).unwrap();
    assert!(line.contains("\"state\":\"ERR\""));
    assert!(line.contains("\"raw\":null"));
    assert_eq!(node.last_state(), Some(LevelState::Err));
}

#[test]
fn err_depth_carries_last_known_value() {
    let cfg = cfg_no_slump();
    let mid = cfg.calibration.empty_level_mm - cfg.calibration.span_mm() / 2.0;
    let mut sensor = MockSensor::steady(mid);
    let mut vol = MemVolume::new();
    let mut net = ScriptedNet::accepting();
    let mut clock = TestClock::at(1_722_945_600);
    let mut sink = VecSink::new();

    let mut node = open(cfg, &mut vol);
    run_cycles(1, &mut node, &mut sensor, &mut vol, &mut net, &mut clock, &mut sink);
    let good = last_record(&vol, LOG_FILES[0]);
    assert_eq!(good.state, LevelState::Ok);

    sensor.failing = true;
    run_cycles(1, &mut node, &mut sensor, &mut vol, &mut net, &mut clock, &mut sink);
    let err = last_record(&vol, LOG_FILES[0]);
    assert_eq!(err.state, LevelState::Err);
    assert_eq!(err.depth_mm, good.depth_mm, "non-authoritative last-known depth");
}

// ── Durable logging ───────────────────────────────────────────

#[test]
fn observations_append_in_cycle_order() {
    let cfg = cfg_no_slump();
    let mid = cfg.calibration.empty_level_mm - 20.0;
    let mut sensor = MockSensor::steady(mid);
    let mut vol = MemVolume::new();
    let mut net = ScriptedNet::accepting();
    let mut clock = TestClock::at(1_000_000);
    let mut sink = VecSink::new();

    let mut node = open(cfg, &mut vol);
    run_cycles(5, &mut node, &mut sensor, &mut vol, &mut net, &mut clock, &mut sink);

    let body = vol.contents(LOG_FILES[0]);
    let stamps: Vec<i64> = body
        .lines()
        .map(|l| Observation::from_record_line(l).unwrap().timestamp)
        .collect();
    assert_eq!(stamps.len(), 5);
    assert!(stamps.windows(2).all(|w| w[0] < w[1]), "append order = cycle order");
}

#[test]
fn rotation_mid_run_freezes_previous_file() {
    let mut cfg = cfg_no_slump();
    cfg.rotation_limit_bytes = 1024;
    let limit = cfg.rotation_limit_bytes;
    let mid = cfg.calibration.empty_level_mm - 20.0;
    let mut sensor = MockSensor::steady(mid);
    let mut vol = MemVolume::new();
    let mut net = ScriptedNet::accepting();
    let mut clock = TestClock::at(1_722_945_600);
    let mut sink = VecSink::new();

    let mut node = open(cfg, &mut vol);
    run_cycles(25, &mut node, &mut sensor, &mut vol, &mut net, &mut clock, &mut sink);

    let rotations = sink.count(|e| matches!(e, AppEvent::Rotated { .. }));
    assert_eq!(rotations, 1, "one rotation in 25 cycles at this limit");

    let frozen = vol.lines(LOG_FILES[0]);
    let active = vol.lines(LOG_FILES[1]);
    assert!(frozen > 0, "previously active file left retrievable");
    assert_eq!(frozen + active, 25, "every observation in exactly one file");
    assert!(
        vol.size(LOG_FILES[0]).unwrap() > limit,
        "rotation happened after the limit was crossed"
    );
}

#[test]
fn storage_fault_logs_error_and_still_delivers() {
    let cfg = cfg_no_slump();
    let mid = cfg.calibration.empty_level_mm - 20.0;
    let mut sensor = MockSensor::steady(mid);
    let mut vol = MemVolume::new();
    vol.fail_data_appends = true;
    let mut net = ScriptedNet::accepting();
    let mut clock = TestClock::at(1_722_945_600);
    let mut sink = VecSink::new();

    let mut node = open(cfg, &mut vol);
    run_cycles(1, &mut node, &mut sensor, &mut vol, &mut net, &mut clock, &mut sink);

    assert!(vol.contents(ERROR_LOG).contains("append failed"));
    assert_eq!(net.requests.len(), 1, "delivery still attempted from memory");
    assert_eq!(vol.lines(LOG_FILES[0]), 0);
}

// ── Delivery ──────────────────────────────────────────────────

#[test]
fn delivered_observations_are_not_resubmitted() {
    let cfg = cfg_no_slump();
    let mid = cfg.calibration.empty_level_mm - 20.0;
    let mut sensor = MockSensor::steady(mid);
    let mut vol = MemVolume::new();
    let mut net = ScriptedNet::accepting();
    let mut clock = TestClock::at(1_000_000);
    let mut sink = VecSink::new();

    let mut node = open(cfg, &mut vol);
    run_cycles(3, &mut node, &mut sensor, &mut vol, &mut net, &mut clock, &mut sink);

    assert_eq!(net.requests.len(), 3, "each observation pushed exactly once");
    assert!(net.requests[0].contains("ts=1000000"));
    assert!(net.requests[1].contains("ts=1000060"));
    assert!(net.requests[2].contains("ts=1000120"));
    assert_eq!(node.pending_len(), 0);
}

#[test]
fn three_timeouts_abandon_oldest_but_keep_newer_flowing() {
    let cfg = cfg_no_slump();
    let mid = cfg.calibration.empty_level_mm - 20.0;
    let mut sensor = MockSensor::steady(mid);
    let mut vol = MemVolume::new();
    let mut net = ScriptedNet::refusing();
    let mut clock = TestClock::at(1_000_000);
    let mut sink = VecSink::new();

    let mut node = open(cfg, &mut vol);
    run_cycles(3, &mut node, &mut sensor, &mut vol, &mut net, &mut clock, &mut sink);

    // First observation exhausted its three attempts and was abandoned;
    // the two younger ones are still pending.
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::DeliveryAbandoned { .. })),
        1
    );
    assert!(vol
        .contents(ERROR_LOG)
        .contains("delivery abandoned after 3 attempts"));
    assert_eq!(node.pending_len(), 2);

    // Connectivity returns: everything still pending (plus the new cycle's
    // observation) drains, the abandoned one is never retried.
    let mut good_net = ScriptedNet::accepting();
    run_cycles(1, &mut node, &mut sensor, &mut vol, &mut good_net, &mut clock, &mut sink);

    assert_eq!(good_net.requests.len(), 3);
    assert!(
        good_net.requests.iter().all(|r| !r.contains("ts=1000000")),
        "abandoned observation stays abandoned"
    );
    assert_eq!(node.pending_len(), 0);
}

// ── Clock handling ────────────────────────────────────────────

#[test]
fn clock_syncs_on_coarse_cadence_only() {
    let cfg = cfg_no_slump(); // 60 s cycles, 3600 s sync interval
    let mid = cfg.calibration.empty_level_mm - 20.0;
    let mut sensor = MockSensor::steady(mid);
    let mut vol = MemVolume::new();
    let mut net = ScriptedNet::accepting();
    let mut clock = TestClock::at(1_000_000);
    let mut sink = VecSink::new();

    let mut node = open(cfg, &mut vol);
    run_cycles(5, &mut node, &mut sensor, &mut vol, &mut net, &mut clock, &mut sink);

    assert_eq!(clock.syncs, 1, "first cycle only within one sync interval");
    assert_eq!(sink.count(|e| matches!(e, AppEvent::ClockSynced)), 1);
}

#[test]
fn every_cycle_syncs_when_intervals_match() {
    let mut cfg = cfg_no_slump();
    cfg.clock_sync_interval_secs = cfg.cycle_interval_secs;
    let mid = cfg.calibration.empty_level_mm - 20.0;
    let mut sensor = MockSensor::steady(mid);
    let mut vol = MemVolume::new();
    let mut net = ScriptedNet::accepting();
    let mut clock = TestClock::at(1_000_000);
    let mut sink = VecSink::new();

    let mut node = open(cfg, &mut vol);
    run_cycles(4, &mut node, &mut sensor, &mut vol, &mut net, &mut clock, &mut sink);

    assert_eq!(clock.syncs, 4);
}

#[test]
fn failed_sync_never_blocks_sampling() {
    let cfg = cfg_no_slump();
    let mid = cfg.calibration.empty_level_mm - 20.0;
    let mut sensor = MockSensor::steady(mid);
    let mut vol = MemVolume::new();
    let mut net = ScriptedNet::accepting();
    let mut clock = TestClock::at(1_000_000);
    clock.fail_sync = true;
    let mut sink = VecSink::new();

    let mut node = open(cfg, &mut vol);
    run_cycles(2, &mut node, &mut sensor, &mut vol, &mut net, &mut clock, &mut sink);

    assert_eq!(clock.syncs, 0);
    assert_eq!(vol.lines(LOG_FILES[0]), 2, "observations recorded regardless");
    assert_eq!(sink.count(|e| matches!(e, AppEvent::ClockSynced)), 0);
}

// ── State transitions ─────────────────────────────────────────

#[test]
fn state_change_emits_event() {
    let cfg = cfg_no_slump();
    let mut sensor = MockSensor::steady(cfg.calibration.empty_level_mm);
    let full = cfg.calibration.full_level_mm;
    let mut vol = MemVolume::new();
    let mut net = ScriptedNet::accepting();
    let mut clock = TestClock::at(1_000_000);
    let mut sink = VecSink::new();

    let mut node = open(cfg, &mut vol);
    run_cycles(1, &mut node, &mut sensor, &mut vol, &mut net, &mut clock, &mut sink);
    sensor.distance_mm = full;
    run_cycles(1, &mut node, &mut sensor, &mut vol, &mut net, &mut clock, &mut sink);

    assert_eq!(
        sink.count(|e| matches!(
            e,
            AppEvent::StateChanged {
                from: LevelState::Zero,
                to: LevelState::Full
            }
        )),
        1
    );
}
