//! Tests for `src/engine/mod.rs` — per-rig derivation and alert suppression.

use telemon::engine::{evaluate_rig, evaluate_round, AlertKind, SnapshotMap};
use telemon::rig::{RigSnapshot, Status};

use crate::support::{
    at, dual_rig_config, gpu, healthy_gpu, reading, rig_config, unreachable_error,
};

fn kinds(alerts: &[telemon::engine::AlertEvent]) -> Vec<AlertKind> {
    alerts.iter().map(|a| a.kind).collect()
}

/// An Online snapshot for `rig1` with the given number of healthy GPUs.
fn online_snapshot(gpus: usize) -> RigSnapshot {
    let config = rig_config("rig1");
    let reading = reading((0..gpus).map(healthy_gpu).collect());
    evaluate_rig(&config, None, Ok(reading), at(0)).snapshot
}

#[test]
fn first_successful_poll_announces_rig_online() {
    let config = rig_config("rig1");
    let eval = evaluate_rig(&config, None, Ok(reading(vec![healthy_gpu(0)])), at(0));

    assert_eq!(eval.snapshot.status, Status::Online);
    assert_eq!(kinds(&eval.alerts), vec![AlertKind::RigOnline]);
    assert_eq!(eval.alerts[0].message, "Rig rig1 is now Online");
}

#[test]
fn steady_healthy_rig_emits_nothing() {
    let config = rig_config("rig1");
    let previous = online_snapshot(2);
    let eval = evaluate_rig(
        &config,
        Some(&previous),
        Ok(reading(vec![healthy_gpu(0), healthy_gpu(1)])),
        at(1),
    );

    assert_eq!(eval.snapshot.status, Status::Online);
    assert!(eval.alerts.is_empty());
}

#[test]
fn gpu_count_regression_wounds_with_single_gpu_lost() {
    let config = rig_config("rig1");
    let previous = online_snapshot(3);
    let eval = evaluate_rig(
        &config,
        Some(&previous),
        Ok(reading(vec![healthy_gpu(0), healthy_gpu(1)])),
        at(1),
    );

    assert_eq!(eval.snapshot.status, Status::Wounded);
    assert_eq!(kinds(&eval.alerts), vec![AlertKind::GpuLost]);
    assert_eq!(
        eval.alerts[0].message,
        "ERROR: A GPU has gone down in rig rig1, was 3 now 2."
    );
}

#[test]
fn low_hash_rate_scenario_wounds_rig1() {
    let config = rig_config("rig1");
    let previous = online_snapshot(1);
    let eval = evaluate_rig(
        &config,
        Some(&previous),
        Ok(reading(vec![gpu(0, 90, 60, 70)])),
        at(1),
    );

    assert_eq!(eval.snapshot.status, Status::Wounded);
    assert_eq!(eval.alerts.len(), 1);
    let alert = &eval.alerts[0];
    assert_eq!(alert.kind, AlertKind::HashRateWarning);
    assert_eq!(alert.rig_name, "rig1");
    assert_eq!(alert.gpu_index, Some(0));
    assert!(alert.message.contains("GPU#0 in rig rig1"));
}

#[test]
fn gpu_alerts_use_the_reported_device_index() {
    let config = rig_config("rig1");
    let previous = online_snapshot(2);
    let eval = evaluate_rig(
        &config,
        Some(&previous),
        Ok(reading(vec![healthy_gpu(3), gpu(7, 90, 60, 70)])),
        at(1),
    );

    assert_eq!(eval.alerts.len(), 1);
    assert_eq!(eval.alerts[0].gpu_index, Some(7));
    assert!(eval.alerts[0].message.contains("GPU#7 in rig rig1"));

    let stats = telemon::dispatch::format::rig_stats(&eval.snapshot, config.dual);
    assert!(stats.contains("GPU#7:"));
    assert!(!stats.contains("GPU#1:"));
}

#[test]
fn temperature_outranks_hash_rate() {
    let config = rig_config("rig1");
    let previous = online_snapshot(1);
    let eval = evaluate_rig(
        &config,
        Some(&previous),
        Ok(reading(vec![gpu(0, 90, 85, 70)])),
        at(1),
    );

    assert_eq!(kinds(&eval.alerts), vec![AlertKind::TempWarning]);
    // Temperature is informational; the hash-rate condition never ran.
    assert_eq!(eval.snapshot.status, Status::Online);
}

#[test]
fn fan_warning_is_informational() {
    let config = rig_config("rig1");
    let previous = online_snapshot(1);
    let eval = evaluate_rig(
        &config,
        Some(&previous),
        Ok(reading(vec![gpu(0, 30_000, 60, 45)])),
        at(1),
    );

    assert_eq!(kinds(&eval.alerts), vec![AlertKind::FanWarning]);
    assert_eq!(eval.snapshot.status, Status::Online);
    assert!(eval.alerts[0].message.ends_with("45%"));
}

#[test]
fn non_dual_rig_never_warns_on_alt_hash_rate() {
    let config = rig_config("rig1");
    let previous = online_snapshot(1);
    let mut low_alt = healthy_gpu(0);
    low_alt.alt_hash_rate = 0;
    let eval = evaluate_rig(&config, Some(&previous), Ok(reading(vec![low_alt])), at(1));

    assert!(eval.alerts.is_empty());
    assert_eq!(eval.snapshot.status, Status::Online);
}

#[test]
fn dual_rig_warns_on_alt_hash_rate() {
    let config = dual_rig_config("rig1");
    let previous = online_snapshot(1);
    let mut low_alt = healthy_gpu(0);
    low_alt.alt_hash_rate = 50;
    let eval = evaluate_rig(&config, Some(&previous), Ok(reading(vec![low_alt])), at(1));

    assert_eq!(kinds(&eval.alerts), vec![AlertKind::AltHashRateWarning]);
    assert_eq!(eval.snapshot.status, Status::Wounded);
}

#[test]
fn stuck_gpu_is_excluded_from_snapshot() {
    let config = rig_config("rig1");
    let previous = online_snapshot(2);
    let eval = evaluate_rig(
        &config,
        Some(&previous),
        Ok(reading(vec![healthy_gpu(0), gpu(1, 0, 60, 70)])),
        at(1),
    );

    assert_eq!(kinds(&eval.alerts), vec![AlertKind::GpuStuck]);
    assert_eq!(eval.alerts[0].message, "ERROR: GPU#1 in rig rig1 is stuck. 0Mh/s");
    assert_eq!(eval.snapshot.status, Status::Wounded);
    assert_eq!(eval.snapshot.active_gpu_count(), 1);
}

#[test]
fn gpu_that_stays_stuck_is_not_counted_as_lost() {
    let config = rig_config("rig1");
    let stuck = reading(vec![healthy_gpu(0), gpu(1, 0, 60, 70)]);
    let first = evaluate_rig(&config, Some(&online_snapshot(2)), Ok(stuck.clone()), at(1));
    let second = evaluate_rig(&config, Some(&first.snapshot), Ok(stuck), at(2));

    assert_eq!(kinds(&second.alerts), vec![AlertKind::GpuStuck]);
}

#[test]
fn online_rig_going_unreachable_alerts_once() {
    let config = rig_config("rig1");
    let previous = online_snapshot(2);
    let eval = evaluate_rig(&config, Some(&previous), Err(unreachable_error()), at(1));

    assert_eq!(eval.snapshot.status, Status::Offline);
    assert_eq!(kinds(&eval.alerts), vec![AlertKind::RigOffline]);
    assert!(eval.alerts[0].message.starts_with("ERROR: Rig rig1 not found"));
    assert!(eval.alerts[0].message.contains("timed out"));
}

#[test]
fn unreachable_rig_keeps_last_known_readings() {
    let config = rig_config("rig1");
    let previous = online_snapshot(2);
    let eval = evaluate_rig(&config, Some(&previous), Err(unreachable_error()), at(1));

    assert_eq!(eval.snapshot.gpus, previous.gpus);
    assert_eq!(eval.snapshot.uptime_mins, previous.uptime_mins);
}

#[test]
fn never_seen_unreachable_rig_gets_empty_offline_snapshot() {
    let config = rig_config("rig1");
    let eval = evaluate_rig(&config, None, Err(unreachable_error()), at(0));

    assert_eq!(eval.snapshot.status, Status::Offline);
    assert!(eval.snapshot.gpus.is_empty());
    assert_eq!(kinds(&eval.alerts), vec![AlertKind::RigOffline]);
}

#[test]
fn offline_for_several_cycles_alerts_exactly_once() {
    let config = rig_config("rig1");
    let mut previous = SnapshotMap::new();
    previous.insert("rig1".to_owned(), online_snapshot(1));

    let mut offline_alerts = 0;
    for minute in 1..=4 {
        let round = evaluate_round([(&config, Err(unreachable_error()))], &previous, at(minute));
        offline_alerts += round
            .alerts
            .iter()
            .filter(|a| a.kind == AlertKind::RigOffline)
            .count();
        assert_eq!(round.snapshots["rig1"].status, Status::Offline);
        previous = round.snapshots;
    }

    assert_eq!(offline_alerts, 1);
}

#[test]
fn recovery_from_offline_announces_online() {
    let config = rig_config("rig1");
    let offline = evaluate_rig(&config, None, Err(unreachable_error()), at(0)).snapshot;
    let eval = evaluate_rig(
        &config,
        Some(&offline),
        Ok(reading(vec![healthy_gpu(0)])),
        at(1),
    );

    assert_eq!(kinds(&eval.alerts), vec![AlertKind::RigOnline]);
    assert_eq!(eval.snapshot.status, Status::Online);
}

#[test]
fn round_keeps_rig_then_evaluation_order() {
    let rig1 = rig_config("rig1");
    let rig2 = rig_config("rig2");
    let round = evaluate_round(
        [
            (&rig1, Ok(reading(vec![gpu(0, 90, 60, 70)]))),
            (&rig2, Err(unreachable_error())),
        ],
        &SnapshotMap::new(),
        at(0),
    );

    let summary: Vec<(&str, AlertKind)> = round
        .alerts
        .iter()
        .map(|a| (a.rig_name.as_str(), a.kind))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("rig1", AlertKind::RigOnline),
            ("rig1", AlertKind::HashRateWarning),
            ("rig2", AlertKind::RigOffline),
        ]
    );
    assert_eq!(round.snapshots.len(), 2);
}
