//! Health derivation: turns one poll's readings into snapshots and alerts.
//!
//! Everything here is pure. The poller supplies the previous cycle's
//! snapshots and this cycle's fetch outcomes; the engine returns the next
//! snapshot map and the alerts to forward, and never touches shared state.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::rig::{GpuReading, ProbeError, RigConfig, RigReading, RigSnapshot, Status, Thresholds};

pub mod alert;

pub use alert::{AlertEvent, AlertKind, Severity};

/// Fan warnings fire this many points below the configured fan speed.
pub const FAN_SPEED_MARGIN: u32 = 5;

/// Snapshots keyed by rig name.
pub type SnapshotMap = HashMap<String, RigSnapshot>;

/// Result of asking one rig for its status.
pub type FetchOutcome = Result<RigReading, ProbeError>;

/// Snapshot and alerts derived for one rig.
#[derive(Debug, Clone)]
pub struct RigEvaluation {
    /// The rig's new snapshot.
    pub snapshot: RigSnapshot,
    /// Alerts to forward, in evaluation order.
    pub alerts: Vec<AlertEvent>,
}

/// Snapshots and alerts derived for a whole poll round.
#[derive(Debug, Clone, Default)]
pub struct RoundOutcome {
    /// One snapshot per rig that was polled.
    pub snapshots: SnapshotMap,
    /// All alerts from the round, in rig then evaluation order.
    pub alerts: Vec<AlertEvent>,
}

/// Evaluate every rig's outcome against the previous cycle's snapshots.
pub fn evaluate_round<'a, I>(outcomes: I, previous: &SnapshotMap, now: DateTime<Utc>) -> RoundOutcome
where
    I: IntoIterator<Item = (&'a RigConfig, FetchOutcome)>,
{
    let mut round = RoundOutcome::default();
    for (config, outcome) in outcomes {
        let evaluation = evaluate_rig(config, previous.get(&config.name), outcome, now);
        round.alerts.extend(evaluation.alerts);
        round
            .snapshots
            .insert(config.name.clone(), evaluation.snapshot);
    }
    round
}

/// Derive one rig's snapshot and alerts.
///
/// Order: unreachable, came online, GPU count regression, then per-GPU
/// checks. An unreachable rig is Offline and nothing else is evaluated.
pub fn evaluate_rig(
    config: &RigConfig,
    previous: Option<&RigSnapshot>,
    outcome: FetchOutcome,
    now: DateTime<Utc>,
) -> RigEvaluation {
    let reading = match outcome {
        Ok(reading) => reading,
        Err(error) => return evaluate_unreachable(config, previous, &error, now),
    };

    let name = config.name.as_str();
    let mut alerts = Vec::new();
    let mut status = Status::Online;

    if previous.is_none_or(|p| p.status == Status::Offline) {
        alerts.push(AlertEvent::rig_online(name, now));
    }

    if let Some(prev) = previous {
        let was = prev.active_gpu_count();
        let current = reading.gpus.len();
        if was > current {
            alerts.push(AlertEvent::gpu_lost(name, was, current, now));
            status = Status::Wounded;
        }
    }

    let mut gpus = Vec::with_capacity(reading.gpus.len());
    for gpu in &reading.gpus {
        let Some(kind) = classify_gpu(gpu, &config.thresholds, config.dual) else {
            gpus.push(*gpu);
            continue;
        };
        alerts.push(AlertEvent::gpu(kind, name, gpu, now));
        if kind.wounds() {
            status = Status::Wounded;
        }
        if kind != AlertKind::GpuStuck {
            gpus.push(*gpu);
        }
    }

    let snapshot = RigSnapshot {
        name: config.name.clone(),
        coin_name: config.coin_name.clone(),
        coin_tag: config.coin_tag.clone(),
        status,
        version: reading.version,
        uptime_mins: reading.uptime_mins,
        main_session: reading.main_session,
        alt_session: reading.alt_session,
        main_pool: reading.main_pool,
        alt_pool: reading.alt_pool,
        gpus,
        observed_at: now,
    };

    RigEvaluation { snapshot, alerts }
}

/// First matching per-GPU condition, in priority order:
/// stuck, temperature, fan, main hash rate, alt hash rate (dual rigs only).
pub fn classify_gpu(gpu: &GpuReading, thresholds: &Thresholds, dual: bool) -> Option<AlertKind> {
    if gpu.is_stuck() {
        return Some(AlertKind::GpuStuck);
    }
    if gpu.temperature >= thresholds.temperature {
        return Some(AlertKind::TempWarning);
    }
    let fan_floor = thresholds.fan_speed.checked_sub(FAN_SPEED_MARGIN);
    if fan_floor.is_some_and(|floor| gpu.fan_speed <= floor) {
        return Some(AlertKind::FanWarning);
    }
    if gpu.hash_rate <= thresholds.hash_rate {
        return Some(AlertKind::HashRateWarning);
    }
    if dual && gpu.alt_hash_rate <= thresholds.alt_hash_rate {
        return Some(AlertKind::AltHashRateWarning);
    }
    None
}

fn evaluate_unreachable(
    config: &RigConfig,
    previous: Option<&RigSnapshot>,
    error: &ProbeError,
    now: DateTime<Utc>,
) -> RigEvaluation {
    let mut alerts = Vec::new();
    if !previous.is_some_and(|p| p.status == Status::Offline) {
        alerts.push(AlertEvent::rig_offline(&config.name, &error.to_string(), now));
    }

    // Keep the last known readings so status queries still show something.
    let mut snapshot = previous
        .cloned()
        .unwrap_or_else(|| RigSnapshot::unreachable(config, now));
    snapshot.status = Status::Offline;

    RigEvaluation { snapshot, alerts }
}
