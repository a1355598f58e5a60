//! The health polling loop.
//!
//! One long-lived task. Each tick fetches every registered rig in order,
//! evaluates the round, publishes it to [`FleetState`], then forwards the
//! alerts. Rounds never overlap; a slow round pushes the next tick back.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::engine::{self, AlertEvent, FetchOutcome};
use crate::fleet::{FleetState, FleetView};
use crate::notify::NotificationSink;
use crate::rig::{RigConfig, RigRegistry};

/// Summary of one completed round.
#[derive(Debug, Clone)]
pub struct RoundReport {
    /// The view that was published.
    pub view: Arc<FleetView>,
    /// Alerts produced by the round.
    pub alerts: Vec<AlertEvent>,
    /// Alerts the sink failed to deliver.
    pub failed_deliveries: usize,
}

/// Drives the sampling cadence for the whole fleet.
pub struct HealthPoller {
    registry: Arc<RigRegistry>,
    fleet: Arc<FleetState>,
    sink: Arc<dyn NotificationSink>,
    interval: Duration,
}

impl HealthPoller {
    /// Create a poller.
    pub fn new(
        registry: Arc<RigRegistry>,
        fleet: Arc<FleetState>,
        sink: Arc<dyn NotificationSink>,
        interval: Duration,
    ) -> Self {
        Self {
            registry,
            fleet,
            sink,
            interval,
        }
    }

    /// Run rounds until `shutdown_rx` flips to `true` or its sender drops.
    ///
    /// The first round starts immediately. Shutdown is only observed between
    /// rounds; an in-flight round always completes.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(
            interval_secs = self.interval.as_secs(),
            rigs = self.registry.len(),
            "health poller started"
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.poll_round().await;
                }
                result = shutdown_rx.changed() => {
                    if result.is_err() || *shutdown_rx.borrow() {
                        info!("health poller shutting down");
                        break;
                    }
                }
            }
        }

        info!("health poller stopped");
    }

    /// Fetch every rig once, publish the round, and forward its alerts.
    pub async fn poll_round(&self) -> RoundReport {
        let mut outcomes: Vec<(&RigConfig, FetchOutcome)> = Vec::with_capacity(self.registry.len());
        for entry in self.registry.iter() {
            let outcome = entry.probe().fetch_status().await;
            if let Err(e) = &outcome {
                debug!(rig = %entry.name(), error = %e, "rig fetch failed");
            }
            outcomes.push((entry.config(), outcome));
        }

        let previous = self.fleet.load();
        let now = Utc::now();
        let round = engine::evaluate_round(outcomes, &previous.current, now);
        let view = self.fleet.commit(round.snapshots, now);

        let mut failed_deliveries: usize = 0;
        for alert in &round.alerts {
            if let Err(e) = self.sink.notify(alert).await {
                failed_deliveries = failed_deliveries.saturating_add(1);
                warn!(
                    rig = %alert.rig_name,
                    kind = ?alert.kind,
                    error = %e,
                    "failed to deliver alert"
                );
            }
        }

        debug!(
            round = view.round,
            alerts = round.alerts.len(),
            failed_deliveries,
            "poll round complete"
        );

        RoundReport {
            view,
            alerts: round.alerts,
            failed_deliveries,
        }
    }
}
