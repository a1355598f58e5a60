//! Notification sinks for alert events.
//!
//! Delivery is best-effort: the poller logs a failed send and moves on.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::engine::{AlertEvent, Severity};

/// Destination for alert events.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver one alert.
    ///
    /// # Errors
    ///
    /// Returns an error if the alert could not be delivered.
    async fn notify(&self, alert: &AlertEvent) -> anyhow::Result<()>;
}

/// Sink that only writes alerts to the log. Used by one-shot checks.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn notify(&self, alert: &AlertEvent) -> anyhow::Result<()> {
        match alert.severity {
            Severity::Info => info!(
                rig = %alert.rig_name,
                kind = ?alert.kind,
                "{}",
                alert.message
            ),
            Severity::Warning | Severity::Critical => warn!(
                rig = %alert.rig_name,
                kind = ?alert.kind,
                gpu = ?alert.gpu_index,
                "{}",
                alert.message
            ),
        }
        Ok(())
    }
}
