//! Alert events emitted by the engine and forwarded to the notification sink.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rig::{to_mhs, GpuReading};

/// How urgent an alert is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Good news or state recovery.
    Info,
    /// Degraded reading that may need attention.
    Warning,
    /// Rig or device down.
    Critical,
}

/// What condition an alert reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Rig stopped answering.
    RigOffline,
    /// Rig answered for the first time, or again after being offline.
    RigOnline,
    /// Fewer GPUs than the previous cycle.
    GpuLost,
    /// GPU enumerated but not hashing.
    GpuStuck,
    /// GPU at or above the temperature threshold.
    TempWarning,
    /// GPU fan below the fan speed threshold margin.
    FanWarning,
    /// GPU main hash rate at or below threshold.
    HashRateWarning,
    /// GPU alt hash rate at or below threshold.
    AltHashRateWarning,
}

impl AlertKind {
    /// Severity attached to this kind.
    pub fn severity(self) -> Severity {
        match self {
            Self::RigOnline => Severity::Info,
            Self::RigOffline | Self::GpuLost | Self::GpuStuck => Severity::Critical,
            Self::TempWarning
            | Self::FanWarning
            | Self::HashRateWarning
            | Self::AltHashRateWarning => Severity::Warning,
        }
    }

    /// Rig-level kinds fire once per state change; per-GPU kinds every cycle.
    pub fn is_transition(self) -> bool {
        matches!(self, Self::RigOffline | Self::RigOnline | Self::GpuLost)
    }

    /// Whether this condition marks the rig as wounded.
    pub fn wounds(self) -> bool {
        matches!(
            self,
            Self::GpuLost | Self::GpuStuck | Self::HashRateWarning | Self::AltHashRateWarning
        )
    }
}

/// A single notification produced by one poll cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertEvent {
    /// Condition being reported.
    pub kind: AlertKind,
    /// Urgency.
    pub severity: Severity,
    /// Rig the alert concerns.
    pub rig_name: String,
    /// GPU position, for per-GPU alerts.
    pub gpu_index: Option<usize>,
    /// Human-readable text.
    pub message: String,
    /// When the condition was observed.
    pub timestamp: DateTime<Utc>,
}

impl AlertEvent {
    fn new(
        kind: AlertKind,
        rig_name: &str,
        gpu_index: Option<usize>,
        message: String,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            rig_name: rig_name.to_owned(),
            gpu_index,
            message,
            timestamp,
        }
    }

    /// Rig failed to answer this cycle.
    pub fn rig_offline(rig_name: &str, error: &str, at: DateTime<Utc>) -> Self {
        Self::new(
            AlertKind::RigOffline,
            rig_name,
            None,
            format!("ERROR: Rig {rig_name} not found: {error}"),
            at,
        )
    }

    /// Rig answered after being unseen or offline.
    pub fn rig_online(rig_name: &str, at: DateTime<Utc>) -> Self {
        Self::new(
            AlertKind::RigOnline,
            rig_name,
            None,
            format!("Rig {rig_name} is now Online"),
            at,
        )
    }

    /// Active GPU count dropped between cycles.
    pub fn gpu_lost(rig_name: &str, was: usize, now: usize, at: DateTime<Utc>) -> Self {
        Self::new(
            AlertKind::GpuLost,
            rig_name,
            None,
            format!("ERROR: A GPU has gone down in rig {rig_name}, was {was} now {now}."),
            at,
        )
    }

    /// Per-GPU condition, named by the device's own index. `kind` must be
    /// one of the per-GPU kinds.
    pub fn gpu(kind: AlertKind, rig_name: &str, gpu: &GpuReading, at: DateTime<Utc>) -> Self {
        let index = gpu.index;
        let message = match kind {
            AlertKind::GpuStuck => {
                format!("ERROR: GPU#{index} in rig {rig_name} is stuck. 0Mh/s")
            }
            AlertKind::TempWarning => format!(
                "TEMP WARNING: GPU#{index} in rig {rig_name} has a fever, {}\u{b0}C",
                gpu.temperature
            ),
            AlertKind::FanWarning => format!(
                "FAN WARNING: GPU#{index} in rig {rig_name} has decreased its fan speed too low, {}%",
                gpu.fan_speed
            ),
            AlertKind::HashRateWarning => format!(
                "HASHRATE WARNING: GPU#{index} in rig {rig_name} has lost its hashrate, {:.3} Mh/s",
                to_mhs(gpu.hash_rate)
            ),
            AlertKind::AltHashRateWarning => format!(
                "ALT HASHRATE WARNING: GPU#{index} in rig {rig_name} has lost its alt hashrate, {:.3} Mh/s",
                to_mhs(gpu.alt_hash_rate)
            ),
            AlertKind::RigOffline | AlertKind::RigOnline | AlertKind::GpuLost => {
                format!("GPU#{index} in rig {rig_name}: {kind:?}")
            }
        };
        Self::new(kind, rig_name, Some(index), message, at)
    }

    /// Key identifying "the same alert" across cycles, for cooldowns.
    pub fn cooldown_key(&self) -> String {
        match self.gpu_index {
            Some(index) => format!("{:?}:{}:{index}", self.kind, self.rig_name),
            None => format!("{:?}:{}", self.kind, self.rig_name),
        }
    }
}
