//! Rig model: static configuration, raw per-poll readings, and derived snapshots.
//!
//! Hash rates are kept in the unit the miner reports (kH/s for Claymore),
//! and thresholds are expressed in that same unit. Temperatures are in
//! degrees Celsius and fan speeds in percent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod claymore;
pub mod probe;
pub mod registry;

pub use probe::{ProbeError, RigProbe};
pub use registry::{RigEntry, RigRegistry};

/// Per-GPU alert thresholds for a rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Main hash rate at or below which a GPU is underperforming.
    pub hash_rate: u32,
    /// Alt hash rate at or below which a GPU is underperforming (dual rigs only).
    #[serde(default)]
    pub alt_hash_rate: u32,
    /// Temperature at or above which a GPU is running hot.
    pub temperature: u32,
    /// Recommended fan speed; warnings fire five points below it.
    pub fan_speed: u32,
}

/// Static configuration for one rig, loaded once at startup.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct RigConfig {
    /// Unique rig name used in chat commands and alerts.
    pub name: String,
    /// Hostname or IP address of the miner's management API.
    pub host: String,
    /// TCP port of the miner's management API.
    pub port: u16,
    /// Optional management API password.
    #[serde(default)]
    pub password: Option<String>,
    /// Whether the rig mines two coins at once.
    #[serde(default)]
    pub dual: bool,
    /// Coin name as known to the profitability lookup (e.g. "Ethereum").
    pub coin_name: String,
    /// Ticker symbol of the mined coin (e.g. "ETH").
    pub coin_tag: String,
    /// Per-GPU thresholds.
    pub thresholds: Thresholds,
}

impl std::fmt::Debug for RigConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RigConfig")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "__REDACTED__"))
            .field("dual", &self.dual)
            .field("coin_name", &self.coin_name)
            .field("coin_tag", &self.coin_tag)
            .field("thresholds", &self.thresholds)
            .finish()
    }
}

impl RigConfig {
    /// Socket address of the management API (`host:port`).
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Live readings for a single GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuReading {
    /// Device position as enumerated by the miner.
    pub index: usize,
    /// Main coin hash rate. Zero when the miner reports nothing usable.
    pub hash_rate: u32,
    /// Alt coin hash rate (zero on single-coin rigs).
    pub alt_hash_rate: u32,
    /// Core temperature.
    pub temperature: u32,
    /// Fan speed.
    pub fan_speed: u32,
}

impl GpuReading {
    /// A GPU is stuck when it is enumerated but reports no main hash rate.
    pub fn is_stuck(&self) -> bool {
        self.hash_rate == 0
    }
}

/// Aggregate metrics for one mining session (main or alt coin).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiningSession {
    /// Total hash rate across all GPUs.
    pub hash_rate: u32,
    /// Accepted shares.
    pub shares: u32,
    /// Shares rejected by the pool.
    pub rejected_shares: u32,
    /// Shares the miner itself flagged as invalid.
    pub invalid_shares: u32,
}

/// Pool connection info for one mining session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolInfo {
    /// Pool address currently in use.
    pub address: String,
    /// Number of pool switches since the miner started.
    pub switches: u32,
}

/// Raw payload returned by a rig for one poll.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RigReading {
    /// Miner software version string.
    pub version: String,
    /// Miner uptime in minutes.
    pub uptime_mins: u32,
    /// Main coin session metrics.
    pub main_session: MiningSession,
    /// Alt coin session metrics.
    pub alt_session: MiningSession,
    /// Main coin pool.
    pub main_pool: PoolInfo,
    /// Alt coin pool.
    pub alt_pool: PoolInfo,
    /// Per-GPU readings in device order.
    pub gpus: Vec<GpuReading>,
}

/// Derived health classification of a rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// Reachable and no degraded condition fired.
    Online,
    /// Unreachable this cycle.
    Offline,
    /// Reachable but degraded (lost GPU, stuck GPU, or a breached threshold).
    Wounded,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Online => "Online",
            Self::Offline => "Offline",
            Self::Wounded => "Wounded",
        };
        f.write_str(label)
    }
}

/// The engine's view of one rig after processing one poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigSnapshot {
    /// Rig name.
    pub name: String,
    /// Coin name from the rig config.
    pub coin_name: String,
    /// Coin ticker from the rig config.
    pub coin_tag: String,
    /// Derived status.
    pub status: Status,
    /// Miner software version.
    pub version: String,
    /// Miner uptime in minutes.
    pub uptime_mins: u32,
    /// Main coin session metrics.
    pub main_session: MiningSession,
    /// Alt coin session metrics.
    pub alt_session: MiningSession,
    /// Main coin pool.
    pub main_pool: PoolInfo,
    /// Alt coin pool.
    pub alt_pool: PoolInfo,
    /// Active (non-stuck) GPUs.
    pub gpus: Vec<GpuReading>,
    /// When this snapshot was produced.
    pub observed_at: DateTime<Utc>,
}

impl RigSnapshot {
    /// Build an empty snapshot for a rig that has never reported.
    pub fn unreachable(config: &RigConfig, observed_at: DateTime<Utc>) -> Self {
        Self {
            name: config.name.clone(),
            coin_name: config.coin_name.clone(),
            coin_tag: config.coin_tag.clone(),
            status: Status::Offline,
            version: String::new(),
            uptime_mins: 0,
            main_session: MiningSession::default(),
            alt_session: MiningSession::default(),
            main_pool: PoolInfo::default(),
            alt_pool: PoolInfo::default(),
            gpus: Vec::new(),
            observed_at,
        }
    }

    /// Number of GPUs that were hashing when this snapshot was taken.
    pub fn active_gpu_count(&self) -> usize {
        self.gpus.len()
    }
}

/// Convert a kH/s rate into Mh/s for display.
pub fn to_mhs(rate_khs: u32) -> f64 {
    f64::from(rate_khs) / 1000.0
}
