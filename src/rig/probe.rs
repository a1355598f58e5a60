//! The per-rig client capability the poller and dispatcher call into.

use async_trait::async_trait;

use super::RigReading;

/// Errors produced while talking to a rig.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// TCP connection could not be established.
    #[error("connection to {address} failed: {source}")]
    Connect {
        /// Address that was dialled.
        address: String,
        /// Underlying socket error.
        #[source]
        source: std::io::Error,
    },
    /// The exchange did not complete within the configured timeout.
    #[error("{method} timed out after {seconds}s")]
    Timeout {
        /// RPC method that was in flight.
        method: String,
        /// Timeout budget in seconds.
        seconds: u64,
    },
    /// Socket read or write failure after connecting.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Response was not valid JSON.
    #[error("invalid JSON from miner: {0}")]
    Json(#[from] serde_json::Error),
    /// The miner answered with an error object.
    #[error("miner returned an error: {0}")]
    Rpc(String),
    /// The response parsed but did not have the expected shape.
    #[error("malformed miner response: {0}")]
    Malformed(String),
}

/// Remote control and status capability for one rig.
///
/// Implementations carry their own address and credentials; callers only
/// ever see a rig through this trait, so tests can substitute a double.
#[async_trait]
pub trait RigProbe: Send + Sync {
    /// Fetch the rig's current status.
    async fn fetch_status(&self) -> Result<RigReading, ProbeError>;
    /// Reboot the rig's host.
    async fn reboot(&self) -> Result<(), ProbeError>;
    /// Restart the miner process.
    async fn restart(&self) -> Result<(), ProbeError>;
}
