//! Claymore-style miner management API over TCP.
//!
//! One JSON-RPC request per connection: the client writes a single JSON
//! object followed by a newline and reads at most one line back. Reboot and
//! restart requests are answered with nothing at all by most miner builds,
//! so an empty reply is a success for them.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

use super::probe::{ProbeError, RigProbe};
use super::{GpuReading, MiningSession, PoolInfo, RigConfig, RigReading};

const METHOD_GET_STAT: &str = "miner_getstat1";
const METHOD_REBOOT: &str = "miner_reboot";
const METHOD_RESTART: &str = "miner_restart";

/// Minimum number of fields in a `miner_getstat1` result.
const STAT_FIELDS: usize = 9;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    id: u32,
    jsonrpc: &'static str,
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    psw: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Vec<String>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

/// [`RigProbe`] backed by a Claymore-compatible management port.
#[derive(Clone)]
pub struct ClaymoreProbe {
    address: String,
    password: Option<String>,
    timeout: Duration,
}

impl std::fmt::Debug for ClaymoreProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaymoreProbe")
            .field("address", &self.address)
            .field("password", &self.password.as_ref().map(|_| "__REDACTED__"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ClaymoreProbe {
    /// Create a probe for `address` (`host:port`).
    pub fn new(address: String, password: Option<String>, timeout: Duration) -> Self {
        Self {
            address,
            password,
            timeout,
        }
    }

    /// Create a probe from a rig's static configuration.
    pub fn from_config(config: &RigConfig, timeout: Duration) -> Self {
        Self::new(config.address(), config.password.clone(), timeout)
    }

    /// Send one request and return the decoded reply, if the miner sent one.
    async fn call(&self, method: &str) -> Result<Option<RpcResponse>, ProbeError> {
        match tokio::time::timeout(self.timeout, self.exchange(method)).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout {
                method: method.to_owned(),
                seconds: self.timeout.as_secs(),
            }),
        }
    }

    async fn exchange(&self, method: &str) -> Result<Option<RpcResponse>, ProbeError> {
        let stream =
            TcpStream::connect(&self.address)
                .await
                .map_err(|source| ProbeError::Connect {
                    address: self.address.clone(),
                    source,
                })?;
        let (read_half, mut write_half) = stream.into_split();

        let request = RpcRequest {
            id: 0,
            jsonrpc: "2.0",
            method,
            psw: self.password.as_deref().filter(|p| !p.is_empty()),
        };
        let mut payload = serde_json::to_vec(&request)?;
        payload.push(b'\n');
        write_half.write_all(&payload).await?;
        write_half.flush().await?;

        let mut reader = BufReader::new(read_half);
        let mut line = String::new();
        let bytes = reader.read_line(&mut line).await?;
        debug!(address = %self.address, method, bytes, "miner replied");

        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let response: RpcResponse = serde_json::from_str(trimmed)?;
        if let Some(error) = response.error.as_ref().filter(|e| !e.is_null()) {
            return Err(ProbeError::Rpc(error.to_string()));
        }
        Ok(Some(response))
    }
}

#[async_trait]
impl RigProbe for ClaymoreProbe {
    async fn fetch_status(&self) -> Result<RigReading, ProbeError> {
        let response = self
            .call(METHOD_GET_STAT)
            .await?
            .ok_or_else(|| ProbeError::Malformed("empty reply to miner_getstat1".to_owned()))?;
        let fields = response
            .result
            .ok_or_else(|| ProbeError::Malformed("missing result array".to_owned()))?;
        parse_stat(&fields)
    }

    async fn reboot(&self) -> Result<(), ProbeError> {
        self.call(METHOD_REBOOT).await.map(|_| ())
    }

    async fn restart(&self) -> Result<(), ProbeError> {
        self.call(METHOD_RESTART).await.map(|_| ())
    }
}

/// Decode a `miner_getstat1` result array.
///
/// Layout: version, uptime minutes, `rate;shares;rejected` (main), per-GPU
/// main rates, `rate;shares;rejected` (alt), per-GPU alt rates,
/// `temp;fan` pairs, `main_pool;alt_pool`, and
/// `main_invalid;main_switches;alt_invalid;alt_switches`.
///
/// # Errors
///
/// Returns [`ProbeError::Malformed`] if fields are missing or the uptime is
/// not a number. Unparsable per-GPU values read as zero, which marks the GPU
/// as stuck.
pub fn parse_stat(fields: &[String]) -> Result<RigReading, ProbeError> {
    if fields.len() < STAT_FIELDS {
        return Err(ProbeError::Malformed(format!(
            "expected at least {STAT_FIELDS} fields, got {}",
            fields.len()
        )));
    }

    let version = fields[0].trim().to_owned();
    let uptime_mins = fields[1]
        .trim()
        .parse::<u32>()
        .map_err(|e| ProbeError::Malformed(format!("uptime {:?}: {e}", fields[1])))?;

    let main_totals = split_numbers(&fields[2]);
    let main_rates = split_fields(&fields[3]);
    let alt_totals = split_numbers(&fields[4]);
    let alt_rates = split_numbers(&fields[5]);
    let climate = split_numbers(&fields[6]);
    let pools: Vec<&str> = fields[7].split(';').map(str::trim).collect();
    let extras = split_numbers(&fields[8]);

    let nth = |values: &[u32], i: usize| values.get(i).copied().unwrap_or(0);

    let main_session = MiningSession {
        hash_rate: nth(&main_totals, 0),
        shares: nth(&main_totals, 1),
        rejected_shares: nth(&main_totals, 2),
        invalid_shares: nth(&extras, 0),
    };
    let alt_session = MiningSession {
        hash_rate: nth(&alt_totals, 0),
        shares: nth(&alt_totals, 1),
        rejected_shares: nth(&alt_totals, 2),
        invalid_shares: nth(&extras, 2),
    };
    let main_pool = PoolInfo {
        address: pools.first().map(|p| (*p).to_owned()).unwrap_or_default(),
        switches: nth(&extras, 1),
    };
    let alt_pool = PoolInfo {
        address: pools.get(1).map(|p| (*p).to_owned()).unwrap_or_default(),
        switches: nth(&extras, 3),
    };

    let pairs: Vec<(u32, u32)> = climate
        .chunks(2)
        .map(|pair| (nth(pair, 0), nth(pair, 1)))
        .collect();

    let gpus = main_rates
        .iter()
        .enumerate()
        .map(|(index, rate)| {
            let (temperature, fan_speed) = pairs.get(index).copied().unwrap_or((0, 0));
            GpuReading {
                index,
                hash_rate: parse_number(rate),
                alt_hash_rate: nth(&alt_rates, index),
                temperature,
                fan_speed,
            }
        })
        .collect();

    Ok(RigReading {
        version,
        uptime_mins,
        main_session,
        alt_session,
        main_pool,
        alt_pool,
        gpus,
    })
}

/// Split a `;`-separated field, dropping empty entries.
fn split_fields(field: &str) -> Vec<&str> {
    field
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn split_numbers(field: &str) -> Vec<u32> {
    split_fields(field).into_iter().map(parse_number).collect()
}

/// Miners print `off` for disabled devices; anything unparsable counts as zero.
fn parse_number(value: &str) -> u32 {
    value.trim().parse().unwrap_or(0)
}
