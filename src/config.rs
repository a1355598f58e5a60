//! Configuration loading and validation.
//!
//! A single TOML document describes the polling cadence, the fiat currency,
//! the Telegram bot, and every rig. It is loaded once at startup; any
//! problem is fatal.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::dispatch::command::{MAX_TARGET_LEN, SYSTEM_WIDE};
use crate::rig::RigConfig;

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "TELEMON_CONFIG_PATH";

/// Config file used when neither the CLI nor the environment names one.
pub const DEFAULT_CONFIG_FILE: &str = "telemon.toml";

/// Shortest allowed polling interval.
pub const MIN_INTERVAL_SECS: u64 = 5;

/// Longest allowed alert cooldown (one week).
pub const MAX_ALERT_COOLDOWN_MINS: u64 = 10_080;

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Polling cadence and probe timeout.
    #[serde(default)]
    pub poll: PollConfig,

    /// Fiat currency for profit estimates.
    #[serde(default)]
    pub currency: CurrencyConfig,

    /// Telegram bot settings.
    pub telegram: TelegramConfig,

    /// Monitored rigs, in chooser order.
    #[serde(default)]
    pub rigs: Vec<RigConfig>,
}

/// Polling cadence.
#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    /// Seconds between poll rounds.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Per-call timeout for rig and price requests, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl PollConfig {
    /// Interval between rounds.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Per-call network timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Fiat currency used for profit estimates.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrencyConfig {
    /// Currency code passed to the price source (e.g. "USD").
    #[serde(default = "default_currency_code")]
    pub code: String,

    /// Symbol prefixed to amounts (e.g. "$").
    #[serde(default = "default_currency_symbol")]
    pub symbol: String,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            code: default_currency_code(),
            symbol: default_currency_symbol(),
        }
    }
}

/// Telegram bot settings.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Environment variable name holding the bot token.
    #[serde(default = "default_bot_token_env")]
    pub bot_token_env: String,

    /// Alert destination: a channel username (`@rigs`) or a numeric chat id.
    pub notify_chat: String,

    /// Telegram usernames allowed to issue requests.
    #[serde(default)]
    pub allowed_users: Vec<String>,

    /// Minimum minutes between repeats of the same per-GPU warning.
    /// Zero sends every occurrence.
    #[serde(default)]
    pub alert_cooldown_mins: u64,
}

fn default_interval_secs() -> u64 {
    60
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_currency_code() -> String {
    "USD".to_owned()
}
fn default_currency_symbol() -> String {
    "$".to_owned()
}
fn default_bot_token_env() -> String {
    "TELEMON_TELEGRAM_TOKEN".to_owned()
}

impl Config {
    /// Parse configuration from a TOML string and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or validation fails.
    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(contents).context("failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate that configuration values are within sane bounds.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid value.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.poll.interval_secs >= MIN_INTERVAL_SECS,
            "poll.interval_secs must be >= {MIN_INTERVAL_SECS}"
        );
        anyhow::ensure!(
            self.poll.timeout_secs >= 1,
            "poll.timeout_secs must be >= 1"
        );
        anyhow::ensure!(
            !self.currency.code.trim().is_empty(),
            "currency.code must not be empty"
        );
        anyhow::ensure!(
            !self.telegram.bot_token_env.trim().is_empty(),
            "telegram.bot_token_env must not be empty"
        );
        anyhow::ensure!(
            !self.telegram.notify_chat.trim().is_empty(),
            "telegram.notify_chat must not be empty"
        );
        anyhow::ensure!(
            self.telegram.alert_cooldown_mins <= MAX_ALERT_COOLDOWN_MINS,
            "telegram.alert_cooldown_mins must be <= {MAX_ALERT_COOLDOWN_MINS}"
        );
        anyhow::ensure!(!self.rigs.is_empty(), "at least one [[rigs]] entry is required");

        let mut seen = HashSet::new();
        for rig in &self.rigs {
            validate_rig(rig)?;
            anyhow::ensure!(
                seen.insert(rig.name.as_str()),
                "duplicate rig name: {}",
                rig.name
            );
        }
        Ok(())
    }
}

fn validate_rig(rig: &RigConfig) -> anyhow::Result<()> {
    let name = &rig.name;
    anyhow::ensure!(!name.is_empty(), "rig name must not be empty");
    anyhow::ensure!(
        !name.chars().any(|c| c.is_whitespace() || c == ':'),
        "rig name {name:?} must not contain whitespace or ':'"
    );
    anyhow::ensure!(
        name != SYSTEM_WIDE,
        "rig name {SYSTEM_WIDE:?} is reserved"
    );
    anyhow::ensure!(
        name.len() <= MAX_TARGET_LEN,
        "rig name {name:?} must be at most {MAX_TARGET_LEN} bytes"
    );
    anyhow::ensure!(!rig.host.trim().is_empty(), "rig {name}: host must not be empty");
    anyhow::ensure!(rig.port != 0, "rig {name}: port must be non-zero");
    anyhow::ensure!(
        !rig.coin_name.trim().is_empty(),
        "rig {name}: coin_name must not be empty"
    );
    Ok(())
}

/// Resolve the config file path: explicit CLI value, then
/// `$TELEMON_CONFIG_PATH`, then `./telemon.toml`.
pub fn config_path(cli: Option<&Path>) -> PathBuf {
    config_path_with(cli, |key| std::env::var(key).ok())
}

/// Resolve the config path using a custom env resolver (for testing).
pub fn config_path_with(cli: Option<&Path>, env: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(path) = cli {
        return path.to_path_buf();
    }
    if let Some(path) = env(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

/// Load and validate configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, or fails validation.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    Config::from_toml(&contents).with_context(|| format!("invalid config at {}", path.display()))
}
