//! Expected-revenue estimates from network difficulty and market price.
//!
//! Coin data (network hash rate, block time, block reward) and fiat prices
//! come from a [`PriceSource`]. The HTTP implementation reads the
//! WhatToMine coin list and the CryptoCompare price endpoint.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

/// Default WhatToMine coin list endpoint.
pub const DEFAULT_COINS_URL: &str = "https://whattomine.com/coins.json";

/// Default CryptoCompare single-price endpoint.
pub const DEFAULT_PRICE_URL: &str = "https://min-api.cryptocompare.com/data/price";

const MINUTES_PER_DAY: f64 = 1440.0;

/// Network parameters for one coin.
#[derive(Debug, Clone, PartialEq)]
pub struct CoinInfo {
    /// Ticker symbol.
    pub tag: String,
    /// Network hash rate in H/s.
    pub network_hash_rate: f64,
    /// Average seconds per block.
    pub block_time: f64,
    /// Coins paid per block.
    pub block_reward: f64,
}

/// Errors from price and coin lookups.
#[derive(Debug, thiserror::Error)]
pub enum PriceError {
    /// Transport or HTTP status failure.
    #[error("price request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Coin missing from the coin list.
    #[error("unknown coin: {0}")]
    UnknownCoin(String),
    /// No quote for the pair.
    #[error("no {fiat} quote for {tag}")]
    MissingQuote {
        /// Coin ticker.
        tag: String,
        /// Fiat currency code.
        fiat: String,
    },
    /// Data present but unusable (zero network hash rate, bad number).
    #[error("invalid coin data: {0}")]
    InvalidData(String),
}

/// Lookup capability for coin parameters and prices.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Network parameters for a coin by its display name.
    async fn lookup(&self, coin_name: &str) -> Result<CoinInfo, PriceError>;
    /// Current price of one coin in `fiat`.
    async fn ticker(&self, coin_tag: &str, fiat: &str) -> Result<f64, PriceError>;
}

/// Expected fiat revenue per day for `hash_rate_mhs` Mh/s.
pub fn daily_revenue(hash_rate_mhs: f64, coin: &CoinInfo, price: f64) -> f64 {
    let share = (hash_rate_mhs * 1e6) / coin.network_hash_rate;
    let blocks_per_min = 60.0 / coin.block_time;
    let coins_per_min = blocks_per_min * coin.block_reward;
    share * coins_per_min * MINUTES_PER_DAY * price
}

/// Format a fiat amount as `{symbol}{value:.2}`.
pub fn format_money(symbol: &str, value: f64) -> String {
    format!("{symbol}{value:.2}")
}

/// Profit estimator bound to the operator's fiat currency.
#[derive(Clone)]
pub struct Profitability {
    source: Arc<dyn PriceSource>,
    currency: String,
    symbol: String,
}

impl std::fmt::Debug for Profitability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profitability")
            .field("currency", &self.currency)
            .field("symbol", &self.symbol)
            .finish_non_exhaustive()
    }
}

impl Profitability {
    /// Create an estimator for `currency` (e.g. "USD") displayed with `symbol`.
    pub fn new(source: Arc<dyn PriceSource>, currency: String, symbol: String) -> Self {
        Self {
            source,
            currency,
            symbol,
        }
    }

    /// Expected daily revenue in fiat.
    ///
    /// # Errors
    ///
    /// Returns an error if the coin or its price cannot be looked up.
    pub async fn expected_daily(
        &self,
        coin_name: &str,
        hash_rate_mhs: f64,
    ) -> Result<f64, PriceError> {
        let coin = self.source.lookup(coin_name).await?;
        if coin.network_hash_rate <= 0.0 || coin.block_time <= 0.0 {
            return Err(PriceError::InvalidData(format!(
                "{coin_name}: network hash rate and block time must be positive"
            )));
        }
        let price = self.source.ticker(&coin.tag, &self.currency).await?;
        Ok(daily_revenue(hash_rate_mhs, &coin, price))
    }

    /// Expected daily revenue formatted for display; "unavailable" on failure.
    pub async fn describe_daily(&self, coin_name: &str, hash_rate_mhs: f64) -> String {
        match self.expected_daily(coin_name, hash_rate_mhs).await {
            Ok(value) => format_money(&self.symbol, value),
            Err(e) => {
                warn!(coin = coin_name, error = %e, "profit lookup failed");
                "unavailable".to_owned()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct CoinList {
    coins: HashMap<String, CoinEntry>,
}

#[derive(Debug, Deserialize)]
struct CoinEntry {
    tag: String,
    #[serde(default)]
    nethash: serde_json::Value,
    #[serde(default)]
    block_time: serde_json::Value,
    #[serde(default)]
    block_reward: serde_json::Value,
}

/// [`PriceSource`] over public HTTP APIs.
#[derive(Debug, Clone)]
pub struct HttpPriceSource {
    client: reqwest::Client,
    coins_url: String,
    price_url: String,
}

impl HttpPriceSource {
    /// Create a source against the given endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(coins_url: String, price_url: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("telemon/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            coins_url,
            price_url,
        })
    }

    /// Create a source against the default public endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_defaults(timeout: Duration) -> anyhow::Result<Self> {
        Self::new(
            DEFAULT_COINS_URL.to_owned(),
            DEFAULT_PRICE_URL.to_owned(),
            timeout,
        )
    }
}

#[async_trait]
impl PriceSource for HttpPriceSource {
    async fn lookup(&self, coin_name: &str) -> Result<CoinInfo, PriceError> {
        let list: CoinList = self
            .client
            .get(&self.coins_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        coin_from_list(list, coin_name)
    }

    async fn ticker(&self, coin_tag: &str, fiat: &str) -> Result<f64, PriceError> {
        let quotes: HashMap<String, serde_json::Value> = self
            .client
            .get(&self.price_url)
            .query(&[("fsym", coin_tag), ("tsyms", fiat)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        quotes
            .get(fiat)
            .and_then(number)
            .ok_or_else(|| PriceError::MissingQuote {
                tag: coin_tag.to_owned(),
                fiat: fiat.to_owned(),
            })
    }
}

fn coin_from_list(list: CoinList, coin_name: &str) -> Result<CoinInfo, PriceError> {
    let entry = list
        .coins
        .into_iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(coin_name))
        .map(|(_, entry)| entry)
        .ok_or_else(|| PriceError::UnknownCoin(coin_name.to_owned()))?;

    let field = |value: &serde_json::Value, label: &str| {
        number(value).ok_or_else(|| PriceError::InvalidData(format!("{coin_name}: bad {label}")))
    };

    Ok(CoinInfo {
        network_hash_rate: field(&entry.nethash, "nethash")?,
        block_time: field(&entry.block_time, "block_time")?,
        block_reward: field(&entry.block_reward, "block_reward")?,
        tag: entry.tag,
    })
}

/// Accept numbers encoded either as JSON numbers or numeric strings.
fn number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
