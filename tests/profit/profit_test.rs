//! Tests for `src/profit.rs` — revenue formula and degraded lookups.

use std::sync::Arc;

use telemon::profit::{daily_revenue, format_money, CoinInfo, PriceError, Profitability};

use crate::support::StaticPrices;

fn coin() -> CoinInfo {
    CoinInfo {
        tag: "ETH".to_owned(),
        network_hash_rate: 1e12,
        block_time: 15.0,
        block_reward: 2.0,
    }
}

#[test]
fn daily_revenue_scales_share_of_network() {
    // 100 Mh/s of a 1 TH/s network, 4 blocks a minute at 2 coins, 100 per coin.
    let value = daily_revenue(100.0, &coin(), 100.0);
    assert!((value - 115.2).abs() < 1e-9, "got {value}");

    let doubled = daily_revenue(200.0, &coin(), 100.0);
    assert!((doubled - 2.0 * value).abs() < 1e-9);
}

#[test]
fn zero_hash_rate_earns_nothing() {
    assert!(daily_revenue(0.0, &coin(), 100.0).abs() < f64::EPSILON);
}

#[test]
fn money_has_two_decimals() {
    assert_eq!(format_money("$", 115.2), "$115.20");
    assert_eq!(format_money("\u{20ac}", 0.004), "\u{20ac}0.00");
}

#[tokio::test]
async fn describe_daily_formats_with_symbol() {
    let profit = Profitability::new(
        Arc::new(StaticPrices::standard()),
        "USD".to_owned(),
        "$".to_owned(),
    );

    assert_eq!(profit.describe_daily("Ethereum", 100.0).await, "$115.20");
}

#[tokio::test]
async fn failed_lookup_is_unavailable() {
    let profit = Profitability::new(
        Arc::new(StaticPrices::unavailable()),
        "USD".to_owned(),
        "$".to_owned(),
    );

    assert_eq!(profit.describe_daily("Ethereum", 100.0).await, "unavailable");
    assert!(matches!(
        profit.expected_daily("Ethereum", 100.0).await,
        Err(PriceError::UnknownCoin(_))
    ));
}

#[tokio::test]
async fn zero_network_hash_rate_is_invalid() {
    let mut prices = StaticPrices::standard();
    prices.coin = Some(CoinInfo {
        network_hash_rate: 0.0,
        ..coin()
    });
    let profit = Profitability::new(Arc::new(prices), "USD".to_owned(), "$".to_owned());

    assert!(matches!(
        profit.expected_daily("Ethereum", 100.0).await,
        Err(PriceError::InvalidData(_))
    ));
}
