//! CoinGecko REST client.
//!
//! Fetches current price and 24h statistics for all watched symbols in a
//! single `/coins/markets` call per pass.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pricewatch_core::{normalize_symbol, MarketSnapshot};
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::FeedError;
use crate::fetcher::MarketDataFetcher;

const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

// The API denies default library user agents.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/114.0.0.0 Safari/537.36";

/// One row of the `/coins/markets` response.
#[derive(Debug, Deserialize)]
struct MarketsRow {
    symbol: String,
    current_price: Option<f64>,
    high_24h: Option<f64>,
    low_24h: Option<f64>,
    price_change_24h: Option<f64>,
}

/// Market data client for the CoinGecko public API.
#[derive(Clone)]
pub struct CoinGeckoClient {
    http: Client,
    base_url: String,
    vs_currency: String,
}

impl CoinGeckoClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the client at a different host (tests, proxies).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let http = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .expect("failed to build HTTP client");
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            vs_currency: "usd".to_string(),
        }
    }
}

impl Default for CoinGeckoClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataFetcher for CoinGeckoClient {
    async fn fetch_batch(
        &self,
        symbols: &HashSet<String>,
    ) -> Result<HashMap<String, MarketSnapshot>, FeedError> {
        if symbols.is_empty() {
            return Err(FeedError::NoSymbols);
        }

        let mut wanted: Vec<&str> = symbols.iter().map(String::as_str).collect();
        wanted.sort_unstable();
        let url = format!("{}/coins/markets", self.base_url);
        debug!(symbols = wanted.len(), "fetching market snapshots");

        let res = self
            .http
            .get(&url)
            .header(ACCEPT, "application/json")
            .query(&[
                ("vs_currency", self.vs_currency.as_str()),
                ("symbols", wanted.join(",").as_str()),
            ])
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(FeedError::Status { status, body });
        }

        let rows: Vec<MarketsRow> = res.json().await?;
        let snapshots = snapshots_from_rows(rows, Utc::now());
        debug!(fetched = snapshots.len(), "market snapshots fetched");
        Ok(snapshots)
    }
}

/// Key fetched rows by normalized symbol, dropping rows without a price.
fn snapshots_from_rows(
    rows: Vec<MarketsRow>,
    fetched_at: DateTime<Utc>,
) -> HashMap<String, MarketSnapshot> {
    let mut out = HashMap::with_capacity(rows.len());
    for row in rows {
        let symbol = normalize_symbol(&row.symbol);
        let Some(current_price) = row.current_price else {
            debug!(symbol = %symbol, "row has no current price, skipping");
            continue;
        };
        out.insert(
            symbol.clone(),
            MarketSnapshot {
                symbol,
                current_price,
                high_24h: row.high_24h,
                low_24h: row.low_24h,
                price_change_24h: row.price_change_24h,
                fetched_at,
            },
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_rows(payload: &str) -> Vec<MarketsRow> {
        serde_json::from_str(payload).unwrap()
    }

    #[test]
    fn rows_become_snapshots_keyed_by_lowercase_symbol() {
        let rows = parse_rows(
            r#"[{
                "id": "bitcoin",
                "symbol": "BTC",
                "current_price": 50000.0,
                "high_24h": 51000.0,
                "low_24h": 49000.0,
                "price_change_24h": -120.5
            }]"#,
        );

        let fetched_at = Utc::now();
        let snapshots = snapshots_from_rows(rows, fetched_at);
        let snap = &snapshots["btc"];
        assert_eq!(snap.symbol, "btc");
        assert_eq!(snap.current_price, 50000.0);
        assert_eq!(snap.high_24h, Some(51000.0));
        assert_eq!(snap.fetched_at, fetched_at);
    }

    #[test]
    fn rows_without_price_are_dropped_and_null_stats_survive() {
        let rows = parse_rows(
            r#"[
                {"symbol": "eth", "current_price": 3000.0,
                 "high_24h": null, "low_24h": null, "price_change_24h": null},
                {"symbol": "doge", "current_price": null,
                 "high_24h": 0.2, "low_24h": 0.1, "price_change_24h": 0.01}
            ]"#,
        );

        let snapshots = snapshots_from_rows(rows, Utc::now());
        assert_eq!(snapshots.len(), 1);
        let snap = &snapshots["eth"];
        assert_eq!(snap.high_24h, None);
        assert_eq!(snap.low_24h, None);
        assert_eq!(snap.price_change_24h, None);
    }

    #[tokio::test]
    async fn empty_symbol_set_is_rejected_before_any_request() {
        let client = CoinGeckoClient::with_base_url("http://127.0.0.1:1");
        let err = client.fetch_batch(&HashSet::new()).await.unwrap_err();
        assert!(matches!(err, FeedError::NoSymbols));
    }
}
