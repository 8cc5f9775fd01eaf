//! Market data observed by the engine, and the per-symbol price baseline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current market data for one symbol, fetched once per pass.
///
/// Owned by the pass that fetched it; never persisted beyond deriving the
/// next [`PriceBaseline`]. The 24h statistics may be absent upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: String,
    pub current_price: f64,
    pub high_24h: Option<f64>,
    pub low_24h: Option<f64>,
    pub price_change_24h: Option<f64>,
    pub fetched_at: DateTime<Utc>,
}

/// Last observed price for a symbol, global across alerts.
///
/// Reflects the price at the end of the previous completed pass; a pass that
/// aborts leaves it untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBaseline {
    pub symbol: String,
    pub last_price: f64,
    pub last_updated: DateTime<Utc>,
}

impl PriceBaseline {
    /// The baseline a completed pass leaves behind for this snapshot.
    pub fn from_snapshot(snapshot: &MarketSnapshot) -> Self {
        Self {
            symbol: snapshot.symbol.clone(),
            last_price: snapshot.current_price,
            last_updated: snapshot.fetched_at,
        }
    }
}

/// Previous/current price pairing handed to the evaluator.
///
/// `previous` is `None` for a symbol with no baseline yet; `0.0` never
/// stands in for missing data.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolView {
    pub previous: Option<f64>,
    pub snapshot: MarketSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn baseline_carries_snapshot_price_and_time() {
        let snapshot = MarketSnapshot {
            symbol: "btc".to_string(),
            current_price: 50000.0,
            high_24h: Some(51000.0),
            low_24h: Some(49000.0),
            price_change_24h: Some(-120.5),
            fetched_at: Utc::now(),
        };

        let baseline = PriceBaseline::from_snapshot(&snapshot);
        assert_eq!(baseline.symbol, "btc");
        assert_eq!(baseline.last_price, 50000.0);
        assert_eq!(baseline.last_updated, snapshot.fetched_at);
    }
}
