//! Pairs persisted baselines with freshly fetched snapshots.

use std::collections::{HashMap, HashSet};

use pricewatch_core::SymbolView;
use pricewatch_feeds::{FeedError, MarketDataFetcher};
use tracing::debug;

/// Issues the one batched fetch of a pass and reconciles the result against
/// the persisted baselines.
///
/// Fail-fast: any fetch problem aborts the pass before evaluation, so no
/// alert is ever judged against stale-for-some-symbols data.
pub struct PriceBaselineCoordinator<F> {
    fetcher: F,
}

impl<F: MarketDataFetcher> PriceBaselineCoordinator<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    /// Fetch the distinct symbol set once and pair each snapshot with the
    /// last observed price.
    ///
    /// A symbol seen for the first time has `previous == None`; `0.0` never
    /// stands in for missing history, so the first observation seeds the
    /// baseline without firing anything.
    pub async fn fetch_and_reconcile(
        &self,
        symbols: &HashSet<String>,
        baselines: &HashMap<String, f64>,
    ) -> Result<HashMap<String, SymbolView>, FeedError> {
        let snapshots = self.fetcher.fetch_batch(symbols).await?;

        let mut views = HashMap::with_capacity(snapshots.len());
        for (symbol, snapshot) in snapshots {
            let previous = baselines.get(&symbol).copied();
            if previous.is_none() {
                debug!(symbol = %symbol, "no baseline yet, seeding from this pass");
            }
            views.insert(symbol, SymbolView { previous, snapshot });
        }
        Ok(views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use pricewatch_core::MarketSnapshot;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct StaticFetcher {
        snapshots: HashMap<String, MarketSnapshot>,
        fail: bool,
        calls: Arc<Mutex<Vec<HashSet<String>>>>,
    }

    #[async_trait]
    impl MarketDataFetcher for StaticFetcher {
        async fn fetch_batch(
            &self,
            symbols: &HashSet<String>,
        ) -> Result<HashMap<String, MarketSnapshot>, FeedError> {
            self.calls.lock().unwrap().push(symbols.clone());
            if self.fail {
                return Err(FeedError::Transport("connection refused".to_string()));
            }
            Ok(self.snapshots.clone())
        }
    }

    fn snapshot(symbol: &str, price: f64) -> MarketSnapshot {
        MarketSnapshot {
            symbol: symbol.to_string(),
            current_price: price,
            high_24h: None,
            low_24h: None,
            price_change_24h: None,
            fetched_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn pairs_previous_with_current_per_symbol() {
        let fetcher = StaticFetcher {
            snapshots: HashMap::from([
                ("btc".to_string(), snapshot("btc", 101.0)),
                ("eth".to_string(), snapshot("eth", 11.0)),
            ]),
            ..Default::default()
        };
        let coordinator = PriceBaselineCoordinator::new(fetcher);

        let symbols = HashSet::from(["btc".to_string(), "eth".to_string()]);
        let baselines = HashMap::from([("btc".to_string(), 100.0)]);
        let views = coordinator
            .fetch_and_reconcile(&symbols, &baselines)
            .await
            .unwrap();

        assert_eq!(views["btc"].previous, Some(100.0));
        assert_eq!(views["btc"].snapshot.current_price, 101.0);
        // First observation of eth: no previous, not zero.
        assert_eq!(views["eth"].previous, None);
    }

    #[tokio::test]
    async fn issues_exactly_one_batched_fetch() {
        let fetcher = StaticFetcher {
            snapshots: HashMap::from([("btc".to_string(), snapshot("btc", 1.0))]),
            ..Default::default()
        };
        let calls = fetcher.calls.clone();
        let coordinator = PriceBaselineCoordinator::new(fetcher);

        let symbols = HashSet::from(["btc".to_string()]);
        coordinator
            .fetch_and_reconcile(&symbols, &HashMap::new())
            .await
            .unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], symbols);
    }

    #[tokio::test]
    async fn fetch_failure_aborts_reconciliation() {
        let fetcher = StaticFetcher {
            fail: true,
            ..Default::default()
        };
        let coordinator = PriceBaselineCoordinator::new(fetcher);

        let symbols = HashSet::from(["btc".to_string()]);
        let err = coordinator
            .fetch_and_reconcile(&symbols, &HashMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::Transport(_)));
    }
}
