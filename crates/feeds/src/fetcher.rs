//! Batched market data source interface.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use pricewatch_core::MarketSnapshot;

use crate::error::FeedError;

/// Fetches current market data for a set of symbols in one request.
///
/// The engine calls this exactly once per pass with the deduplicated symbol
/// set, so upstream usage is bounded by distinct symbols, not alert count.
/// The returned map is keyed by normalized symbol; a requested symbol the
/// upstream does not know is simply absent from it.
#[async_trait]
pub trait MarketDataFetcher: Send + Sync {
    async fn fetch_batch(
        &self,
        symbols: &HashSet<String>,
    ) -> Result<HashMap<String, MarketSnapshot>, FeedError>;
}
