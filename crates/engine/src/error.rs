//! Pass-aborting engine failures.

use pricewatch_feeds::FeedError;
use pricewatch_store::StoreError;
use thiserror::Error;

/// An error that aborts the whole pass before any baseline is written.
///
/// Notification problems are deliberately not represented here; they are
/// logged and counted while the pass continues.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("market data fetch failed: {0}")]
    Fetch(#[from] FeedError),

    #[error("storage failure: {0}")]
    Store(#[from] StoreError),
}
