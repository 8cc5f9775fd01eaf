//! Error types for market data fetching.

use thiserror::Error;

/// Errors from the batched market data fetch.
///
/// Any of these aborts the whole pass; a partially evaluated pass is worse
/// than a skipped one.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("market data request failed: {0}")]
    Transport(String),

    #[error("market data request timed out: {0}")]
    Timeout(String),

    #[error("market data API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to parse market data payload: {0}")]
    Malformed(String),

    #[error("no symbols to fetch")]
    NoSymbols,
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FeedError::Timeout(err.to_string())
        } else if err.is_decode() {
            FeedError::Malformed(err.to_string())
        } else {
            FeedError::Transport(err.to_string())
        }
    }
}
