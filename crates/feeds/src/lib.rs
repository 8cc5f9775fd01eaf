//! Market data fetching for the alert engine.
//!
//! One batched REST call per evaluation pass serves every watched symbol.

pub mod coingecko;
pub mod error;
pub mod fetcher;

pub use coingecko::CoinGeckoClient;
pub use error::FeedError;
pub use fetcher::MarketDataFetcher;
