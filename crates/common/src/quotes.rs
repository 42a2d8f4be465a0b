use async_trait::async_trait;

use crate::{Candle, Result};

/// Abstraction over the upstream market-data provider.
///
/// `AlphaVantageClient` in `crates/engine` implements this for live quotes.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Fetch the most recent one-minute bar for a pair such as "EUR/USD".
    async fn latest_candle(&self, pair: &str) -> Result<Candle>;
}
