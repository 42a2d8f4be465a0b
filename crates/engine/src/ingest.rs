use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use common::{CandleStore, Error, QuoteProvider, Result};

use crate::analyzer::{AnalysisReport, Analyzer};

/// Polls the quote provider, stores each new bar and analyzes it.
pub struct Ingestor {
    pairs: Vec<String>,
    provider: Arc<dyn QuoteProvider>,
    candles: Arc<dyn CandleStore>,
    analyzer: Arc<Analyzer>,
    poll_interval: Duration,
}

impl Ingestor {
    pub fn new(
        pairs: Vec<String>,
        provider: Arc<dyn QuoteProvider>,
        candles: Arc<dyn CandleStore>,
        analyzer: Arc<Analyzer>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            pairs,
            provider,
            candles,
            analyzer,
            poll_interval,
        }
    }

    /// Run the polling loop forever. Call from `tokio::spawn`.
    pub async fn run(self) {
        info!(
            pairs = ?self.pairs,
            interval_secs = self.poll_interval.as_secs(),
            "Ingestor started"
        );
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            self.poll_once().await;
        }
    }

    /// One pass over every configured pair. Failures are logged per pair.
    /// A rate-limit response ends the pass early; the next tick retries.
    pub async fn poll_once(&self) -> usize {
        let mut analyzed = 0;
        for pair in &self.pairs {
            match self.ingest_pair(pair).await {
                Ok(_) => analyzed += 1,
                Err(Error::RateLimited(msg)) => {
                    warn!(pair = %pair, reason = %msg, "Rate limited, skipping rest of this pass");
                    break;
                }
                Err(e) => warn!(pair = %pair, error = %e, "Ingestion failed"),
            }
        }
        analyzed
    }

    /// Fetch, store and analyze the latest bar for one pair.
    pub async fn ingest_pair(&self, pair: &str) -> Result<AnalysisReport> {
        let bar = self.provider.latest_candle(pair).await?;
        let stored = self.candles.upsert_candle(&bar).await?;
        self.analyzer.analyze(&stored.id, &stored.pair).await
    }
}
