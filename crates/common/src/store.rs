use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{Candle, ConsensusAnalysis, Result, StrategyConfigRecord, StrategyPrediction};

/// Candle history owned by the ingestion side.
///
/// `SqliteStore` implements this for production.
/// `MemoryStore` implements this for tests and dry runs.
#[async_trait]
pub trait CandleStore: Send + Sync {
    /// Insert a candle keyed by `(pair, timestamp)`. A candle that already
    /// exists is left untouched; the stored row is returned either way.
    async fn upsert_candle(&self, candle: &Candle) -> Result<Candle>;

    async fn candle(&self, id: &str) -> Result<Option<Candle>>;

    /// Up to `limit` candles of `pair` with `timestamp <= until`, newest first.
    async fn recent_candles(
        &self,
        pair: &str,
        until: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Candle>>;
}

/// Sink for analysis results.
///
/// Writes are upserts: predictions are keyed by
/// `(candle_id, strategy_name)`, consensus rows by `candle_id`.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    async fn upsert_prediction(&self, prediction: &StrategyPrediction) -> Result<()>;

    /// Drop the prediction a strategy made for a candle, if any.
    async fn delete_prediction(&self, candle_id: &str, strategy_name: &str) -> Result<()>;

    async fn upsert_consensus(&self, consensus: &ConsensusAnalysis) -> Result<()>;

    async fn predictions_for(&self, candle_id: &str) -> Result<Vec<StrategyPrediction>>;

    async fn consensus_for(&self, candle_id: &str) -> Result<Option<ConsensusAnalysis>>;

    /// Latest consensus rows for a pair, newest entry first.
    async fn recent_consensus(&self, pair: &str, limit: usize) -> Result<Vec<ConsensusAnalysis>>;

    /// Mirror strategy metadata, keyed by strategy id. Returns rows written.
    async fn upsert_strategy_configs(&self, configs: &[StrategyConfigRecord]) -> Result<usize>;
}
