use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use common::{
    AnalysisStore, Candle, CandleStore, ConsensusAnalysis, Result, StrategyConfigRecord,
    StrategyPrediction,
};

#[derive(Default)]
struct Tables {
    candles: HashMap<String, Candle>,
    /// `(pair, timestamp)` → candle id
    candle_keys: HashMap<(String, DateTime<Utc>), String>,
    predictions: HashMap<(String, String), StrategyPrediction>,
    consensus: HashMap<String, ConsensusAnalysis>,
    strategy_configs: HashMap<String, StrategyConfigRecord>,
}

/// In-process store with the same upsert keys as the SQLite tables.
/// Used by tests and for running without a database file.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored strategy config row, in no particular order.
    pub async fn strategy_configs(&self) -> Vec<StrategyConfigRecord> {
        self.tables
            .read()
            .await
            .strategy_configs
            .values()
            .cloned()
            .collect()
    }

    pub async fn prediction_count(&self) -> usize {
        self.tables.read().await.predictions.len()
    }

    pub async fn consensus_count(&self) -> usize {
        self.tables.read().await.consensus.len()
    }
}

#[async_trait]
impl CandleStore for MemoryStore {
    async fn upsert_candle(&self, candle: &Candle) -> Result<Candle> {
        let mut tables = self.tables.write().await;
        let key = (candle.pair.clone(), candle.timestamp);

        // First ingestion wins; candles never change afterwards
        if let Some(id) = tables.candle_keys.get(&key) {
            if let Some(existing) = tables.candles.get(id) {
                return Ok(existing.clone());
            }
        }
        tables.candle_keys.insert(key, candle.id.clone());
        tables.candles.insert(candle.id.clone(), candle.clone());
        debug!(candle_id = %candle.id, pair = %candle.pair, "Candle inserted");
        Ok(candle.clone())
    }

    async fn candle(&self, id: &str) -> Result<Option<Candle>> {
        Ok(self.tables.read().await.candles.get(id).cloned())
    }

    async fn recent_candles(
        &self,
        pair: &str,
        until: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let tables = self.tables.read().await;
        let mut candles: Vec<Candle> = tables
            .candles
            .values()
            .filter(|c| c.pair == pair && c.timestamp <= until)
            .cloned()
            .collect();
        candles.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        candles.truncate(limit);
        Ok(candles)
    }
}

#[async_trait]
impl AnalysisStore for MemoryStore {
    async fn upsert_prediction(&self, prediction: &StrategyPrediction) -> Result<()> {
        let key = (
            prediction.candle_id.clone(),
            prediction.strategy_name.clone(),
        );
        self.tables
            .write()
            .await
            .predictions
            .insert(key, prediction.clone());
        Ok(())
    }

    async fn delete_prediction(&self, candle_id: &str, strategy_name: &str) -> Result<()> {
        let key = (candle_id.to_string(), strategy_name.to_string());
        self.tables.write().await.predictions.remove(&key);
        Ok(())
    }

    async fn upsert_consensus(&self, consensus: &ConsensusAnalysis) -> Result<()> {
        let mut tables = self.tables.write().await;
        let mut record = consensus.clone();
        // Outcome columns belong to the reveal process
        if let Some(existing) = tables.consensus.get(&consensus.candle_id) {
            record.actual_color = existing.actual_color;
            record.result = existing.result;
        }
        tables.consensus.insert(record.candle_id.clone(), record);
        Ok(())
    }

    async fn predictions_for(&self, candle_id: &str) -> Result<Vec<StrategyPrediction>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<StrategyPrediction> = tables
            .predictions
            .values()
            .filter(|p| p.candle_id == candle_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.strategy_name.cmp(&b.strategy_name));
        Ok(rows)
    }

    async fn consensus_for(&self, candle_id: &str) -> Result<Option<ConsensusAnalysis>> {
        Ok(self.tables.read().await.consensus.get(candle_id).cloned())
    }

    async fn recent_consensus(&self, pair: &str, limit: usize) -> Result<Vec<ConsensusAnalysis>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<ConsensusAnalysis> = tables
            .consensus
            .values()
            .filter(|c| c.pair == pair)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.entry_timestamp.cmp(&a.entry_timestamp));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn upsert_strategy_configs(&self, configs: &[StrategyConfigRecord]) -> Result<usize> {
        let mut tables = self.tables.write().await;
        for config in configs {
            tables
                .strategy_configs
                .insert(config.id.clone(), config.clone());
        }
        Ok(configs.len())
    }
}
