use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use common::{
    AnalysisStore, Candle, CandleColor, CandleStore, ConsensusAnalysis, ConsensusOutcome, Error,
    PredictionResult, Result, StrategyConfigRecord, StrategyPrediction,
};

/// SQLite-backed store for candles and analysis results.
///
/// Timestamps are stored as fixed-width RFC 3339 text (millisecond precision,
/// `Z` suffix) so that string order matches time order.
#[derive(Clone)]
pub struct SqliteStore {
    db: SqlitePool,
}

impl SqliteStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Apply the workspace migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.db).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }
}

fn ts(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Database(sqlx::Error::Decode(Box::new(e))))
}

// ─── Row types ────────────────────────────────────────────────────────────────

#[derive(FromRow)]
struct CandleRow {
    id: String,
    pair: String,
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

impl TryFrom<CandleRow> for Candle {
    type Error = Error;

    fn try_from(row: CandleRow) -> Result<Self> {
        Ok(Candle {
            id: row.id,
            pair: row.pair,
            timestamp: parse_ts(&row.timestamp)?,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
        })
    }
}

#[derive(FromRow)]
struct PredictionRow {
    candle_id: String,
    pair: String,
    timestamp: String,
    strategy_name: String,
    prediction: CandleColor,
    confidence: f64,
    reasoning: String,
}

impl TryFrom<PredictionRow> for StrategyPrediction {
    type Error = Error;

    fn try_from(row: PredictionRow) -> Result<Self> {
        Ok(StrategyPrediction {
            candle_id: row.candle_id,
            pair: row.pair,
            timestamp: parse_ts(&row.timestamp)?,
            strategy_name: row.strategy_name,
            prediction: row.prediction,
            confidence: row.confidence,
            reasoning: row.reasoning,
        })
    }
}

#[derive(FromRow)]
struct ConsensusRow {
    candle_id: String,
    pair: String,
    entry_timestamp: String,
    reveal_timestamp: String,
    total_strategies: i64,
    green_predictions: i64,
    red_predictions: i64,
    consensus_confidence: i64,
    actual_color: Option<CandleColor>,
    result: Option<String>,
}

impl TryFrom<ConsensusRow> for ConsensusAnalysis {
    type Error = Error;

    fn try_from(row: ConsensusRow) -> Result<Self> {
        let green = row.green_predictions as u32;
        let red = row.red_predictions as u32;
        Ok(ConsensusAnalysis {
            candle_id: row.candle_id,
            pair: row.pair,
            entry_timestamp: parse_ts(&row.entry_timestamp)?,
            reveal_timestamp: parse_ts(&row.reveal_timestamp)?,
            total_strategies: row.total_strategies as u32,
            green_votes: green,
            red_votes: red,
            outcome: ConsensusOutcome::from_votes(green, red),
            consensus_confidence: row.consensus_confidence as u32,
            actual_color: row.actual_color,
            result: row.result.as_deref().and_then(PredictionResult::parse),
        })
    }
}

const CONSENSUS_COLUMNS: &str = "candle_id, pair, entry_timestamp, reveal_timestamp, \
     total_strategies, green_predictions, red_predictions, consensus_confidence, \
     actual_color, result";

// ─── Store impls ──────────────────────────────────────────────────────────────

#[async_trait]
impl CandleStore for SqliteStore {
    async fn upsert_candle(&self, candle: &Candle) -> Result<Candle> {
        let stamp = ts(candle.timestamp);
        sqlx::query(
            r#"
            INSERT INTO forex_candles (id, pair, timestamp, open, high, low, close, color)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(pair, timestamp) DO NOTHING
            "#,
        )
        .bind(&candle.id)
        .bind(&candle.pair)
        .bind(&stamp)
        .bind(candle.open)
        .bind(candle.high)
        .bind(candle.low)
        .bind(candle.close)
        .bind(candle.color())
        .execute(&self.db)
        .await?;

        let row: CandleRow = sqlx::query_as(
            "SELECT id, pair, timestamp, open, high, low, close FROM forex_candles \
             WHERE pair = ?1 AND timestamp = ?2",
        )
        .bind(&candle.pair)
        .bind(&stamp)
        .fetch_one(&self.db)
        .await?;

        debug!(candle_id = %row.id, pair = %row.pair, "Candle stored");
        row.try_into()
    }

    async fn candle(&self, id: &str) -> Result<Option<Candle>> {
        let row: Option<CandleRow> = sqlx::query_as(
            "SELECT id, pair, timestamp, open, high, low, close FROM forex_candles WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        row.map(Candle::try_from).transpose()
    }

    async fn recent_candles(
        &self,
        pair: &str,
        until: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let rows: Vec<CandleRow> = sqlx::query_as(
            r#"
            SELECT id, pair, timestamp, open, high, low, close
            FROM forex_candles
            WHERE pair = ?1 AND timestamp <= ?2
            ORDER BY timestamp DESC
            LIMIT ?3
            "#,
        )
        .bind(pair)
        .bind(ts(until))
        .bind(limit as i64)
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(Candle::try_from).collect()
    }
}

#[async_trait]
impl AnalysisStore for SqliteStore {
    async fn upsert_prediction(&self, p: &StrategyPrediction) -> Result<()> {
        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO strategy_predictions
                (id, candle_id, pair, timestamp, strategy_name, prediction, confidence, reasoning)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(candle_id, strategy_name) DO UPDATE SET
                pair = excluded.pair,
                timestamp = excluded.timestamp,
                prediction = excluded.prediction,
                confidence = excluded.confidence,
                reasoning = excluded.reasoning
            "#,
        )
        .bind(id)
        .bind(&p.candle_id)
        .bind(&p.pair)
        .bind(ts(p.timestamp))
        .bind(&p.strategy_name)
        .bind(p.prediction)
        .bind(p.confidence)
        .bind(&p.reasoning)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn delete_prediction(&self, candle_id: &str, strategy_name: &str) -> Result<()> {
        sqlx::query("DELETE FROM strategy_predictions WHERE candle_id = ?1 AND strategy_name = ?2")
            .bind(candle_id)
            .bind(strategy_name)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn upsert_consensus(&self, c: &ConsensusAnalysis) -> Result<()> {
        let id = uuid::Uuid::new_v4().to_string();
        // actual_color and result are left alone on conflict
        sqlx::query(
            r#"
            INSERT INTO consensus_analysis
                (id, candle_id, pair, entry_timestamp, reveal_timestamp, total_strategies,
                 green_predictions, red_predictions, consensus_prediction, consensus_confidence)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(candle_id) DO UPDATE SET
                pair = excluded.pair,
                entry_timestamp = excluded.entry_timestamp,
                reveal_timestamp = excluded.reveal_timestamp,
                total_strategies = excluded.total_strategies,
                green_predictions = excluded.green_predictions,
                red_predictions = excluded.red_predictions,
                consensus_prediction = excluded.consensus_prediction,
                consensus_confidence = excluded.consensus_confidence
            "#,
        )
        .bind(id)
        .bind(&c.candle_id)
        .bind(&c.pair)
        .bind(ts(c.entry_timestamp))
        .bind(ts(c.reveal_timestamp))
        .bind(c.total_strategies as i64)
        .bind(c.green_votes as i64)
        .bind(c.red_votes as i64)
        .bind(c.consensus_prediction())
        .bind(c.consensus_confidence as i64)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn predictions_for(&self, candle_id: &str) -> Result<Vec<StrategyPrediction>> {
        let rows: Vec<PredictionRow> = sqlx::query_as(
            r#"
            SELECT candle_id, pair, timestamp, strategy_name, prediction, confidence, reasoning
            FROM strategy_predictions
            WHERE candle_id = ?1
            ORDER BY strategy_name
            "#,
        )
        .bind(candle_id)
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(StrategyPrediction::try_from).collect()
    }

    async fn consensus_for(&self, candle_id: &str) -> Result<Option<ConsensusAnalysis>> {
        let sql = format!("SELECT {CONSENSUS_COLUMNS} FROM consensus_analysis WHERE candle_id = ?1");
        let row: Option<ConsensusRow> = sqlx::query_as(&sql)
            .bind(candle_id)
            .fetch_optional(&self.db)
            .await?;
        row.map(ConsensusAnalysis::try_from).transpose()
    }

    async fn recent_consensus(&self, pair: &str, limit: usize) -> Result<Vec<ConsensusAnalysis>> {
        let sql = format!(
            "SELECT {CONSENSUS_COLUMNS} FROM consensus_analysis \
             WHERE pair = ?1 ORDER BY entry_timestamp DESC LIMIT ?2"
        );
        let rows: Vec<ConsensusRow> = sqlx::query_as(&sql)
            .bind(pair)
            .bind(limit as i64)
            .fetch_all(&self.db)
            .await?;
        rows.into_iter().map(ConsensusAnalysis::try_from).collect()
    }

    async fn upsert_strategy_configs(&self, configs: &[StrategyConfigRecord]) -> Result<usize> {
        let mut tx = self.db.begin().await?;
        for cfg in configs {
            sqlx::query(
                r#"
                INSERT INTO strategies_config (id, name, description, enabled, weight, historical_winrate)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    description = excluded.description,
                    enabled = excluded.enabled,
                    weight = excluded.weight,
                    historical_winrate = excluded.historical_winrate,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                "#,
            )
            .bind(&cfg.id)
            .bind(&cfg.name)
            .bind(&cfg.description)
            .bind(cfg.enabled)
            .bind(cfg.weight)
            .bind(cfg.historical_winrate)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(configs.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn store() -> SqliteStore {
        // One connection so every query sees the same in-memory database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqliteStore::new(pool);
        store.migrate().await.unwrap();
        store
    }

    fn candle(m: i64) -> Candle {
        let ts = Utc.with_ymd_and_hms(2024, 1, 3, 10, 0, 0).unwrap() + Duration::minutes(m);
        Candle::new("EUR/USD", ts, 1.1, 1.2, 1.0, 1.15)
    }

    fn consensus(candle: &Candle, green: u32, red: u32) -> ConsensusAnalysis {
        ConsensusAnalysis {
            candle_id: candle.id.clone(),
            pair: candle.pair.clone(),
            entry_timestamp: candle.timestamp,
            reveal_timestamp: candle.timestamp + Duration::seconds(60),
            total_strategies: green + red,
            green_votes: green,
            red_votes: red,
            outcome: ConsensusOutcome::from_votes(green, red),
            consensus_confidence: 60,
            actual_color: None,
            result: None,
        }
    }

    #[tokio::test]
    async fn candle_round_trips_and_keeps_first_row() {
        let store = store().await;
        let first = store.upsert_candle(&candle(0)).await.unwrap();

        let mut again = candle(0);
        again.close = 1.05;
        let second = store.upsert_candle(&again).await.unwrap();
        assert_eq!(second, first);

        let loaded = store.candle(&first.id).await.unwrap().unwrap();
        assert_eq!(loaded, first);
    }

    #[tokio::test]
    async fn recent_candles_respects_until_and_limit() {
        let store = store().await;
        for m in 0..25 {
            store.upsert_candle(&candle(m)).await.unwrap();
        }
        let until = candle(21).timestamp;
        let rows = store.recent_candles("EUR/USD", until, 20).await.unwrap();
        assert_eq!(rows.len(), 20);
        assert_eq!(rows[0].timestamp, until);
        assert_eq!(rows[19].timestamp, candle(2).timestamp);
    }

    #[tokio::test]
    async fn consensus_upsert_is_idempotent_and_keeps_outcome() {
        let store = store().await;
        let c = store.upsert_candle(&candle(0)).await.unwrap();
        store.upsert_consensus(&consensus(&c, 3, 2)).await.unwrap();

        sqlx::query("UPDATE consensus_analysis SET actual_color = 'red', result = 'LOSS' WHERE candle_id = ?1")
            .bind(&c.id)
            .execute(store.pool())
            .await
            .unwrap();

        store.upsert_consensus(&consensus(&c, 1, 2)).await.unwrap();
        let loaded = store.consensus_for(&c.id).await.unwrap().unwrap();
        assert_eq!(loaded.consensus_prediction(), Some(CandleColor::Red));
        assert_eq!(loaded.actual_color, Some(CandleColor::Red));
        assert_eq!(loaded.result, Some(PredictionResult::Loss));
        assert_eq!(store.recent_consensus("EUR/USD", 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_consensus_is_stored_with_null_prediction() {
        let store = store().await;
        let c = store.upsert_candle(&candle(0)).await.unwrap();
        store.upsert_consensus(&consensus(&c, 0, 0)).await.unwrap();

        let stored: Option<String> = sqlx::query_scalar(
            "SELECT consensus_prediction FROM consensus_analysis WHERE candle_id = ?1",
        )
        .bind(&c.id)
        .fetch_one(store.pool())
        .await
        .unwrap();
        assert!(stored.is_none());
    }

    #[tokio::test]
    async fn prediction_upsert_replaces_same_strategy() {
        let store = store().await;
        let c = store.upsert_candle(&candle(0)).await.unwrap();
        let mut p = StrategyPrediction {
            candle_id: c.id.clone(),
            pair: c.pair.clone(),
            timestamp: c.timestamp,
            strategy_name: "MHI".to_string(),
            prediction: CandleColor::Red,
            confidence: 90.0,
            reasoning: "first".to_string(),
        };
        store.upsert_prediction(&p).await.unwrap();
        p.prediction = CandleColor::Green;
        p.reasoning = "second".to_string();
        store.upsert_prediction(&p).await.unwrap();

        let rows = store.predictions_for(&c.id).await.unwrap();
        assert_eq!(rows, vec![p]);
    }

    #[tokio::test]
    async fn deleted_prediction_is_gone() {
        let store = store().await;
        let c = store.upsert_candle(&candle(0)).await.unwrap();
        let p = StrategyPrediction {
            candle_id: c.id.clone(),
            pair: c.pair.clone(),
            timestamp: c.timestamp,
            strategy_name: "MHI".to_string(),
            prediction: CandleColor::Red,
            confidence: 90.0,
            reasoning: "first".to_string(),
        };
        store.upsert_prediction(&p).await.unwrap();

        store.delete_prediction(&c.id, "MHI").await.unwrap();
        assert!(store.predictions_for(&c.id).await.unwrap().is_empty());
        // Deleting a missing row is fine
        store.delete_prediction(&c.id, "MHI").await.unwrap();
    }

    #[tokio::test]
    async fn strategy_configs_are_upserted_by_id() {
        let store = store().await;
        let mut record = StrategyConfigRecord {
            id: "5".to_string(),
            name: "MHI".to_string(),
            description: "majority".to_string(),
            enabled: true,
            weight: 0.85,
            historical_winrate: 85.0,
        };
        assert_eq!(store.upsert_strategy_configs(&[record.clone()]).await.unwrap(), 1);
        record.weight = 0.9;
        store.upsert_strategy_configs(&[record]).await.unwrap();

        let (count, weight): (i64, f64) =
            sqlx::query_as("SELECT COUNT(*), MAX(weight) FROM strategies_config")
                .fetch_one(store.pool())
                .await
                .unwrap();
        assert_eq!(count, 1);
        assert!((weight - 0.9).abs() < 1e-9);
    }
}
