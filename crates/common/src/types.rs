use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Reasoning attached to every abstention caused by a short window.
pub const INSUFFICIENT_DATA: &str = "insufficient data";

/// Directional classification of a candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum CandleColor {
    Green,
    Red,
}

impl CandleColor {
    pub fn opposite(self) -> Self {
        match self {
            CandleColor::Green => CandleColor::Red,
            CandleColor::Red => CandleColor::Green,
        }
    }
}

impl std::fmt::Display for CandleColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CandleColor::Green => write!(f, "green"),
            CandleColor::Red => write!(f, "red"),
        }
    }
}

/// One fixed-duration OHLC bar for a currency pair.
///
/// Candles are keyed by `(pair, timestamp)`. The `id` is assigned on first
/// ingestion and survives re-ingestion of the same bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub id: String,
    /// Currency pair, e.g. "EUR/USD".
    pub pair: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    pub fn new(
        pair: impl Into<String>,
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            pair: pair.into(),
            timestamp,
            open,
            high,
            low,
            close,
        }
    }

    /// Green when the close is at or above the open.
    pub fn color(&self) -> CandleColor {
        if self.close >= self.open {
            CandleColor::Green
        } else {
            CandleColor::Red
        }
    }

    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn upper_wick(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    pub fn lower_wick(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Body below 10% of the range.
    pub fn is_doji(&self) -> bool {
        let range = self.range();
        range > 0.0 && self.body() / range < 0.1
    }

    /// Body above 70% of the range.
    pub fn is_strong(&self) -> bool {
        let range = self.range();
        range > 0.0 && self.body() / range > 0.7
    }

    /// `low <= min(open, close)` and `high >= max(open, close)`, all finite.
    pub fn is_well_formed(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        prices.iter().all(|p| p.is_finite())
            && self.low <= self.open.min(self.close)
            && self.high >= self.open.max(self.close)
    }
}

/// The output of one rule evaluation for one candle window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// `None` is an abstention.
    pub prediction: Option<CandleColor>,
    /// 0–100. Only meaningful when `prediction` is set.
    pub confidence: f64,
    pub reasoning: String,
}

impl Verdict {
    pub fn predict(color: CandleColor, confidence: f64, reasoning: impl Into<String>) -> Self {
        Self {
            prediction: Some(color),
            confidence,
            reasoning: reasoning.into(),
        }
    }

    pub fn abstain(reasoning: impl Into<String>) -> Self {
        Self {
            prediction: None,
            confidence: 0.0,
            reasoning: reasoning.into(),
        }
    }

    pub fn insufficient_data() -> Self {
        Self::abstain(INSUFFICIENT_DATA)
    }

    pub fn is_abstention(&self) -> bool {
        self.prediction.is_none()
    }
}

/// A predicting verdict bound to a candle and strategy.
/// Unique per `(candle_id, strategy_name)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyPrediction {
    pub candle_id: String,
    pub pair: String,
    /// Entry timestamp: the analyzed candle's timestamp.
    pub timestamp: DateTime<Utc>,
    pub strategy_name: String,
    pub prediction: CandleColor,
    pub confidence: f64,
    pub reasoning: String,
}

/// Outcome of the vote count for one candle.
///
/// `Tied` and `NoVotes` both serialize to a null prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsensusOutcome {
    Decided(CandleColor),
    /// Equal, non-zero green and red votes.
    Tied,
    /// Every strategy abstained.
    NoVotes,
}

impl ConsensusOutcome {
    pub fn from_votes(green: u32, red: u32) -> Self {
        match green.cmp(&red) {
            std::cmp::Ordering::Greater => ConsensusOutcome::Decided(CandleColor::Green),
            std::cmp::Ordering::Less => ConsensusOutcome::Decided(CandleColor::Red),
            std::cmp::Ordering::Equal if green == 0 => ConsensusOutcome::NoVotes,
            std::cmp::Ordering::Equal => ConsensusOutcome::Tied,
        }
    }

    pub fn prediction(&self) -> Option<CandleColor> {
        match self {
            ConsensusOutcome::Decided(color) => Some(*color),
            ConsensusOutcome::Tied | ConsensusOutcome::NoVotes => None,
        }
    }
}

impl Serialize for ConsensusOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.prediction().serialize(serializer)
    }
}

/// Outcome of a revealed prediction. Filled by an external process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PredictionResult {
    Win,
    Loss,
    Pending,
}

impl PredictionResult {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "WIN" => Some(PredictionResult::Win),
            "LOSS" => Some(PredictionResult::Loss),
            "PENDING" => Some(PredictionResult::Pending),
            _ => None,
        }
    }
}

impl std::fmt::Display for PredictionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PredictionResult::Win => write!(f, "WIN"),
            PredictionResult::Loss => write!(f, "LOSS"),
            PredictionResult::Pending => write!(f, "PENDING"),
        }
    }
}

/// Aggregated vote for one candle. Unique per `candle_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsensusAnalysis {
    pub candle_id: String,
    pub pair: String,
    pub entry_timestamp: DateTime<Utc>,
    /// When the predicted candle's true color becomes observable.
    pub reveal_timestamp: DateTime<Utc>,
    /// Strategies that voted; abstentions excluded.
    pub total_strategies: u32,
    #[serde(rename = "green_predictions")]
    pub green_votes: u32,
    #[serde(rename = "red_predictions")]
    pub red_votes: u32,
    #[serde(rename = "consensus_prediction")]
    pub outcome: ConsensusOutcome,
    pub consensus_confidence: u32,
    pub actual_color: Option<CandleColor>,
    pub result: Option<PredictionResult>,
}

impl ConsensusAnalysis {
    pub fn consensus_prediction(&self) -> Option<CandleColor> {
        self.outcome.prediction()
    }
}

/// Mirror of a strategy definition written to the `strategies_config` table.
/// The engine never reads these rows back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfigRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    pub enabled: bool,
    /// Historical win-rate normalised to 0–1.
    pub weight: f64,
    pub historical_winrate: f64,
}
