use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use chrono::{Duration, Local, NaiveDateTime};
use futures_util::future::join_all;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use common::{
    AnalysisStore, Candle, CandleColor, CandleStore, ConsensusAnalysis, Error, Result,
    StrategyPrediction, Verdict,
};
use strategy::adjuster::adjust_verdict;
use strategy::{RuleFault, StrategyDefinition, StrategyRegistry};

use crate::consensus::{build_consensus, VoteTally};
use crate::window::{CandleWindow, MAX_WINDOW};

/// One strategy's verdict for the analyzed candle, after fault mapping and
/// the time bonus.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyVerdict {
    pub strategy_id: String,
    pub strategy_name: String,
    pub prediction: Option<CandleColor>,
    pub confidence: f64,
    pub reasoning: String,
    /// Set when the rule faulted and the verdict is a forced abstention.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault: Option<String>,
    /// The prediction row for this verdict was written. Never set for
    /// abstentions.
    pub stored: bool,
}

impl StrategyVerdict {
    fn new(def: &StrategyDefinition, verdict: Verdict, fault: Option<String>) -> Self {
        Self {
            strategy_id: def.id.clone(),
            strategy_name: def.name.clone(),
            prediction: verdict.prediction,
            confidence: verdict.confidence,
            reasoning: verdict.reasoning,
            fault,
            stored: false,
        }
    }
}

/// Everything one analysis run produced.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub candle_id: String,
    pub pair: String,
    pub window_len: usize,
    /// One entry per registered strategy, in registry order.
    pub verdicts: Vec<StrategyVerdict>,
    /// Predicting verdicts that were written successfully.
    pub stored_predictions: usize,
    pub consensus: ConsensusAnalysis,
}

/// Run every strategy in the registry against the window, in registry order.
///
/// A rule that returns a fault or panics yields an abstention for that
/// strategy only. Predicting verdicts get the time bonus for `at`.
pub fn evaluate_panel(
    registry: &StrategyRegistry,
    window: &CandleWindow,
    at: NaiveDateTime,
) -> Vec<StrategyVerdict> {
    registry
        .iter()
        .map(|def| match run_isolated(def, window.candles()) {
            Ok(verdict) => {
                let verdict = adjust_verdict(verdict, def, at);
                debug!(
                    strategy = %def.name,
                    prediction = ?verdict.prediction,
                    confidence = verdict.confidence,
                    "Rule evaluated"
                );
                StrategyVerdict::new(def, verdict, None)
            }
            Err(fault) => {
                error!(strategy = %def.name, error = %fault, "Rule faulted, counting as abstention");
                let verdict = Verdict::abstain(format!("rule error: {fault}"));
                StrategyVerdict::new(def, verdict, Some(fault.to_string()))
            }
        })
        .collect()
}

fn run_isolated(def: &StrategyDefinition, window: &[Candle]) -> Result<Verdict, RuleFault> {
    match catch_unwind(AssertUnwindSafe(|| def.rule.evaluate(window))) {
        Ok(result) => result,
        Err(payload) => {
            let msg = if let Some(s) = payload.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            };
            Err(RuleFault::Panicked(msg))
        }
    }
}

/// Runs the strategy panel for a candle and records the outcome.
///
/// This is the only component that writes predictions and consensus rows.
pub struct Analyzer {
    registry: Arc<StrategyRegistry>,
    candles: Arc<dyn CandleStore>,
    results: Arc<dyn AnalysisStore>,
    bar_interval: Duration,
    consensus_tx: broadcast::Sender<ConsensusAnalysis>,
}

impl Analyzer {
    pub fn new(
        registry: Arc<StrategyRegistry>,
        candles: Arc<dyn CandleStore>,
        results: Arc<dyn AnalysisStore>,
        bar_interval: Duration,
    ) -> Self {
        let (consensus_tx, _) = broadcast::channel(256);
        Self {
            registry,
            candles,
            results,
            bar_interval,
            consensus_tx,
        }
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// Subscribe to every consensus record the analyzer writes.
    pub fn subscribe(&self) -> broadcast::Receiver<ConsensusAnalysis> {
        self.consensus_tx.subscribe()
    }

    /// Analyze a candle using the local wall clock for the time bonus.
    pub async fn analyze(&self, candle_id: &str, pair: &str) -> Result<AnalysisReport> {
        self.analyze_at(candle_id, pair, Local::now().naive_local())
            .await
    }

    /// Analyze a candle as if evaluated at `at`.
    ///
    /// Re-running for the same candle overwrites the earlier predictions and
    /// consensus row. A strategy that abstains on the rerun loses its old
    /// prediction row.
    pub async fn analyze_at(
        &self,
        candle_id: &str,
        pair: &str,
        at: NaiveDateTime,
    ) -> Result<AnalysisReport> {
        let started = Instant::now();
        let window = self.load_window(candle_id, pair).await?;
        let target = window.target().clone();
        info!(
            candle_id = %target.id,
            pair = %target.pair,
            window = window.len(),
            "Analyzing candle"
        );

        let mut verdicts = evaluate_panel(&self.registry, &window, at);
        let (tally, stored) = self.persist_predictions(&target, &mut verdicts).await;
        if tally.total() == 0 {
            warn!(candle_id = %target.id, "No strategy produced a prediction");
        }

        let consensus = build_consensus(&target, tally, self.bar_interval);
        self.results.upsert_consensus(&consensus).await?;
        // No subscribers is fine
        let _ = self.consensus_tx.send(consensus.clone());

        info!(
            candle_id = %target.id,
            pair = %target.pair,
            green = consensus.green_votes,
            red = consensus.red_votes,
            prediction = ?consensus.consensus_prediction(),
            confidence = consensus.consensus_confidence,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Consensus recorded"
        );

        Ok(AnalysisReport {
            candle_id: target.id.clone(),
            pair: target.pair.clone(),
            window_len: window.len(),
            verdicts,
            stored_predictions: stored,
            consensus,
        })
    }

    async fn load_window(&self, candle_id: &str, pair: &str) -> Result<CandleWindow> {
        let target = self
            .candles
            .candle(candle_id)
            .await?
            .ok_or_else(|| Error::CandleNotFound(candle_id.to_string()))?;

        if target.pair != pair {
            warn!(
                candle_id = %candle_id,
                requested = %pair,
                stored = %target.pair,
                "Pair does not match stored candle, using the candle's pair"
            );
        }

        let history = self
            .candles
            .recent_candles(&target.pair, target.timestamp, MAX_WINDOW)
            .await?;
        if history.is_empty() {
            return Err(Error::InsufficientHistory {
                pair: target.pair.clone(),
            });
        }

        Ok(CandleWindow::build(&target, history))
    }

    /// Write every predicting verdict and clear the row of every abstaining
    /// one, concurrently. Only predictions that were stored are tallied; a
    /// failed write is logged and left out.
    async fn persist_predictions(
        &self,
        target: &Candle,
        verdicts: &mut [StrategyVerdict],
    ) -> (VoteTally, usize) {
        let writes = verdicts.iter().map(|v| async move {
            match v.prediction {
                Some(color) => {
                    let record = StrategyPrediction {
                        candle_id: target.id.clone(),
                        pair: target.pair.clone(),
                        timestamp: target.timestamp,
                        strategy_name: v.strategy_name.clone(),
                        prediction: color,
                        confidence: v.confidence,
                        reasoning: v.reasoning.clone(),
                    };
                    self.results.upsert_prediction(&record).await
                }
                None => {
                    self.results
                        .delete_prediction(&target.id, &v.strategy_name)
                        .await
                }
            }
        });
        let outcomes = join_all(writes).await;

        let mut tally = VoteTally::default();
        let mut stored = 0;
        for (verdict, outcome) in verdicts.iter_mut().zip(outcomes) {
            match (verdict.prediction, outcome) {
                (Some(color), Ok(())) => {
                    verdict.stored = true;
                    tally.record(color);
                    stored += 1;
                }
                (None, Ok(())) => {}
                (Some(_), Err(e)) => {
                    error!(
                        candle_id = %target.id,
                        strategy = %verdict.strategy_name,
                        error = %e,
                        "Failed to persist prediction"
                    );
                }
                (None, Err(e)) => {
                    error!(
                        candle_id = %target.id,
                        strategy = %verdict.strategy_name,
                        error = %e,
                        "Failed to clear stale prediction"
                    );
                }
            }
        }
        (tally, stored)
    }
}
