pub mod adjuster;
pub mod config;
pub mod registry;
pub mod rules;

pub use config::{StrategyConfig, StrategyFileConfig};
pub use registry::{StrategyDefinition, StrategyRegistry};
pub use rules::RuleKind;

use common::{Candle, Verdict};
use thiserror::Error;

/// A fault raised while executing one rule. Never escapes the per-rule
/// boundary: the analyzer turns it into an abstention.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleFault {
    #[error("malformed candle {candle_id} in window")]
    MalformedCandle { candle_id: String },

    #[error("rule panicked: {0}")]
    Panicked(String),

    #[error("{0}")]
    Other(String),
}

/// All pattern-detection rules must satisfy this trait.
///
/// Rules are pure: they read the window and nothing else. Time-of-day
/// adjustments happen outside the rule, in [`adjuster`].
pub trait Rule: Send + Sync {
    /// Shortest window the rule can evaluate.
    fn min_candles(&self) -> usize;

    /// Confidence reported on a match, before the time bonus.
    fn base_confidence(&self) -> f64;

    /// Pattern check on a window already known to hold `min_candles()`
    /// well-formed trailing candles.
    fn detect(&self, window: &[Candle]) -> Result<Verdict, RuleFault>;

    /// Evaluate a window ordered oldest first.
    ///
    /// Short windows abstain with "insufficient data".
    fn evaluate(&self, window: &[Candle]) -> Result<Verdict, RuleFault> {
        let needed = self.min_candles();
        if window.len() < needed {
            return Ok(Verdict::insufficient_data());
        }
        if let Some(bad) = rules::tail(window, needed)
            .iter()
            .find(|c| !c.is_well_formed())
        {
            return Err(RuleFault::MalformedCandle {
                candle_id: bad.id.clone(),
            });
        }
        self.detect(window)
    }
}
