use common::{Candle, Verdict};

use crate::{Rule, RuleFault};

/// The current candle has a body above 70% of its range.
/// The only rule usable on a single-candle window.
pub struct StrongCandle;

impl Rule for StrongCandle {
    fn min_candles(&self) -> usize {
        1
    }

    fn base_confidence(&self) -> f64 {
        90.9
    }

    fn detect(&self, window: &[Candle]) -> Result<Verdict, RuleFault> {
        let current = &window[window.len() - 1];

        if current.is_strong() {
            let color = current.color();
            return Ok(Verdict::predict(
                color,
                self.base_confidence(),
                format!("strong {color} candle: large body with short wicks suggests continuation"),
            ));
        }

        Ok(Verdict::abstain("strong candle not identified"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::fixtures::*;
    use common::{CandleColor, INSUFFICIENT_DATA};

    #[test]
    fn empty_window_is_insufficient() {
        let verdict = StrongCandle.evaluate(&[]).unwrap();
        assert_eq!(verdict.reasoning, INSUFFICIENT_DATA);
    }

    #[test]
    fn strong_red_predicts_red() {
        let verdict = StrongCandle.evaluate(&[strong_red(0)]).unwrap();
        assert_eq!(verdict.prediction, Some(CandleColor::Red));
        assert_eq!(verdict.confidence, 90.9);
        assert!(verdict.reasoning.contains("strong red"));
    }

    #[test]
    fn weak_candle_abstains() {
        let verdict = StrongCandle.evaluate(&[strong_green(0), weak_green(1)]).unwrap();
        assert!(verdict.is_abstention());
        assert_eq!(verdict.reasoning, "strong candle not identified");
    }
}
