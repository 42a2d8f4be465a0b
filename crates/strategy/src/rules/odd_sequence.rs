use common::{Candle, Verdict};

use crate::rules::tail;
use crate::{Rule, RuleFault};

/// Three same-colored candles in a row: fade the run.
pub struct OddSequence;

impl Rule for OddSequence {
    fn min_candles(&self) -> usize {
        3
    }

    fn base_confidence(&self) -> f64 {
        71.4
    }

    fn detect(&self, window: &[Candle]) -> Result<Verdict, RuleFault> {
        let last3 = tail(window, 3);
        let run_color = last3[0].color();

        if last3.iter().all(|c| c.color() == run_color) {
            let prediction = run_color.opposite();
            return Ok(Verdict::predict(
                prediction,
                self.base_confidence(),
                format!("odd sequence of 3 {run_color} candles, entering against the run ({prediction})"),
            ));
        }

        Ok(Verdict::abstain("odd sequence not identified"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::fixtures::*;
    use common::{CandleColor, INSUFFICIENT_DATA};

    #[test]
    fn two_candles_are_insufficient() {
        let verdict = OddSequence.evaluate(&[weak_red(0), weak_red(1)]).unwrap();
        assert_eq!(verdict.reasoning, INSUFFICIENT_DATA);
    }

    #[test]
    fn green_run_predicts_red() {
        let window = vec![weak_green(0), strong_green(1), weak_green(2)];
        let verdict = OddSequence.evaluate(&window).unwrap();
        assert_eq!(verdict.prediction, Some(CandleColor::Red));
        assert_eq!(verdict.confidence, 71.4);
        assert_eq!(
            verdict.reasoning,
            "odd sequence of 3 green candles, entering against the run (red)"
        );
    }

    #[test]
    fn mixed_colors_abstain() {
        let window = vec![weak_green(0), weak_green(1), weak_red(2)];
        let verdict = OddSequence.evaluate(&window).unwrap();
        assert!(verdict.is_abstention());
        assert_eq!(verdict.reasoning, "odd sequence not identified");
    }
}
