use common::{Candle, CandleColor, Verdict};

use crate::rules::{count_colors, tail};
use crate::{Rule, RuleFault};

/// Side with the minority color of the last three candles.
pub struct Minority;

impl Rule for Minority {
    fn min_candles(&self) -> usize {
        3
    }

    fn base_confidence(&self) -> f64 {
        80.0
    }

    fn detect(&self, window: &[Candle]) -> Result<Verdict, RuleFault> {
        match count_colors(tail(window, 3)) {
            (1, 2) => Ok(Verdict::predict(
                CandleColor::Green,
                self.base_confidence(),
                "minority: 1 green and 2 red, siding with the minority (green)",
            )),
            (2, 1) => Ok(Verdict::predict(
                CandleColor::Red,
                self.base_confidence(),
                "minority: 1 red and 2 green, siding with the minority (red)",
            )),
            _ => Ok(Verdict::abstain("minority pattern not identified")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::fixtures::*;
    use common::INSUFFICIENT_DATA;

    #[test]
    fn two_candles_are_insufficient() {
        let verdict = Minority.evaluate(&[weak_green(0), weak_red(1)]).unwrap();
        assert_eq!(verdict.reasoning, INSUFFICIENT_DATA);
    }

    #[test]
    fn lone_green_predicts_green() {
        let window = vec![weak_red(0), weak_green(1), weak_red(2)];
        let verdict = Minority.evaluate(&window).unwrap();
        assert_eq!(verdict.prediction, Some(CandleColor::Green));
        assert_eq!(verdict.confidence, 80.0);
    }

    #[test]
    fn lone_red_predicts_red() {
        let window = vec![weak_green(0), weak_green(1), weak_red(2)];
        let verdict = Minority.evaluate(&window).unwrap();
        assert_eq!(verdict.prediction, Some(CandleColor::Red));
    }

    #[test]
    fn uniform_colors_abstain() {
        let window = vec![weak_green(0), weak_green(1), weak_green(2)];
        let verdict = Minority.evaluate(&window).unwrap();
        assert!(verdict.is_abstention());
        assert_eq!(verdict.reasoning, "minority pattern not identified");
    }
}
