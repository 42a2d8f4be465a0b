use common::{Candle, Verdict};

use crate::rules::tail;
use crate::{Rule, RuleFault};

/// Green/red/green or red/green/red: bet on the alternation continuing.
pub struct ColorAlternation;

impl Rule for ColorAlternation {
    fn min_candles(&self) -> usize {
        3
    }

    fn base_confidence(&self) -> f64 {
        72.2
    }

    fn detect(&self, window: &[Candle]) -> Result<Verdict, RuleFault> {
        let last3 = tail(window, 3);
        let (first, middle, last) = (last3[0].color(), last3[1].color(), last3[2].color());

        if first == last && middle != last {
            let prediction = last.opposite();
            return Ok(Verdict::predict(
                prediction,
                self.base_confidence(),
                format!("color alternation identified, next candle expected {prediction}"),
            ));
        }

        Ok(Verdict::abstain("color alternation not identified"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::fixtures::*;
    use common::{CandleColor, INSUFFICIENT_DATA};

    #[test]
    fn two_candles_are_insufficient() {
        let verdict = ColorAlternation
            .evaluate(&[weak_green(0), weak_red(1)])
            .unwrap();
        assert_eq!(verdict.reasoning, INSUFFICIENT_DATA);
    }

    #[test]
    fn green_red_green_predicts_red() {
        let window = vec![weak_green(0), weak_red(1), weak_green(2)];
        let verdict = ColorAlternation.evaluate(&window).unwrap();
        assert_eq!(verdict.prediction, Some(CandleColor::Red));
        assert_eq!(verdict.confidence, 72.2);
    }

    #[test]
    fn red_green_red_predicts_green() {
        let window = vec![weak_red(0), weak_green(1), weak_red(2)];
        let verdict = ColorAlternation.evaluate(&window).unwrap();
        assert_eq!(verdict.prediction, Some(CandleColor::Green));
    }

    #[test]
    fn pair_then_change_abstains() {
        let window = vec![weak_green(0), weak_green(1), weak_red(2)];
        let verdict = ColorAlternation.evaluate(&window).unwrap();
        assert!(verdict.is_abstention());
        assert_eq!(verdict.reasoning, "color alternation not identified");
    }
}
