use common::{Candle, CandleColor, Verdict};

use crate::{Rule, RuleFault};

/// Single-color engulfing: the current candle keeps the previous candle's
/// color, engulfs its open/close and has the larger body.
pub struct Engulfing;

impl Rule for Engulfing {
    fn min_candles(&self) -> usize {
        2
    }

    fn base_confidence(&self) -> f64 {
        92.9
    }

    fn detect(&self, window: &[Candle]) -> Result<Verdict, RuleFault> {
        let current = &window[window.len() - 1];
        let previous = &window[window.len() - 2];
        let color = current.color();

        let engulfs = color == previous.color()
            && match color {
                CandleColor::Green => current.open < previous.open && current.close > previous.close,
                CandleColor::Red => current.open > previous.open && current.close < previous.close,
            };

        if engulfs && current.body() > previous.body() {
            let direction = match color {
                CandleColor::Green => "bullish",
                CandleColor::Red => "bearish",
            };
            return Ok(Verdict::predict(
                color,
                self.base_confidence(),
                format!(
                    "{direction} engulfing confirmed: current candle engulfs the previous one and keeps the trend"
                ),
            ));
        }

        Ok(Verdict::abstain("engulfing pattern not identified"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::fixtures::*;
    use common::INSUFFICIENT_DATA;

    #[test]
    fn single_candle_is_insufficient() {
        let verdict = Engulfing.evaluate(&[strong_green(0)]).unwrap();
        assert!(verdict.is_abstention());
        assert_eq!(verdict.reasoning, INSUFFICIENT_DATA);
    }

    #[test]
    fn bullish_engulfing_predicts_green() {
        let window = vec![
            ohlc(0, 1.1002, 1.1006, 1.1001, 1.1004),
            ohlc(1, 1.1000, 1.1010, 1.0999, 1.1008),
        ];
        let verdict = Engulfing.evaluate(&window).unwrap();
        assert_eq!(verdict.prediction, Some(CandleColor::Green));
        assert_eq!(verdict.confidence, 92.9);
        assert!(verdict.reasoning.starts_with("bullish"));
    }

    #[test]
    fn bearish_engulfing_predicts_red() {
        let window = vec![
            ohlc(0, 1.1004, 1.1006, 1.1001, 1.1002),
            ohlc(1, 1.1008, 1.1010, 1.0999, 1.1000),
        ];
        let verdict = Engulfing.evaluate(&window).unwrap();
        assert_eq!(verdict.prediction, Some(CandleColor::Red));
        assert!(verdict.reasoning.starts_with("bearish"));
    }

    #[test]
    fn color_change_is_not_engulfing() {
        let window = vec![
            ohlc(0, 1.1004, 1.1006, 1.1001, 1.1002),
            ohlc(1, 1.1000, 1.1010, 1.0999, 1.1008),
        ];
        let verdict = Engulfing.evaluate(&window).unwrap();
        assert!(verdict.is_abstention());
        assert_eq!(verdict.reasoning, "engulfing pattern not identified");
    }

    #[test]
    fn inside_candle_is_not_engulfing() {
        let window = vec![
            ohlc(0, 1.1000, 1.1010, 1.0999, 1.1008),
            ohlc(1, 1.1002, 1.1006, 1.1001, 1.1004),
        ];
        assert!(Engulfing.evaluate(&window).unwrap().is_abstention());
    }
}
