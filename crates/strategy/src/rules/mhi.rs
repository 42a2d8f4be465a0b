use common::{Candle, CandleColor, Verdict};

use crate::rules::{count_colors, tail};
use crate::{Rule, RuleFault};

/// Majority-handicap inversion: fade the majority color of the last three
/// candles.
pub struct Mhi;

impl Rule for Mhi {
    fn min_candles(&self) -> usize {
        3
    }

    fn base_confidence(&self) -> f64 {
        85.0
    }

    fn detect(&self, window: &[Candle]) -> Result<Verdict, RuleFault> {
        let (green, red) = count_colors(tail(window, 3));

        if green >= 2 {
            return Ok(Verdict::predict(
                CandleColor::Red,
                self.base_confidence(),
                format!("MHI: {green} green in the last 3 candles, entering the opposite color (red)"),
            ));
        }
        if red >= 2 {
            return Ok(Verdict::predict(
                CandleColor::Green,
                self.base_confidence(),
                format!("MHI: {red} red in the last 3 candles, entering the opposite color (green)"),
            ));
        }

        // Unreachable with three candles.
        Ok(Verdict::abstain("MHI pattern not identified (balanced candles)"))
    }
}
