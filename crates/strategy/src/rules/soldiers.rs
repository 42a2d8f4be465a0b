use common::{Candle, CandleColor, Verdict};

use crate::rules::tail;
use crate::{Rule, RuleFault};

/// Three consecutive strong green candles.
pub struct ThreeWhiteSoldiers;

impl Rule for ThreeWhiteSoldiers {
    fn min_candles(&self) -> usize {
        3
    }

    fn base_confidence(&self) -> f64 {
        92.0
    }

    fn detect(&self, window: &[Candle]) -> Result<Verdict, RuleFault> {
        let last3 = tail(window, 3);
        let all_green = last3.iter().all(|c| c.color() == CandleColor::Green);
        let all_strong = last3.iter().all(Candle::is_strong);

        if all_green && all_strong {
            return Ok(Verdict::predict(
                CandleColor::Green,
                self.base_confidence(),
                "three white soldiers: three consecutive strong green candles signal a bullish reversal",
            ));
        }

        Ok(Verdict::abstain("three white soldiers pattern not identified"))
    }
}
