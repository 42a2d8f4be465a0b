use chrono::Timelike;

use common::{Candle, Verdict};

use crate::{Rule, RuleFault};

/// A strong candle opening a 15-minute quadrant (minute 0, 15, 30 or 45).
pub struct FirstCandleOfQuadrant;

impl Rule for FirstCandleOfQuadrant {
    fn min_candles(&self) -> usize {
        1
    }

    fn base_confidence(&self) -> f64 {
        75.0
    }

    fn detect(&self, window: &[Candle]) -> Result<Verdict, RuleFault> {
        let current = &window[window.len() - 1];
        let minute = current.timestamp.minute();

        if minute % 15 == 0 && current.is_strong() {
            let color = current.color();
            return Ok(Verdict::predict(
                color,
                self.base_confidence(),
                format!(
                    "first candle of the quadrant ({minute}min) is strong, entering with its color ({color})"
                ),
            ));
        }

        Ok(Verdict::abstain(
            "not the first candle of a quadrant or candle is not strong",
        ))
    }
}
