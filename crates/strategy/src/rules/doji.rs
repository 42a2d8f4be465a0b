use common::{Candle, Verdict};

use crate::{Rule, RuleFault};

/// A doji on the previous candle: expect the next candle to reverse the
/// current one.
pub struct DojiReversal;

impl Rule for DojiReversal {
    fn min_candles(&self) -> usize {
        2
    }

    fn base_confidence(&self) -> f64 {
        84.2
    }

    fn detect(&self, window: &[Candle]) -> Result<Verdict, RuleFault> {
        let previous = &window[window.len() - 2];
        let current = &window[window.len() - 1];

        if previous.is_doji() {
            let prediction = current.color().opposite();
            return Ok(Verdict::predict(
                prediction,
                self.base_confidence(),
                format!(
                    "doji on the previous candle, expecting a reversal against the current candle ({prediction})"
                ),
            ));
        }

        Ok(Verdict::abstain("doji not identified"))
    }
}
