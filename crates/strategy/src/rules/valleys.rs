use common::{Candle, CandleColor, Verdict};

use crate::rules::tail;
use crate::{Rule, RuleFault};

/// Three ascending valleys or three descending peaks over the last six
/// candles, taken as three consecutive pairs.
///
/// The valley check runs first. When a window satisfies both, the green
/// call wins; that precedence is arbitrary and kept for reproducibility.
pub struct ThreeValleysPeaks;

impl Rule for ThreeValleysPeaks {
    fn min_candles(&self) -> usize {
        6
    }

    fn base_confidence(&self) -> f64 {
        85.7
    }

    fn detect(&self, window: &[Candle]) -> Result<Verdict, RuleFault> {
        let recent = tail(window, 6);

        let valleys: Vec<f64> = recent
            .chunks(2)
            .map(|pair| pair.iter().map(|c| c.low).fold(f64::INFINITY, f64::min))
            .collect();
        if valleys[0] < valleys[1] && valleys[1] < valleys[2] {
            return Ok(Verdict::predict(
                CandleColor::Green,
                self.base_confidence(),
                "three ascending valleys: reversal from down to up",
            ));
        }

        let peaks: Vec<f64> = recent
            .chunks(2)
            .map(|pair| pair.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max))
            .collect();
        if peaks[0] > peaks[1] && peaks[1] > peaks[2] {
            return Ok(Verdict::predict(
                CandleColor::Red,
                self.base_confidence(),
                "three descending peaks: reversal from up to down",
            ));
        }

        Ok(Verdict::abstain("three valleys/peaks pattern not identified"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::fixtures::*;
    use common::INSUFFICIENT_DATA;

    /// Candle whose low is `low`, with a fixed 0.0010 range above it.
    fn with_low(m: i64, low: f64) -> Candle {
        ohlc(m, low + 0.0002, low + 0.0010, low, low + 0.0008)
    }

    fn with_high(m: i64, high: f64) -> Candle {
        ohlc(m, high - 0.0008, high, high - 0.0010, high - 0.0002)
    }

    #[test]
    fn five_candles_are_insufficient() {
        let window: Vec<Candle> = (0..5).map(strong_green).collect();
        let verdict = ThreeValleysPeaks.evaluate(&window).unwrap();
        assert_eq!(verdict.reasoning, INSUFFICIENT_DATA);
    }

    #[test]
    fn ascending_valleys_predict_green() {
        let lows = [1.1000, 1.1000, 1.1010, 1.1005, 1.1020, 1.1015];
        let window: Vec<Candle> = lows
            .iter()
            .enumerate()
            .map(|(i, &low)| with_low(i as i64, low))
            .collect();
        let verdict = ThreeValleysPeaks.evaluate(&window).unwrap();
        assert_eq!(verdict.prediction, Some(CandleColor::Green));
        assert_eq!(verdict.confidence, 85.7);
    }

    #[test]
    fn descending_peaks_predict_red() {
        let highs = [1.1030, 1.1025, 1.1020, 1.1018, 1.1010, 1.1012];
        let window: Vec<Candle> = highs
            .iter()
            .enumerate()
            .map(|(i, &high)| with_high(i as i64, high))
            .collect();
        let verdict = ThreeValleysPeaks.evaluate(&window).unwrap();
        assert_eq!(verdict.prediction, Some(CandleColor::Red));
    }

    #[test]
    fn flat_series_abstains() {
        let window: Vec<Candle> = (0..6).map(weak_green).collect();
        let verdict = ThreeValleysPeaks.evaluate(&window).unwrap();
        assert!(verdict.is_abstention());
        assert_eq!(verdict.reasoning, "three valleys/peaks pattern not identified");
    }

    #[test]
    fn only_last_six_candles_count() {
        // Older candles would break the ascent if they were considered.
        let mut window = vec![with_low(0, 1.2000), with_low(1, 1.0000)];
        let lows = [1.1000, 1.1000, 1.1010, 1.1005, 1.1020, 1.1015];
        window.extend(
            lows.iter()
                .enumerate()
                .map(|(i, &low)| with_low(i as i64 + 2, low)),
        );
        let verdict = ThreeValleysPeaks.evaluate(&window).unwrap();
        assert_eq!(verdict.prediction, Some(CandleColor::Green));
    }
}
