use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use common::Candle;

/// Most candles a window may hold.
pub const MAX_WINDOW: usize = 20;

/// Oldest-first slice of one pair's history ending at the candle under
/// analysis. Timestamps are strictly increasing and the length is between 1
/// and [`MAX_WINDOW`].
#[derive(Debug, Clone, PartialEq)]
pub struct CandleWindow {
    candles: Vec<Candle>,
}

impl CandleWindow {
    /// Select the window for `target` from a pool of historical candles.
    ///
    /// Candles of other pairs or later than the target are ignored, and a
    /// pool entry sharing the target's timestamp is replaced by the target.
    /// The most recent [`MAX_WINDOW`] candles are kept.
    pub fn build(target: &Candle, history: impl IntoIterator<Item = Candle>) -> Self {
        let mut by_time: BTreeMap<DateTime<Utc>, Candle> = history
            .into_iter()
            .filter(|c| c.pair == target.pair && c.timestamp < target.timestamp)
            .map(|c| (c.timestamp, c))
            .collect();
        by_time.insert(target.timestamp, target.clone());

        let mut candles: Vec<Candle> = by_time.into_values().rev().take(MAX_WINDOW).collect();
        candles.reverse();

        Self { candles }
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    /// The candle under analysis.
    pub fn target(&self) -> &Candle {
        // build() always inserts the target
        &self.candles[self.candles.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }
}
