//! The ten candle-pattern rules.
//!
//! Each rule maps an oldest-first window to a [`common::Verdict`]. Rules
//! that need more history than the window holds abstain with
//! "insufficient data".

mod alternation;
mod doji;
mod engulfing;
mod mhi;
mod minority;
mod odd_sequence;
mod quadrant;
mod soldiers;
mod strong;
mod valleys;

pub use alternation::ColorAlternation;
pub use doji::DojiReversal;
pub use engulfing::Engulfing;
pub use mhi::Mhi;
pub use minority::Minority;
pub use odd_sequence::OddSequence;
pub use quadrant::FirstCandleOfQuadrant;
pub use soldiers::ThreeWhiteSoldiers;
pub use strong::StrongCandle;
pub use valleys::ThreeValleysPeaks;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use common::{Candle, CandleColor};

use crate::Rule;

/// Identifies one of the built-in rules. Used as the `kind` key in the
/// strategy TOML file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Engulfing,
    ThreeWhiteSoldiers,
    StrongCandle,
    ThreeValleysPeaks,
    Mhi,
    DojiReversal,
    Minority,
    FirstCandleOfQuadrant,
    ColorAlternation,
    OddSequence,
}

impl RuleKind {
    pub const ALL: [RuleKind; 10] = [
        RuleKind::Engulfing,
        RuleKind::ThreeWhiteSoldiers,
        RuleKind::StrongCandle,
        RuleKind::ThreeValleysPeaks,
        RuleKind::Mhi,
        RuleKind::DojiReversal,
        RuleKind::Minority,
        RuleKind::FirstCandleOfQuadrant,
        RuleKind::ColorAlternation,
        RuleKind::OddSequence,
    ];

    /// The curated default panel.
    pub const DEFAULT_PANEL: [RuleKind; 5] = [
        RuleKind::Engulfing,
        RuleKind::ThreeWhiteSoldiers,
        RuleKind::StrongCandle,
        RuleKind::ThreeValleysPeaks,
        RuleKind::Mhi,
    ];

    pub fn rule(self) -> Arc<dyn Rule> {
        match self {
            RuleKind::Engulfing => Arc::new(Engulfing),
            RuleKind::ThreeWhiteSoldiers => Arc::new(ThreeWhiteSoldiers),
            RuleKind::StrongCandle => Arc::new(StrongCandle),
            RuleKind::ThreeValleysPeaks => Arc::new(ThreeValleysPeaks),
            RuleKind::Mhi => Arc::new(Mhi),
            RuleKind::DojiReversal => Arc::new(DojiReversal),
            RuleKind::Minority => Arc::new(Minority),
            RuleKind::FirstCandleOfQuadrant => Arc::new(FirstCandleOfQuadrant),
            RuleKind::ColorAlternation => Arc::new(ColorAlternation),
            RuleKind::OddSequence => Arc::new(OddSequence),
        }
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let key = match self {
            RuleKind::Engulfing => "engulfing",
            RuleKind::ThreeWhiteSoldiers => "three_white_soldiers",
            RuleKind::StrongCandle => "strong_candle",
            RuleKind::ThreeValleysPeaks => "three_valleys_peaks",
            RuleKind::Mhi => "mhi",
            RuleKind::DojiReversal => "doji_reversal",
            RuleKind::Minority => "minority",
            RuleKind::FirstCandleOfQuadrant => "first_candle_of_quadrant",
            RuleKind::ColorAlternation => "color_alternation",
            RuleKind::OddSequence => "odd_sequence",
        };
        write!(f, "{key}")
    }
}

/// The last `n` candles of the window (all of them if shorter).
pub(crate) fn tail(window: &[Candle], n: usize) -> &[Candle] {
    &window[window.len().saturating_sub(n)..]
}

/// `(green, red)` counts.
pub(crate) fn count_colors(candles: &[Candle]) -> (usize, usize) {
    let green = candles
        .iter()
        .filter(|c| c.color() == CandleColor::Green)
        .count();
    (green, candles.len() - green)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use common::Candle;

    pub fn minute(m: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 3, 10, 0, 0).unwrap() + Duration::minutes(m)
    }

    /// Green candle with body 90% of range.
    pub fn strong_green(m: i64) -> Candle {
        Candle::new("EUR/USD", minute(m), 1.1000, 1.10095, 1.09995, 1.1009)
    }

    /// Red candle with body 90% of range.
    pub fn strong_red(m: i64) -> Candle {
        Candle::new("EUR/USD", minute(m), 1.1009, 1.10095, 1.09995, 1.1000)
    }

    /// Green candle with body 40% of range.
    pub fn weak_green(m: i64) -> Candle {
        Candle::new("EUR/USD", minute(m), 1.1003, 1.1010, 1.1000, 1.1007)
    }

    /// Red candle with body 40% of range.
    pub fn weak_red(m: i64) -> Candle {
        Candle::new("EUR/USD", minute(m), 1.1007, 1.1010, 1.1000, 1.1003)
    }

    /// Body 5% of range.
    pub fn doji(m: i64) -> Candle {
        Candle::new("EUR/USD", minute(m), 1.10050, 1.1010, 1.1000, 1.10055)
    }

    pub fn ohlc(m: i64, open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle::new("EUR/USD", minute(m), open, high, low, close)
    }
}
