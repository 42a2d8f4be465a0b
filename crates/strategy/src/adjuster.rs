//! Time-of-day / day-of-week confidence bonus.
//!
//! A strategy earns up to 5 points when evaluated at its best hour and up
//! to 3 points on its best weekday, decaying by 0.5 per unit of distance.
//! The bonus only ever raises confidence and never touches the predicted
//! color.

use chrono::{Datelike, NaiveDateTime, Timelike};

use common::Verdict;

use crate::StrategyDefinition;

pub const MAX_HOUR_BONUS: f64 = 5.0;
pub const MAX_DAY_BONUS: f64 = 3.0;
const DECAY_PER_UNIT: f64 = 0.5;
pub const MAX_CONFIDENCE: f64 = 100.0;

/// Bonus for evaluating at `hour` (0–23) on `weekday` (0–6, Sunday first).
///
/// Distances are plain absolute differences: 23h and 0h are 23 apart.
pub fn time_bonus(best_hour: u32, best_weekday: u32, hour: u32, weekday: u32) -> f64 {
    let hour_diff = best_hour.abs_diff(hour);
    let day_diff = best_weekday.abs_diff(weekday);

    let hour_bonus = if hour_diff == 0 {
        MAX_HOUR_BONUS
    } else {
        (MAX_HOUR_BONUS - hour_diff as f64 * DECAY_PER_UNIT).max(0.0)
    };
    let day_bonus = if day_diff == 0 {
        MAX_DAY_BONUS
    } else {
        (MAX_DAY_BONUS - day_diff as f64 * DECAY_PER_UNIT).max(0.0)
    };

    hour_bonus + day_bonus
}

/// `base` plus the definition's time bonus at `at`, capped at 100.
pub fn adjust_confidence(base: f64, definition: &StrategyDefinition, at: NaiveDateTime) -> f64 {
    let bonus = time_bonus(
        definition.best_hour,
        definition.best_weekday,
        at.hour(),
        at.weekday().num_days_from_sunday(),
    );
    (base + bonus).min(MAX_CONFIDENCE)
}

/// Apply the bonus to a predicting verdict. Abstentions pass through.
pub fn adjust_verdict(verdict: Verdict, definition: &StrategyDefinition, at: NaiveDateTime) -> Verdict {
    if verdict.is_abstention() {
        return verdict;
    }
    Verdict {
        confidence: adjust_confidence(verdict.confidence, definition, at),
        ..verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RuleKind;
    use chrono::NaiveDate;
    use common::CandleColor;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        // 2024-01-07 is a Sunday
        NaiveDate::from_ymd_opt(2024, 1, 7 + day)
            .unwrap()
            .and_hms_opt(hour, 30, 0)
            .unwrap()
    }

    #[test]
    fn exact_match_gives_full_bonus() {
        assert_eq!(time_bonus(8, 6, 8, 6), 8.0);
    }

    #[test]
    fn bonus_decays_with_distance() {
        // 3h away: 5 - 1.5; 2 days away: 3 - 1
        assert_eq!(time_bonus(14, 3, 11, 5), 3.5 + 2.0);
    }

    #[test]
    fn far_hours_earn_nothing() {
        assert_eq!(time_bonus(0, 0, 23, 6), 0.0);
    }

    #[test]
    fn strong_candle_on_friday_afternoon() {
        let def = StrategyDefinition::builtin(RuleKind::StrongCandle);
        // Friday 13:30, best slot for this strategy
        let conf = adjust_confidence(90.9, &def, at(5, 13));
        assert!((conf - 98.9).abs() < 1e-9);
    }

    #[test]
    fn confidence_is_capped() {
        let def = StrategyDefinition::builtin(RuleKind::Engulfing);
        assert_eq!(adjust_confidence(95.0, &def, at(6, 8)), 100.0);
    }

    #[test]
    fn abstention_is_untouched() {
        let def = StrategyDefinition::builtin(RuleKind::Mhi);
        let verdict = Verdict::abstain("MHI pattern not identified (balanced candles)");
        assert_eq!(adjust_verdict(verdict.clone(), &def, at(1, 10)), verdict);
    }

    #[test]
    fn color_is_preserved() {
        let def = StrategyDefinition::builtin(RuleKind::Mhi);
        let verdict = Verdict::predict(CandleColor::Red, 85.0, "MHI");
        let adjusted = adjust_verdict(verdict, &def, at(1, 10));
        assert_eq!(adjusted.prediction, Some(CandleColor::Red));
        assert_eq!(adjusted.confidence, 93.0);
    }
}
