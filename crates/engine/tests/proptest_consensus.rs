use chrono::{Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;

use common::{Candle, CandleColor, ConsensusOutcome};
use engine::{build_consensus, evaluate_panel, CandleWindow, VoteTally, MAX_WINDOW};
use strategy::StrategyRegistry;

fn arb_color() -> impl Strategy<Value = CandleColor> {
    prop_oneof![Just(CandleColor::Green), Just(CandleColor::Red)]
}

fn arb_window() -> impl Strategy<Value = Vec<Candle>> {
    prop::collection::vec((1.0f64..2.0, 1.0f64..2.0, 0.0f64..0.01, 0.0f64..0.01), 1..30).prop_map(
        |raw| {
            let start = Utc.with_ymd_and_hms(2024, 1, 3, 10, 0, 0).unwrap();
            raw.iter()
                .enumerate()
                .map(|(i, &(open, close, up, down))| {
                    Candle::new(
                        "EUR/USD",
                        start + Duration::minutes(i as i64),
                        open,
                        open.max(close) + up,
                        open.min(close) - down,
                        close,
                    )
                })
                .collect()
        },
    )
}

proptest! {
    /// Counts add up, and the majority and confidence follow the votes.
    #[test]
    fn tally_is_consistent(votes in prop::collection::vec(arb_color(), 0..12)) {
        let tally = VoteTally::from_votes(votes.iter().copied());
        let green = votes.iter().filter(|c| **c == CandleColor::Green).count() as u32;
        let red = votes.len() as u32 - green;

        prop_assert_eq!(tally.green, green);
        prop_assert_eq!(tally.red, red);
        prop_assert_eq!(tally.total(), votes.len() as u32);

        let confidence = tally.confidence();
        if votes.is_empty() {
            prop_assert_eq!(tally.outcome(), ConsensusOutcome::NoVotes);
            prop_assert_eq!(confidence, 0);
        } else {
            prop_assert!((50..=100).contains(&confidence));
            match tally.outcome() {
                ConsensusOutcome::Decided(CandleColor::Green) => prop_assert!(green > red),
                ConsensusOutcome::Decided(CandleColor::Red) => prop_assert!(red > green),
                ConsensusOutcome::Tied => prop_assert_eq!(green, red),
                ConsensusOutcome::NoVotes => prop_assert!(false, "votes were cast"),
            }
        }
    }

    /// Windows stay bounded, ordered and end at the target.
    #[test]
    fn window_is_bounded_and_ordered(candles in arb_window()) {
        let target = candles[candles.len() - 1].clone();
        let mut history = candles.clone();
        history.reverse();

        let window = CandleWindow::build(&target, history);
        prop_assert!(window.len() <= MAX_WINDOW);
        prop_assert_eq!(window.len(), candles.len().min(MAX_WINDOW));
        prop_assert_eq!(&window.target().id, &target.id);
        prop_assert!(window.candles().windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    /// Every strategy reports, and the consensus counts exactly the predicting
    /// verdicts.
    #[test]
    fn consensus_counts_predicting_verdicts(candles in arb_window(), hour in 0u32..24) {
        let registry = StrategyRegistry::full_catalog();
        let target = candles[candles.len() - 1].clone();
        let window = CandleWindow::build(&target, candles);
        let at = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap().and_hms_opt(hour, 0, 0).unwrap();

        let verdicts = evaluate_panel(&registry, &window, at);
        prop_assert_eq!(verdicts.len(), registry.len());

        let tally = VoteTally::from_votes(verdicts.iter().filter_map(|v| v.prediction));
        let record = build_consensus(&target, tally, Duration::seconds(60));
        let predicting = verdicts.iter().filter(|v| v.prediction.is_some()).count() as u32;
        prop_assert_eq!(record.total_strategies, predicting);
        prop_assert_eq!(record.green_votes + record.red_votes, predicting);
        prop_assert!(verdicts.iter().all(|v| v.fault.is_none()));
        prop_assert!(verdicts.iter().all(|v| v.confidence <= 100.0));
    }
}
