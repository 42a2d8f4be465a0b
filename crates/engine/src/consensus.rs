use chrono::Duration;

use common::{Candle, CandleColor, ConsensusAnalysis, ConsensusOutcome};

/// Green and red vote counts for one candle. Abstentions are never counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoteTally {
    pub green: u32,
    pub red: u32,
}

impl VoteTally {
    pub fn from_votes(votes: impl IntoIterator<Item = CandleColor>) -> Self {
        let mut tally = Self::default();
        for vote in votes {
            tally.record(vote);
        }
        tally
    }

    pub fn record(&mut self, vote: CandleColor) {
        match vote {
            CandleColor::Green => self.green += 1,
            CandleColor::Red => self.red += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.green + self.red
    }

    pub fn outcome(&self) -> ConsensusOutcome {
        ConsensusOutcome::from_votes(self.green, self.red)
    }

    /// Share of the majority side in percent, rounded. 0 when nobody voted.
    pub fn confidence(&self) -> u32 {
        let total = self.total();
        if total == 0 {
            return 0;
        }
        let majority = self.green.max(self.red);
        (majority as f64 / total as f64 * 100.0).round() as u32
    }
}

/// Fold a tally into the per-candle consensus record.
///
/// The reveal timestamp is one bar after the candle's own timestamp. Outcome
/// fields are left empty.
pub fn build_consensus(candle: &Candle, tally: VoteTally, bar_interval: Duration) -> ConsensusAnalysis {
    ConsensusAnalysis {
        candle_id: candle.id.clone(),
        pair: candle.pair.clone(),
        entry_timestamp: candle.timestamp,
        reveal_timestamp: candle.timestamp + bar_interval,
        total_strategies: tally.total(),
        green_votes: tally.green,
        red_votes: tally.red,
        outcome: tally.outcome(),
        consensus_confidence: tally.confidence(),
        actual_color: None,
        result: None,
    }
}
