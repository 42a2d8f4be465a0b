use std::collections::HashSet;
use std::sync::Arc;

use tracing::info;

use common::{Error, Result, StrategyConfigRecord};

use crate::config::{StrategyConfig, StrategyFileConfig};
use crate::rules::RuleKind;
use crate::Rule;

/// Static descriptor of one strategy: display metadata, time-of-day
/// affinity and the rule itself.
#[derive(Clone)]
pub struct StrategyDefinition {
    pub id: String,
    pub kind: RuleKind,
    pub name: String,
    pub description: String,
    /// Historical win-rate in percent. Display and weighting metadata only.
    pub win_rate: f64,
    /// 0–23
    pub best_hour: u32,
    /// 0–6, 0 = Sunday
    pub best_weekday: u32,
    pub rule: Arc<dyn Rule>,
}

impl std::fmt::Debug for StrategyDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyDefinition")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("win_rate", &self.win_rate)
            .field("best_hour", &self.best_hour)
            .field("best_weekday", &self.best_weekday)
            .finish()
    }
}

impl StrategyDefinition {
    /// Built-in metadata for a rule.
    pub fn builtin(kind: RuleKind) -> Self {
        let (id, name, description, win_rate, best_hour, best_weekday) = match kind {
            RuleKind::Engulfing => (
                "1",
                "Single-Color Engulfing",
                "Large candle engulfing the previous one while keeping its color",
                92.9,
                8,
                6,
            ),
            RuleKind::ThreeWhiteSoldiers => (
                "2",
                "Three White Soldiers",
                "Three consecutive strong green candles",
                92.0,
                14,
                3,
            ),
            RuleKind::StrongCandle => (
                "3",
                "Strong Candle",
                "Candle with a large body and short wicks",
                90.9,
                13,
                5,
            ),
            RuleKind::ThreeValleysPeaks => (
                "4",
                "Three Valleys/Peaks",
                "Three ascending lows or three descending highs",
                85.7,
                12,
                3,
            ),
            RuleKind::Mhi => (
                "5",
                "MHI",
                "Enter the opposite color when 2+ of the last 3 candles share a color",
                85.0,
                10,
                1,
            ),
            RuleKind::DojiReversal => (
                "6",
                "Doji Reversal",
                "Enter against the candle that follows a doji",
                84.2,
                9,
                2,
            ),
            RuleKind::Minority => (
                "7",
                "Minority",
                "Side with the minority color of the last 3 candles",
                80.0,
                11,
                4,
            ),
            RuleKind::FirstCandleOfQuadrant => (
                "8",
                "First Candle of Quadrant",
                "Strong candle opening a 15-minute quadrant",
                75.0,
                15,
                1,
            ),
            RuleKind::ColorAlternation => (
                "9",
                "Color Alternation",
                "Continue a green/red alternation",
                72.2,
                16,
                2,
            ),
            RuleKind::OddSequence => (
                "10",
                "Odd Sequence",
                "Fade a run of three same-colored candles",
                71.4,
                17,
                4,
            ),
        };

        Self {
            id: id.to_string(),
            kind,
            name: name.to_string(),
            description: description.to_string(),
            win_rate,
            best_hour,
            best_weekday,
            rule: kind.rule(),
        }
    }

    /// Row mirrored into the strategy config table.
    pub fn config_record(&self) -> StrategyConfigRecord {
        StrategyConfigRecord {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            enabled: true,
            weight: self.win_rate / 100.0,
            historical_winrate: self.win_rate,
        }
    }
}

/// The fixed, ordered panel of active strategies.
///
/// Built once at startup and shared by reference. Order is the evaluation
/// order and never changes after construction.
#[derive(Debug, Clone)]
pub struct StrategyRegistry {
    strategies: Vec<StrategyDefinition>,
}

impl StrategyRegistry {
    /// Build a registry, rejecting duplicate names and out-of-range metadata.
    pub fn new(strategies: Vec<StrategyDefinition>) -> Result<Self> {
        let mut names = HashSet::new();
        for def in &strategies {
            validate(def)?;
            if !names.insert(def.name.as_str()) {
                return Err(Error::Config(format!(
                    "duplicate strategy name '{}'",
                    def.name
                )));
            }
        }
        Ok(Self { strategies })
    }

    /// The curated five-strategy panel.
    pub fn default_panel() -> Self {
        Self {
            strategies: RuleKind::DEFAULT_PANEL
                .iter()
                .map(|&k| StrategyDefinition::builtin(k))
                .collect(),
        }
    }

    /// All ten built-in strategies.
    pub fn full_catalog() -> Self {
        Self {
            strategies: RuleKind::ALL
                .iter()
                .map(|&k| StrategyDefinition::builtin(k))
                .collect(),
        }
    }

    /// Build the registry from a TOML panel file.
    pub fn from_config(file_cfg: &StrategyFileConfig) -> Result<Self> {
        if file_cfg.strategies.is_empty() {
            return Err(Error::Config("strategy panel is empty".to_string()));
        }

        let strategies: Vec<StrategyDefinition> =
            file_cfg.strategies.iter().map(build_strategy).collect();
        let registry = Self::new(strategies)?;

        for def in registry.iter() {
            info!(name = %def.name, kind = %def.kind, "Registered strategy");
        }
        Ok(registry)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StrategyDefinition> {
        self.strategies.iter()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn config_records(&self) -> Vec<StrategyConfigRecord> {
        self.strategies.iter().map(|d| d.config_record()).collect()
    }
}

// ─── Strategy builders ────────────────────────────────────────────────────────

fn build_strategy(cfg: &StrategyConfig) -> StrategyDefinition {
    let mut def = StrategyDefinition::builtin(cfg.kind);
    if let Some(name) = &cfg.name {
        def.name = name.clone();
    }
    if let Some(description) = &cfg.description {
        def.description = description.clone();
    }
    if let Some(win_rate) = cfg.win_rate {
        def.win_rate = win_rate;
    }
    if let Some(hour) = cfg.best_hour {
        def.best_hour = hour;
    }
    if let Some(weekday) = cfg.best_weekday {
        def.best_weekday = weekday;
    }
    def
}

fn validate(def: &StrategyDefinition) -> Result<()> {
    if def.name.trim().is_empty() {
        return Err(Error::Config(format!("strategy {} has an empty name", def.id)));
    }
    if def.best_hour > 23 {
        return Err(Error::Config(format!(
            "strategy '{}': best_hour {} outside 0-23",
            def.name, def.best_hour
        )));
    }
    if def.best_weekday > 6 {
        return Err(Error::Config(format!(
            "strategy '{}': best_weekday {} outside 0-6",
            def.name, def.best_weekday
        )));
    }
    if !(0.0..=100.0).contains(&def.win_rate) {
        return Err(Error::Config(format!(
            "strategy '{}': win_rate {} outside 0-100",
            def.name, def.win_rate
        )));
    }
    Ok(())
}
