use serde::{Deserialize, Serialize};

use common::{Error, Result};

use crate::rules::RuleKind;

/// Top-level strategy panel file (TOML).
///
/// Example `config/strategies.toml`:
/// ```toml
/// [[strategy]]
/// kind = "engulfing"
///
/// [[strategy]]
/// kind = "doji_reversal"
/// name = "Post-Doji Reversal"
/// best_hour = 9
/// best_weekday = 2
/// ```
///
/// Entries are evaluated in file order.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategyFileConfig {
    #[serde(rename = "strategy")]
    pub strategies: Vec<StrategyConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategyConfig {
    /// Which built-in rule to run.
    pub kind: RuleKind,
    /// Overrides the built-in display name. Must be unique in the panel.
    pub name: Option<String>,
    pub description: Option<String>,
    /// Historical win-rate in percent (metadata only).
    pub win_rate: Option<f64>,
    pub best_hour: Option<u32>,
    /// 0 = Sunday
    pub best_weekday: Option<u32>,
}

impl StrategyFileConfig {
    /// Load from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
            .map_err(|e| Error::Config(format!("strategy config at '{path}': {e}")))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }
}
