use tracing::warn;

/// Pairs the quote provider can serve.
pub const SUPPORTED_PAIRS: [&str; 8] = [
    "EUR/USD", "GBP/USD", "USD/CHF", "USD/JPY", "AUD/USD", "USD/CAD", "NZD/USD", "EUR/GBP",
];

/// All configuration loaded from environment variables at startup.
/// Missing required variables cause an immediate panic with a clear message.
#[derive(Debug, Clone)]
pub struct Config {
    // Quote provider
    pub alpha_vantage_api_key: Option<String>,
    pub pairs: Vec<String>,
    pub poll_interval_secs: u64,
    /// Length of one candle. The reveal timestamp is entry + this.
    pub bar_interval_secs: u64,

    // HTTP API
    pub api_port: u16,

    // Database
    pub database_url: String,

    // Optional TOML file selecting the strategy panel
    pub strategy_config_path: Option<String>,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present. Panics on any missing required variable.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let alpha_vantage_api_key = optional_env("ALPHA_VANTAGE_API_KEY");
        if alpha_vantage_api_key.is_none() {
            warn!("ALPHA_VANTAGE_API_KEY not set; quote ingestion disabled");
        }

        let pairs = optional_env("PAIRS")
            .map(|v| parse_pairs(&v))
            .unwrap_or_else(|| SUPPORTED_PAIRS.iter().map(|p| p.to_string()).collect());

        Config {
            alpha_vantage_api_key,
            pairs,
            poll_interval_secs: optional_env("POLL_INTERVAL_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            bar_interval_secs: optional_env("BAR_INTERVAL_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            api_port: optional_env("API_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            database_url: required_env("DATABASE_URL"),
            strategy_config_path: optional_env("STRATEGY_CONFIG_PATH"),
        }
    }
}

/// Split a comma-separated pair list, dropping blanks.
pub fn parse_pairs(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn required_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        panic!("Required environment variable '{key}' is not set. Check your .env file.")
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_list_is_trimmed_and_uppercased() {
        assert_eq!(
            parse_pairs(" eur/usd, GBP/USD ,,"),
            vec!["EUR/USD".to_string(), "GBP/USD".to_string()]
        );
    }
}
