use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeZone, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use common::{Candle, Error, QuoteProvider, Result};

const BASE_URL: &str = "https://alpha-vantage.p.rapidapi.com";
const RAPIDAPI_HOST: &str = "alpha-vantage.p.rapidapi.com";
const SERIES_KEY: &str = "Time Series FX (1min)";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `(from, to)` currency codes for a supported pair.
pub fn pair_symbols(pair: &str) -> Option<(&'static str, &'static str)> {
    let symbols = match pair {
        "EUR/USD" => ("EUR", "USD"),
        "GBP/USD" => ("GBP", "USD"),
        "USD/CHF" => ("USD", "CHF"),
        "USD/JPY" => ("USD", "JPY"),
        "AUD/USD" => ("AUD", "USD"),
        "USD/CAD" => ("USD", "CAD"),
        "NZD/USD" => ("NZD", "USD"),
        "EUR/GBP" => ("EUR", "GBP"),
        _ => return None,
    };
    Some(symbols)
}

/// Alpha Vantage FX intraday client, reached through RapidAPI.
pub struct AlphaVantageClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl AlphaVantageClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
            http,
        })
    }

    /// Point the client at another host, e.g. a local stub.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl QuoteProvider for AlphaVantageClient {
    async fn latest_candle(&self, pair: &str) -> Result<Candle> {
        let (from, to) =
            pair_symbols(pair).ok_or_else(|| Error::UnsupportedPair(pair.to_string()))?;

        let url = format!("{}/query", self.base_url);
        debug!(pair = %pair, "Fetching FX intraday series");
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("function", "FX_INTRADAY"),
                ("from_symbol", from),
                ("to_symbol", to),
                ("interval", "1min"),
                ("outputsize", "compact"),
                ("datatype", "json"),
            ])
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", RAPIDAPI_HOST)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited(format!("HTTP {status}")));
        }
        if !status.is_success() {
            return Err(Error::Provider(format!("HTTP {status}: {body}")));
        }

        let json: Value = serde_json::from_str(&body)?;
        parse_intraday(pair, &json)
    }
}

// ─── Response parsing ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct Bar {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
}

/// Extract the most recent bar from an `FX_INTRADAY` response body.
pub fn parse_intraday(pair: &str, body: &Value) -> Result<Candle> {
    for key in ["Note", "Information", "Error Message"] {
        if let Some(msg) = body.get(key).and_then(Value::as_str) {
            return Err(provider_message(msg));
        }
    }

    let series = body
        .get(SERIES_KEY)
        .ok_or_else(|| Error::Provider(format!("response has no '{SERIES_KEY}'")))?;
    let series: BTreeMap<String, Bar> = serde_json::from_value(series.clone())?;

    // Keys are zero-padded, so the greatest key is the latest bar
    let (stamp, bar) = series
        .iter()
        .next_back()
        .ok_or_else(|| Error::Provider(format!("empty series for {pair}")))?;

    let naive = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT)
        .map_err(|e| Error::Provider(format!("bad timestamp '{stamp}': {e}")))?;

    Ok(Candle::new(
        pair,
        Utc.from_utc_datetime(&naive),
        parse_price(&bar.open)?,
        parse_price(&bar.high)?,
        parse_price(&bar.low)?,
        parse_price(&bar.close)?,
    ))
}

fn parse_price(raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|e| Error::Provider(format!("bad price '{raw}': {e}")))
}

fn provider_message(msg: &str) -> Error {
    let lower = msg.to_lowercase();
    if lower.contains("call frequency") || lower.contains("rate limit") {
        Error::RateLimited(msg.to_string())
    } else {
        Error::Provider(msg.to_string())
    }
}
