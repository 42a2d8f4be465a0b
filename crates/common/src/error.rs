use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Quote provider error: {0}")]
    Provider(String),

    #[error("Quote provider rate limit reached: {0}")]
    RateLimited(String),

    #[error("Unsupported currency pair: {0}")]
    UnsupportedPair(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Candle not found: {0}")]
    CandleNotFound(String),

    #[error("No candle history available for {pair}")]
    InsufficientHistory { pair: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
