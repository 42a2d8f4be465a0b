pub mod config;
pub mod error;
pub mod quotes;
pub mod store;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use quotes::QuoteProvider;
pub use store::{AnalysisStore, CandleStore};
pub use types::*;
