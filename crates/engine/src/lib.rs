pub mod alpha_vantage;
pub mod analyzer;
pub mod consensus;
pub mod ingest;
pub mod window;

pub use alpha_vantage::AlphaVantageClient;
pub use analyzer::{evaluate_panel, AnalysisReport, Analyzer, StrategyVerdict};
pub use consensus::{build_consensus, VoteTally};
pub use ingest::Ingestor;
pub use window::{CandleWindow, MAX_WINDOW};
