use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use common::{AnalysisStore, Config, QuoteProvider};
use engine::{AlphaVantageClient, Analyzer, Ingestor};
use store::SqliteStore;
use strategy::{StrategyFileConfig, StrategyRegistry};

#[tokio::main]
async fn main() {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    info!(pairs = ?cfg.pairs, "Colorcast starting");

    // ── Database ──────────────────────────────────────────────────────────────
    let options = SqliteConnectOptions::from_str(&cfg.database_url)
        .unwrap_or_else(|e| panic!("Invalid DATABASE_URL: {e}"))
        .create_if_missing(true);
    let db = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .unwrap_or_else(|e| panic!("Failed to connect to database: {e}"));
    let store = Arc::new(SqliteStore::new(db));
    store
        .migrate()
        .await
        .unwrap_or_else(|e| panic!("Database migration failed: {e}"));
    info!("Database ready");

    // ── Strategy registry ─────────────────────────────────────────────────────
    let registry = match &cfg.strategy_config_path {
        Some(path) => {
            let file_cfg = StrategyFileConfig::load(path)
                .unwrap_or_else(|e| panic!("Failed to load strategy file {path}: {e}"));
            StrategyRegistry::from_config(&file_cfg)
                .unwrap_or_else(|e| panic!("Invalid strategy panel in {path}: {e}"))
        }
        None => {
            info!("No STRATEGY_CONFIG_PATH set, using the default panel");
            StrategyRegistry::default_panel()
        }
    };
    let registry = Arc::new(registry);

    match store.upsert_strategy_configs(&registry.config_records()).await {
        Ok(count) => info!(count, "Strategy configs mirrored"),
        Err(e) => error!(error = %e, "Failed to mirror strategy configs"),
    }

    // ── Analyzer ──────────────────────────────────────────────────────────────
    let bar_interval = chrono::Duration::seconds(cfg.bar_interval_secs as i64);
    let analyzer = Arc::new(Analyzer::new(
        registry.clone(),
        store.clone(),
        store.clone(),
        bar_interval,
    ));

    // ── Quote ingestion (only with an API key) ────────────────────────────────
    if let Some(key) = &cfg.alpha_vantage_api_key {
        let client = AlphaVantageClient::new(key.as_str())
            .unwrap_or_else(|e| panic!("Failed to build quote client: {e}"));
        let provider: Arc<dyn QuoteProvider> = Arc::new(client);
        let ingestor = Ingestor::new(
            cfg.pairs.clone(),
            provider,
            store.clone(),
            analyzer.clone(),
            Duration::from_secs(cfg.poll_interval_secs),
        );
        tokio::spawn(ingestor.run());
    }

    // ── HTTP API ──────────────────────────────────────────────────────────────
    let api_state = api::AppState {
        analyzer: analyzer.clone(),
        results: store.clone(),
    };
    let port = cfg.api_port;
    tokio::spawn(async move {
        if let Err(e) = api::serve(api_state, port).await {
            error!(error = %e, "API server stopped");
        }
    });

    info!(strategies = registry.len(), "All subsystems started. Waiting for shutdown signal.");
    tokio::signal::ctrl_c().await.unwrap();
    info!("Shutdown signal received. Exiting.");
}
