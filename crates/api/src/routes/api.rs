use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use common::Error;
use engine::StrategyVerdict;

use crate::AppState;

const DEFAULT_CONSENSUS_LIMIT: usize = 20;
const MAX_CONSENSUS_LIMIT: usize = 200;

type ApiResponse = (StatusCode, Json<Value>);

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/api/analyze", post(post_analyze))
        .route("/api/init-strategies", post(post_init_strategies))
        .route("/api/strategies", get(get_strategies))
        .route("/api/consensus", get(get_consensus))
        .route("/api/predictions", get(get_predictions))
}

fn error_response(err: Error) -> ApiResponse {
    let (status, body) = match &err {
        Error::CandleNotFound(_) => (StatusCode::NOT_FOUND, json!({ "error": "candle not found" })),
        Error::InsufficientHistory { pair } => (
            StatusCode::BAD_REQUEST,
            json!({
                "error": format!("not enough candle history for {pair}"),
                "hint": "wait for more candles to be collected",
            }),
        ),
        _ => {
            error!(error = %err, "Request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": err.to_string() }),
            )
        }
    };
    (status, Json(body))
}

fn bad_request(msg: &str) -> ApiResponse {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": msg })))
}

// ─── Analyze ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest {
    candle_id: Option<String>,
    pair: Option<String>,
}

async fn post_analyze(State(state): State<AppState>, Json(req): Json<AnalyzeRequest>) -> ApiResponse {
    let (Some(candle_id), Some(pair)) = (
        req.candle_id.filter(|s| !s.is_empty()),
        req.pair.filter(|s| !s.is_empty()),
    ) else {
        return bad_request("candleId and pair are required");
    };

    let report = match state.analyzer.analyze(&candle_id, &pair).await {
        Ok(report) => report,
        Err(e) => return error_response(e),
    };

    // Only predictions that made it into the consensus tally
    let predictions: Vec<&StrategyVerdict> = report.verdicts.iter().filter(|v| v.stored).collect();
    let c = &report.consensus;

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "predictions": predictions,
            "stored": report.stored_predictions,
            "consensus": {
                "total": c.total_strategies,
                "green": c.green_votes,
                "red": c.red_votes,
                "prediction": c.consensus_prediction(),
                "confidence": c.consensus_confidence,
            },
        })),
    )
}

// ─── Strategies ───────────────────────────────────────────────────────────────

async fn post_init_strategies(State(state): State<AppState>) -> ApiResponse {
    let records = state.analyzer.registry().config_records();
    match state.results.upsert_strategy_configs(&records).await {
        Ok(count) => {
            info!(count, "Strategy configs initialized");
            (
                StatusCode::OK,
                Json(json!({ "success": true, "count": count, "strategies": records })),
            )
        }
        Err(e) => error_response(e),
    }
}

async fn get_strategies(State(state): State<AppState>) -> Json<Value> {
    let strategies: Vec<Value> = state
        .analyzer
        .registry()
        .iter()
        .map(|def| {
            json!({
                "id": def.id,
                "kind": def.kind,
                "name": def.name,
                "description": def.description,
                "win_rate": def.win_rate,
                "best_hour": def.best_hour,
                "best_weekday": def.best_weekday,
                "min_candles": def.rule.min_candles(),
            })
        })
        .collect();
    Json(json!({ "strategies": strategies }))
}

// ─── Results ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ConsensusQuery {
    pair: Option<String>,
    limit: Option<usize>,
}

async fn get_consensus(State(state): State<AppState>, Query(q): Query<ConsensusQuery>) -> ApiResponse {
    let Some(pair) = q.pair.filter(|p| !p.is_empty()) else {
        return bad_request("pair is required");
    };
    let limit = q
        .limit
        .unwrap_or(DEFAULT_CONSENSUS_LIMIT)
        .min(MAX_CONSENSUS_LIMIT);

    match state.results.recent_consensus(&pair, limit).await {
        Ok(rows) => (
            StatusCode::OK,
            Json(json!({ "pair": pair, "consensus": rows })),
        ),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
struct PredictionsQuery {
    candle_id: Option<String>,
}

async fn get_predictions(
    State(state): State<AppState>,
    Query(q): Query<PredictionsQuery>,
) -> ApiResponse {
    let Some(candle_id) = q.candle_id.filter(|id| !id.is_empty()) else {
        return bad_request("candle_id is required");
    };

    match state.results.predictions_for(&candle_id).await {
        Ok(rows) => (
            StatusCode::OK,
            Json(json!({ "candle_id": candle_id, "predictions": rows })),
        ),
        Err(e) => error_response(e),
    }
}
