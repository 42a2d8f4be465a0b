use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use common::ConsensusAnalysis;

use crate::AppState;

pub fn ws_router() -> Router<AppState> {
    Router::new().route("/ws/consensus", get(ws_consensus_handler))
}

/// WebSocket endpoint that pushes every new consensus record as JSON.
async fn ws_consensus_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let consensus_rx = state.analyzer.subscribe();
    ws.on_upgrade(move |socket| handle_ws(socket, consensus_rx))
}

async fn handle_ws(mut socket: WebSocket, mut consensus_rx: broadcast::Receiver<ConsensusAnalysis>) {
    debug!("Consensus feed client connected");
    loop {
        match consensus_rx.recv().await {
            Ok(record) => {
                let text = match serde_json::to_string(&record) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(error = %e, "Failed to encode consensus record");
                        continue;
                    }
                };
                if socket.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            Err(RecvError::Lagged(n)) => {
                warn!(dropped = n, "Consensus feed client lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
    debug!("Consensus feed client disconnected");
}
