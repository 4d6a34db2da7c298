//! WebSocket endpoint and health document.
//!
//! Every connection is a subscriber on the publish channel and a sender on
//! the control channel at the same time. The handler forwards payloads from
//! the registry to the socket and parses inbound text into control commands;
//! each connection runs in its own task with a bounded payload queue, so a
//! stalled peer is dropped instead of backing up the loop.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tracing::{debug, info};

use crate::protocol::ControlCommand;
use crate::state::SharedState;

/// Builds the router with the tracking stream and health endpoints.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .with_state(state)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_client(socket, state))
}

async fn handle_client(mut socket: WebSocket, state: SharedState) {
    let (id, mut rx) = state.registry.register();
    info!(subscriber = %id, "websocket client connected");

    loop {
        tokio::select! {
            payload = rx.recv() => {
                match payload {
                    Some(json) => {
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    // Registry dropped our channel: the server is closing
                    // or we fell too far behind.
                    None => break,
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        let command = ControlCommand::parse(&text);
                        debug!(subscriber = %id, ?command, "control message received");
                        state.apply_command(command);
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // binary and ping frames are ignored
                    Some(Err(_)) => break,
                }
            }
        }
    }

    state.registry.unregister(id);
    info!(subscriber = %id, "websocket client disconnected");
}

async fn health(State(state): State<SharedState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "source": state.source,
        "detector": state.detector,
        "subscribers": state.registry.count(),
        "ticks": state.ticks(),
        "uptime_seconds": state.uptime_seconds(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
