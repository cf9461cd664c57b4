//! WebSocket handler for live tournament views.
//!
//! A connection subscribes to one tournament through the sync coordinator.
//! Each change (pushed by the backend or found by polling) is sent as a full
//! [`TournamentView`] JSON document; the first one arrives right after
//! connecting.
//!
//! # Client Messages
//!
//! - `{"type":"refresh"}` - resend the current view
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:8080/ws/tournament_1700000000000_ab12cd');
//! ws.onmessage = (event) => render(JSON.parse(event.data));
//! ```

use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{IntoResponse, Response},
};
use football_tournament::tournament::TournamentView;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::{AppState, api_error};
use crate::metrics;

/// Views waiting to be written before new ones are dropped
const OUTBOUND_BUFFER: usize = 16;

/// Client messages received via WebSocket
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    /// Send the current view again
    Refresh,
}

/// Error messages sent to the client; views are sent bare
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerResponse {
    Error { message: String },
}

/// Upgrade to a WebSocket streaming views of `tournament_id`.
///
/// Answers `404 Not Found` instead of upgrading when the tournament does not exist.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(tournament_id): Path<String>,
    State(state): State<AppState>,
) -> Response {
    if let Err(e) = state.manager.load(&tournament_id).await {
        return api_error("websocket", Some(&tournament_id), e).into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, tournament_id, state))
}

fn encode(view: &TournamentView) -> Option<String> {
    match serde_json::to_string(view) {
        Ok(json) => Some(json),
        Err(e) => {
            error!("Failed to serialize view of {}: {}", view.id, e);
            None
        }
    }
}

async fn handle_socket(socket: WebSocket, tournament_id: String, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    metrics::websocket_connected();
    info!("WebSocket connected: tournament={}", tournament_id);

    // The subscription callback runs on the coordinator's task; never block it
    let (subscription_tx, mut view_rx) = mpsc::channel::<String>(OUTBOUND_BUFFER);
    let subscription_id = tournament_id.clone();
    let handle = state
        .manager
        .subscribe(&tournament_id, move |view| {
            if let Some(json) = encode(&view) {
                if subscription_tx.try_send(json).is_err() {
                    warn!(
                        "Dropping view update for slow WebSocket client on {}",
                        subscription_id
                    );
                }
            }
        })
        .await;
    debug!(
        "WebSocket on {} subscribed in {:?} mode",
        handle.tournament_id(),
        handle.mode()
    );

    loop {
        tokio::select! {
            Some(json) = view_rx.recv() => {
                if sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
                metrics::websocket_messages_sent();
            }
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        metrics::websocket_messages_received();
                        let reply = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Refresh) => {
                                match state.manager.view(&tournament_id).await {
                                    Ok(view) => encode(&view),
                                    Err(e) => serde_json::to_string(&ServerResponse::Error {
                                        message: e.client_message(),
                                    })
                                    .ok(),
                                }
                            }
                            Err(e) => {
                                warn!("Failed to parse client message: {}", e);
                                serde_json::to_string(&ServerResponse::Error {
                                    message: "Invalid message format".to_string(),
                                })
                                .ok()
                            }
                        };
                        if let Some(json) = reply {
                            if sender.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                            metrics::websocket_messages_sent();
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        error!("WebSocket error on {}: {}", tournament_id, e);
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.manager.unsubscribe(&handle);
    metrics::websocket_disconnected();
    info!("WebSocket disconnected: tournament={}", tournament_id);
}
