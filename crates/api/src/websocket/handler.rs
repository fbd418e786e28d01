//! WebSocket handler for Axum
//!
//! Upgrades HTTP connections, wires each socket to the registry, and routes
//! inbound subscribe/unsubscribe frames.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{stream::StreamExt, SinkExt};
use tokio::sync::mpsc;

use crate::state::AppState;

use super::{
    connection::{Connection, Outbound},
    events::ClientEvent,
    registry::WebSocketState,
};

/// WebSocket handler - upgrades HTTP connection to WebSocket
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state.ws_state.clone()))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, ws_state: WebSocketState) {
    let (mut sender, mut receiver) = socket.split();

    // Single-writer outbound queue for this connection; the registry only
    // ever pushes frames here, the task below is the sole socket writer.
    let (tx, mut rx) = mpsc::unbounded_channel::<Outbound>();

    let conn = ws_state.add_connection(Connection::new(tx)).await;
    let session_id = conn.session_id;

    let send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            match frame {
                Outbound::Event(event) => match serde_json::to_string(&event) {
                    Ok(json) => {
                        if sender.send(Message::Text(json)).await.is_err() {
                            break; // Connection closed
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = ?e, "Failed to serialize WebSocket event");
                    }
                },
                Outbound::Close => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    });

    // Inbound loop: only subscribe/unsubscribe are meaningful; everything
    // else is tolerated and dropped.
    while let Some(msg) = receiver.next().await {
        if let Ok(msg) = msg {
            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(ClientEvent::Subscribe { channel }) => {
                        ws_state.subscribe(&session_id, &channel).await;
                    }
                    Ok(ClientEvent::Unsubscribe { channel }) => {
                        ws_state.unsubscribe(&session_id, &channel).await;
                    }
                    Ok(ClientEvent::Unknown) => {
                        tracing::debug!(session_id = %session_id, "Ignoring unknown client event type");
                    }
                    Err(e) => {
                        tracing::debug!(
                            session_id = %session_id,
                            error = ?e,
                            "Ignoring malformed client frame"
                        );
                    }
                },
                Message::Close(_) => {
                    tracing::info!(session_id = %session_id, "WebSocket close frame received");
                    break;
                }
                Message::Ping(_) | Message::Pong(_) => {
                    // Axum handles ping/pong automatically
                }
                _ => {} // Ignore binary messages
            }
        }
    }

    // Cleanup on disconnect
    tracing::info!(session_id = %session_id, "WebSocket connection closing");
    ws_state.remove_connection(&session_id).await;

    send_task.abort();
}
