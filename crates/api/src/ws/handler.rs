//! WebSocket upgrade handler for the edit-lock endpoint.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use uuid::Uuid;

use quire_core::lock::{EditLock, LockMessage};

use crate::state::AppState;

/// Upgrade an HTTP request to a WebSocket edit-lock session.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = Uuid::new_v4().to_string();
    let coordinator = state.lock_coordinator.clone();

    let mut rx = coordinator.register(conn_id.clone()).await;
    tracing::info!(conn_id, "Edit-lock connection established");

    let (mut sender, mut receiver) = socket.split();

    // Forward coordinator-pushed messages to the socket.
    let send_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if sender.send(message).await.is_err() {
                tracing::debug!(conn_id = send_conn_id, "Edit-lock send failed, closing");
                break;
            }
        }
    });

    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Close(_)) => {
                tracing::debug!(conn_id, "Edit-lock connection closed by client");
                break;
            }
            Ok(Message::Pong(_)) => {
                coordinator.touch(&conn_id).await;
            }
            Ok(Message::Text(text)) => {
                handle_text_message(&conn_id, &text, &state).await;
            }
            Ok(_) => {
                // Binary and Ping frames carry no protocol meaning; they
                // still count as liveness.
                coordinator.touch(&conn_id).await;
            }
            Err(e) => {
                tracing::debug!(conn_id, error = %e, "Edit-lock connection errored");
                break;
            }
        }
    }

    coordinator.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id, "Edit-lock connection removed");
}

async fn handle_text_message(conn_id: &str, text: &str, state: &AppState) {
    match serde_json::from_str::<LockMessage>(text) {
        Ok(LockMessage::ClaimPage {
            campaign_id,
            record_id,
            page_index,
        }) => {
            let lock = EditLock {
                campaign_id,
                record_id,
                page_index,
            };
            state.lock_coordinator.claim(conn_id, lock).await;
        }
        Ok(other) => {
            tracing::debug!(conn_id, message = ?other, "Ignoring server-to-client message type");
            state.lock_coordinator.touch(conn_id).await;
        }
        Err(e) => {
            tracing::debug!(conn_id, error = %e, "Ignoring unparseable edit-lock message");
            state.lock_coordinator.touch(conn_id).await;
        }
    }
}
