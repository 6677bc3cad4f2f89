//! Chat WebSocket handler.
//!
//! Each socket becomes one [`ChatSession`]. Inbound text frames are handled
//! in arrival order on the socket task; outbound events flow through the
//! session's queue to a dedicated writer task so a slow peer never stalls
//! a broadcast.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use uuid::Uuid;

use crate::chat::{outbox, ChatHub, ChatSession};
use crate::web::handlers::AppState;

/// WebSocket chat handler.
///
/// GET /ws
pub async fn chat_ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    let hub = Arc::clone(&state.hub);
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

/// Drive a WebSocket connection until it closes.
pub async fn handle_socket(socket: WebSocket, hub: Arc<ChatHub>) {
    let connection_id = Uuid::new_v4().to_string();
    tracing::debug!(connection_id = %connection_id, "WebSocket session started");

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = outbox();

    let writer_id = connection_id.clone();
    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let frame = match event.to_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!(connection_id = %writer_id, error = %e, "Failed to encode event");
                    continue;
                }
            };
            if ws_sender.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
        let _ = ws_sender.close().await;
    });

    let mut session = ChatSession::open(hub, connection_id.clone(), tx).await;

    // Pings are answered by the protocol layer.
    while let Some(msg_result) = ws_receiver.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                // Failures are logged and reported by the session.
                let _ = session.handle_frame(&text).await;
            }
            Ok(Message::Close(_)) => {
                tracing::debug!(connection_id = %connection_id, "WebSocket closed by client");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Closing drops the registry's queue handle, which ends the writer.
    session.close().await;
    let _ = writer.await;
    tracing::debug!(connection_id = %connection_id, "WebSocket session ended");
}
