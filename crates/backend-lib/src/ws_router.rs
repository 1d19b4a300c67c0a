// ============================
// crates/backend-lib/src/ws_router.rs
// ============================
//! WebSocket router and connection handling.
//!
//! One task per connection forwards hub events out to the socket; the
//! read loop decodes inbound frames into [`ClientEvent`]s and hands
//! them to the hub. All state lives behind the hub handle.
use crate::api;
use crate::hub::ChatHandle;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use chatroom_common::ClientEvent;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

/// Create the router: the WebSocket endpoint plus the read-only
/// snapshot API.
pub fn create_router(handle: ChatHandle) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/api/users", get(api::list_users))
        .route("/api/rooms", get(api::list_rooms))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::cors::CorsLayer::permissive())
        .with_state(handle)
}

/// Handler for WebSocket connections
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(handle): State<ChatHandle>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, handle))
}

async fn handle_connection(socket: WebSocket, handle: ChatHandle) {
    // the transport assigns the connection id, stable for its lifetime
    let conn_id = Uuid::new_v4().to_string();
    let (mut sink, mut stream) = socket.split();

    let (tx, mut rx) = mpsc::channel(handle.send_buffer());
    if handle.connect(conn_id.clone(), tx).is_err() {
        return;
    }

    // Forward hub events to the socket until either side goes away.
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    debug!("failed to serialize outbound event: {err}");
                    continue;
                },
            };
            if sink.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // Read loop: decode inbound frames and hand them to the hub.
    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => {
                    if handle.client_event(&conn_id, event).is_err() {
                        break;
                    }
                },
                Err(err) => {
                    // undecodable frames are dropped, not answered
                    debug!(conn_id, "ignoring malformed frame: {err}");
                },
            },
            Message::Close(_) => break,
            _ => {},
        }
    }

    // transport-level disconnect: the hub removes the session everywhere
    let _ = handle.disconnect(&conn_id);
    send_task.abort();
}
