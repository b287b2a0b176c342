//! Battle-map WebSocket relay
//!
//! Forwards the game master's map to read-only player screens in the same
//! room.
//!
//! ## Protocol
//!
//! Messages are JSON text frames tagged with `type`:
//! ```json
//! { "type": "join", "room": "table-1", "role": "presenter" }
//! { "type": "broadcast", "canvasState": { "tokens": [], "drawings": [], "assets": [], "weather": "rain", "view": { "panX": 0, "panY": 0, "scale": 1 } } }
//! { "type": "leave" }
//! ```
//! The relay answers with `joined` (carrying the latest map, if any),
//! `canvas`, `viewer_joined`, `viewer_left` and `error`.

pub mod config;
pub mod rooms;

pub use config::{ConfigError, ServerConfig};
pub use rooms::{RelayError, Rooms};

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use battlemap_core::broadcast::{ClientMessage, Role, ServerMessage};
use futures_util::{SinkExt, StreamExt};
use rooms::RoomEvent;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Shared application state
#[derive(Default)]
pub struct AppState {
    pub rooms: Rooms,
}

/// Router with a fresh state.
pub fn app() -> Router {
    router(Arc::new(AppState::default()))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Index page
async fn index() -> &'static str {
    "Battle-map relay server - connect via WebSocket at /ws"
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

/// WebSocket upgrade handler
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

fn encode(msg: &ServerMessage) -> Option<Message> {
    match serde_json::to_string(msg) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            warn!("Failed to encode server message: {}", e);
            None
        }
    }
}

fn error_message(message: impl Into<String>) -> ServerMessage {
    ServerMessage::Error {
        message: message.into(),
    }
}

/// Membership of one connection.
struct Session {
    peer_id: String,
    room: Option<String>,
    rx: Option<broadcast::Receiver<RoomEvent>>,
}

impl Session {
    /// Leave the current room, telling the others when a viewer goes.
    fn leave(&mut self, state: &AppState) {
        self.rx = None;
        let Some(room) = self.room.take() else {
            return;
        };
        if let Some((role, viewer_count)) = state.rooms.leave(&room, &self.peer_id) {
            if role == Role::Viewer {
                state
                    .rooms
                    .broadcast(&room, &self.peer_id, ServerMessage::ViewerLeft { viewer_count });
            }
            info!("Peer {} ({:?}) left room {}", self.peer_id, role, room);
        }
    }

    /// Apply one client message; returns the direct reply, if any.
    fn handle(&mut self, state: &AppState, msg: ClientMessage) -> Option<ServerMessage> {
        match msg {
            ClientMessage::Join { room, role } => {
                self.leave(state);
                let joined = state.rooms.join(&room, &self.peer_id, role);
                self.rx = Some(joined.rx);
                self.room = Some(room.clone());
                if role == Role::Viewer {
                    state.rooms.broadcast(
                        &room,
                        &self.peer_id,
                        ServerMessage::ViewerJoined {
                            viewer_count: joined.viewer_count,
                        },
                    );
                }
                info!("Peer {} joined room {} as {:?}", self.peer_id, room, role);
                Some(ServerMessage::Joined {
                    room,
                    role,
                    viewer_count: joined.viewer_count,
                    latest: joined.latest,
                })
            }
            ClientMessage::Leave => {
                self.leave(state);
                None
            }
            ClientMessage::Broadcast(payload) => {
                let Some(room) = &self.room else {
                    return Some(error_message(RelayError::NotInRoom.to_string()));
                };
                match state.rooms.publish(room, &self.peer_id, payload) {
                    Ok(()) => {
                        debug!("Peer {} published to room {}", self.peer_id, room);
                        None
                    }
                    Err(e) => {
                        warn!("Rejected broadcast from {}: {}", self.peer_id, e);
                        Some(error_message(e.to_string()))
                    }
                }
            }
        }
    }
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let mut session = Session {
        peer_id: Uuid::new_v4().to_string(),
        room: None,
        rx: None,
    };
    info!("New connection: {}", session.peer_id);

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            msg = receiver.next() => {
                let reply = match msg {
                    Some(Ok(Message::Text(text))) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(client_msg) => session.handle(&state, client_msg),
                        Err(e) => {
                            warn!("Invalid message from {}: {}", session.peer_id, e);
                            Some(error_message(format!("Invalid message: {}", e)))
                        }
                    },
                    Some(Ok(Message::Binary(_))) => Some(error_message("Binary frames are not supported")),
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => None, // Ignore ping/pong
                    Some(Err(e)) => {
                        warn!("WebSocket error for {}: {}", session.peer_id, e);
                        break;
                    }
                };
                if let Some(frame) = reply.as_ref().and_then(encode) {
                    if sender.send(frame).await.is_err() {
                        break;
                    }
                }
            }

            event = async {
                match &mut session.rx {
                    Some(rx) => Some(rx.recv().await),
                    None => std::future::pending::<Option<Result<RoomEvent, RecvError>>>().await,
                }
            } => {
                let (from, server_msg) = match event {
                    Some(Ok(event)) => event,
                    Some(Err(RecvError::Lagged(skipped))) => {
                        warn!("Peer {} lagged behind by {} messages", session.peer_id, skipped);
                        continue;
                    }
                    Some(Err(RecvError::Closed)) | None => {
                        session.rx = None;
                        continue;
                    }
                };
                // Don't echo back to sender
                if from == session.peer_id {
                    continue;
                }
                if let Some(frame) = encode(&server_msg) {
                    if sender.send(frame).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    session.leave(&state);
    info!("Connection closed: {}", session.peer_id);
}
