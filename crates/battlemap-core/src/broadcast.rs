//! Broadcasting the map to viewers.
//!
//! The relay protocol is shared with the relay server: JSON text frames
//! tagged with `type`.

use crate::codec::BroadcastPayload;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;
use tungstenite::{Message, connect};
use url::Url;

/// Broadcast errors.
#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Receiver disconnected")]
    Disconnected,
}

/// Role of a relay client within a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The game master publishing the map.
    Presenter,
    /// A read-only player screen.
    Viewer,
}

/// Messages sent to the relay server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Join a room
    Join { room: String, role: Role },
    /// Leave current room
    Leave,
    /// Publish the map (presenters only)
    Broadcast(BroadcastPayload),
}

/// Messages received from the relay server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirm room join, with the latest map if one was published
    Joined {
        room: String,
        role: Role,
        viewer_count: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        latest: Option<BroadcastPayload>,
    },
    /// Map published by the presenter
    Canvas(BroadcastPayload),
    ViewerJoined { viewer_count: usize },
    ViewerLeft { viewer_count: usize },
    /// Error message
    Error { message: String },
}

/// Destination of broadcast payloads.
pub trait BroadcastSink {
    fn send(&self, payload: &BroadcastPayload) -> Result<(), BroadcastError>;
}

/// In-process sink feeding a viewer over a channel.
pub struct ChannelSink {
    tx: Sender<BroadcastPayload>,
}

impl ChannelSink {
    /// Create a sink and the receiving end for the viewer.
    pub fn new() -> (Self, Receiver<BroadcastPayload>) {
        let (tx, rx) = channel();
        (Self { tx }, rx)
    }
}

impl BroadcastSink for ChannelSink {
    fn send(&self, payload: &BroadcastPayload) -> Result<(), BroadcastError> {
        self.tx.send(payload.clone()).map_err(|_| BroadcastError::Disconnected)
    }
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Events from the relay connection
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Connected,
    Disconnected,
    JoinedRoom { room: String, viewer_count: usize },
    ViewerCount(usize),
    Error { message: String },
}

/// Commands sent to the WebSocket thread.
enum WsCommand {
    Send(String),
    Close,
}

/// Sink publishing to a relay room as presenter.
///
/// Uses a background thread driving a blocking socket; events are polled.
pub struct WebSocketSink {
    state: ConnectionState,
    cmd_tx: Option<Sender<WsCommand>>,
    event_rx: Option<Receiver<SinkEvent>>,
    _thread: Option<JoinHandle<()>>,
}

impl WebSocketSink {
    /// Connect to `url` and join `room` as presenter.
    pub fn connect(url: &str, room: &str) -> Result<Self, BroadcastError> {
        let parsed_url = Url::parse(url).map_err(|e| BroadcastError::InvalidUrl(e.to_string()))?;
        if parsed_url.scheme() != "ws" && parsed_url.scheme() != "wss" {
            return Err(BroadcastError::InvalidUrl(format!(
                "unsupported scheme: {}",
                parsed_url.scheme()
            )));
        }

        let join = serde_json::to_string(&ClientMessage::Join {
            room: room.to_string(),
            role: Role::Presenter,
        })?;
        let (cmd_tx, cmd_rx) = channel::<WsCommand>();
        let (event_tx, event_rx) = channel::<SinkEvent>();
        let url = url.to_string();

        let handle = thread::spawn(move || run_socket(url, join, cmd_rx, event_tx));

        Ok(Self {
            state: ConnectionState::Connecting,
            cmd_tx: Some(cmd_tx),
            event_rx: Some(event_rx),
            _thread: Some(handle),
        })
    }

    /// Poll for pending events (non-blocking).
    pub fn poll_events(&mut self) -> Vec<SinkEvent> {
        let Some(rx) = &self.event_rx else {
            return Vec::new();
        };
        let events: Vec<SinkEvent> = rx.try_iter().collect();
        for event in &events {
            match event {
                SinkEvent::Connected => self.state = ConnectionState::Connected,
                SinkEvent::Disconnected => self.state = ConnectionState::Disconnected,
                SinkEvent::Error { .. } => self.state = ConnectionState::Error,
                _ => {}
            }
        }
        events
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Leave the room and close the socket.
    pub fn disconnect(&mut self) {
        if let Some(tx) = self.cmd_tx.take() {
            if let Ok(leave) = serde_json::to_string(&ClientMessage::Leave) {
                let _ = tx.send(WsCommand::Send(leave));
            }
            let _ = tx.send(WsCommand::Close);
        }
        self.event_rx = None;
        // The thread exits on its own once it sees the close command.
        self._thread = None;
        self.state = ConnectionState::Disconnected;
    }
}

impl BroadcastSink for WebSocketSink {
    fn send(&self, payload: &BroadcastPayload) -> Result<(), BroadcastError> {
        let text = serde_json::to_string(&ClientMessage::Broadcast(payload.clone()))?;
        let tx = self.cmd_tx.as_ref().ok_or(BroadcastError::Disconnected)?;
        tx.send(WsCommand::Send(text)).map_err(|_| BroadcastError::Disconnected)
    }
}

impl Drop for WebSocketSink {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn run_socket(url: String, join: String, cmd_rx: Receiver<WsCommand>, event_tx: Sender<SinkEvent>) {
    log::info!("Broadcast thread: connecting to {}", url);
    let (mut socket, response) = match connect(&url) {
        Ok(pair) => pair,
        Err(e) => {
            log::error!("Broadcast connection failed: {}", e);
            let _ = event_tx.send(SinkEvent::Error {
                message: format!("Connection failed: {}", e),
            });
            return;
        }
    };
    log::info!("Broadcast connected, status: {}", response.status());
    let _ = event_tx.send(SinkEvent::Connected);

    // Short read timeout so outgoing commands are not starved.
    match socket.get_mut() {
        tungstenite::stream::MaybeTlsStream::Plain(tcp) => {
            let _ = tcp.set_read_timeout(Some(Duration::from_millis(50)));
            let _ = tcp.set_write_timeout(Some(Duration::from_secs(5)));
        }
        #[allow(unreachable_patterns)]
        _ => log::debug!("TLS or other stream - using default timeout handling"),
    }

    if let Err(e) = socket.send(Message::Text(join)) {
        log::error!("Broadcast join failed: {}", e);
        let _ = event_tx.send(SinkEvent::Disconnected);
        return;
    }

    loop {
        match cmd_rx.try_recv() {
            Ok(WsCommand::Send(msg)) => {
                log::debug!("Broadcast sending {} bytes", msg.len());
                if let Err(e) = socket.send(Message::Text(msg)) {
                    log::error!("Broadcast send error: {}", e);
                    break;
                }
            }
            Ok(WsCommand::Close) => {
                log::info!("Broadcast close requested");
                let _ = socket.close(None);
                break;
            }
            Err(TryRecvError::Disconnected) => break,
            Err(TryRecvError::Empty) => {}
        }

        match socket.read() {
            Ok(Message::Text(txt)) => match serde_json::from_str::<ServerMessage>(&txt) {
                Ok(msg) => {
                    if let Some(event) = event_for(msg) {
                        let _ = event_tx.send(event);
                    }
                }
                Err(e) => log::warn!("Failed to parse relay message: {}", e),
            },
            Ok(Message::Ping(data)) => {
                let _ = socket.send(Message::Pong(data));
            }
            Ok(Message::Close(_)) => {
                log::info!("Relay closed the connection");
                break;
            }
            Ok(_) => {}
            Err(tungstenite::Error::Io(ref e))
                if e.kind() == std::io::ErrorKind::WouldBlock || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                continue;
            }
            Err(e) => {
                log::error!("Broadcast read error: {}", e);
                break;
            }
        }
    }

    log::info!("Broadcast thread exiting");
    let _ = event_tx.send(SinkEvent::Disconnected);
}

fn event_for(msg: ServerMessage) -> Option<SinkEvent> {
    match msg {
        ServerMessage::Joined { room, viewer_count, .. } => Some(SinkEvent::JoinedRoom { room, viewer_count }),
        ServerMessage::ViewerJoined { viewer_count } | ServerMessage::ViewerLeft { viewer_count } => {
            Some(SinkEvent::ViewerCount(viewer_count))
        }
        ServerMessage::Error { message } => Some(SinkEvent::Error { message }),
        // Presenters do not receive their own map back.
        ServerMessage::Canvas(_) => None,
    }
}
