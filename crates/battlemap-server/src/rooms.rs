//! Room registry shared by all connections.

use battlemap_core::broadcast::{Role, ServerMessage};
use battlemap_core::codec::BroadcastPayload;
use dashmap::DashMap;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

/// Relay rule violations, reported back to the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("join a room before broadcasting")]
    NotInRoom,
    #[error("only presenters may broadcast")]
    NotPresenter,
}

/// A message on a room channel, tagged with the sending peer.
pub type RoomEvent = (String, ServerMessage);

/// What a joining client learns about the room.
pub struct Joined {
    pub rx: broadcast::Receiver<RoomEvent>,
    pub latest: Option<BroadcastPayload>,
    pub viewer_count: usize,
}

/// Room state
struct Room {
    tx: broadcast::Sender<RoomEvent>,
    members: HashMap<String, Role>,
    /// Last published map, replayed to late joiners.
    latest: Option<BroadcastPayload>,
}

impl Room {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            members: HashMap::new(),
            latest: None,
        }
    }

    fn viewer_count(&self) -> usize {
        self.members.values().filter(|r| **r == Role::Viewer).count()
    }
}

/// Active rooms keyed by name.
#[derive(Default)]
pub struct Rooms {
    rooms: DashMap<String, Room>,
}

impl Rooms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn viewer_count(&self, room_id: &str) -> usize {
        self.rooms.get(room_id).map(|r| r.viewer_count()).unwrap_or(0)
    }

    /// Add a peer to a room, creating it if needed.
    pub fn join(&self, room_id: &str, peer_id: &str, role: Role) -> Joined {
        let mut room = self.rooms.entry(room_id.to_string()).or_insert_with(Room::new);
        room.members.insert(peer_id.to_string(), role);
        Joined {
            rx: room.tx.subscribe(),
            latest: room.latest.clone(),
            viewer_count: room.viewer_count(),
        }
    }

    /// Remove a peer. Empty rooms are dropped.
    ///
    /// Returns the peer's role and the remaining viewer count.
    pub fn leave(&self, room_id: &str, peer_id: &str) -> Option<(Role, usize)> {
        let (role, viewers) = {
            let mut room = self.rooms.get_mut(room_id)?;
            let role = room.members.remove(peer_id)?;
            (role, room.viewer_count())
        };
        // Re-checked under the shard lock: a peer may have joined meanwhile.
        self.rooms.remove_if(room_id, |_, room| room.members.is_empty());
        Some((role, viewers))
    }

    /// Store a presenter's map as the room's latest state and relay it.
    pub fn publish(&self, room_id: &str, peer_id: &str, payload: BroadcastPayload) -> Result<(), RelayError> {
        let mut room = self.rooms.get_mut(room_id).ok_or(RelayError::NotInRoom)?;
        match room.members.get(peer_id) {
            None => return Err(RelayError::NotInRoom),
            Some(Role::Viewer) => return Err(RelayError::NotPresenter),
            Some(Role::Presenter) => {}
        }
        room.latest = Some(payload.clone());
        let _ = room.tx.send((peer_id.to_string(), ServerMessage::Canvas(payload)));
        Ok(())
    }

    /// Send a message to every member but `from`.
    pub fn broadcast(&self, room_id: &str, from: &str, msg: ServerMessage) {
        if let Some(room) = self.rooms.get(room_id) {
            let _ = room.tx.send((from.to_string(), msg));
        }
    }
}
