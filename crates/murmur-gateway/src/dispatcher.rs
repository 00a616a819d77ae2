use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tracing::debug;
use uuid::Uuid;

use murmur_types::events::ServerEvent;

use crate::presence::PresenceTracker;

/// Identifies one live gateway connection. A user may hold several.
pub type ConnId = Uuid;

/// A registered connection: who it is, where its events go, which rooms it is in.
struct ConnectionEntry {
    user_id: Uuid,
    tx: mpsc::UnboundedSender<ServerEvent>,
    rooms: HashSet<Uuid>,
}

#[derive(Default)]
struct DispatcherState {
    connections: HashMap<ConnId, ConnectionEntry>,

    /// Room membership: channel_id -> connections joined to it
    rooms: HashMap<Uuid, HashSet<ConnId>>,

    presence: PresenceTracker,
}

/// Owns room membership and presence, and fans events out to connections.
///
/// Every mutation and every room broadcast happens under one lock, so
/// presence updates reach members in the order the changes were made.
#[derive(Clone, Default)]
pub struct Dispatcher {
    inner: Arc<Mutex<DispatcherState>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection for `user_id`. Returns (conn_id, receiver).
    pub async fn register(&self, user_id: Uuid) -> (ConnId, mpsc::UnboundedReceiver<ServerEvent>) {
        let conn_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.lock().await.connections.insert(
            conn_id,
            ConnectionEntry {
                user_id,
                tx,
                rooms: HashSet::new(),
            },
        );
        (conn_id, rx)
    }

    /// Put a connection in a channel's room and broadcast the participant list.
    /// Joining a room twice does not count the user twice.
    /// Returns the participants, or `None` for an unknown connection.
    pub async fn join(&self, conn_id: ConnId, channel_id: Uuid) -> Option<Vec<Uuid>> {
        let mut state = self.inner.lock().await;
        let entry = state.connections.get_mut(&conn_id)?;
        let user_id = entry.user_id;
        let newly_joined = entry.rooms.insert(channel_id);

        if newly_joined {
            state.rooms.entry(channel_id).or_default().insert(conn_id);
            state.presence.join(channel_id, user_id);
        }

        Some(state.publish_presence(channel_id))
    }

    /// Take a connection out of a channel's room and broadcast the participant
    /// list to whoever remains. Returns `None` if it was not in the room.
    pub async fn leave(&self, conn_id: ConnId, channel_id: Uuid) -> Option<Vec<Uuid>> {
        let mut state = self.inner.lock().await;
        let entry = state.connections.get_mut(&conn_id)?;
        if !entry.rooms.remove(&channel_id) {
            return None;
        }
        let user_id = entry.user_id;
        state.remove_from_room(conn_id, user_id, channel_id);
        Some(state.publish_presence(channel_id))
    }

    /// Tell every other connection in the room that this user is (not) typing.
    pub async fn typing(&self, conn_id: ConnId, channel_id: Uuid, is_typing: bool) {
        let state = self.inner.lock().await;
        let Some(entry) = state.connections.get(&conn_id) else {
            return;
        };
        let event = ServerEvent::TypingUpdate {
            user_id: entry.user_id,
            is_typing,
        };
        state.send_to_room(channel_id, Some(conn_id), &event);
    }

    /// Send an event to every connection in a channel's room.
    /// Returns how many connections it was queued for.
    pub async fn broadcast_to_room(&self, channel_id: Uuid, event: ServerEvent) -> usize {
        self.inner.lock().await.send_to_room(channel_id, None, &event)
    }

    /// Send an event to one connection only.
    pub async fn send_to(&self, conn_id: ConnId, event: ServerEvent) {
        let state = self.inner.lock().await;
        if let Some(entry) = state.connections.get(&conn_id) {
            let _ = entry.tx.send(event);
        }
    }

    /// Forget a connection: leave every room it occupies and broadcast the
    /// new participant lists. Safe to call more than once; only the first
    /// call has any effect. Returns the rooms that were left.
    pub async fn disconnect(&self, conn_id: ConnId) -> Vec<Uuid> {
        let mut state = self.inner.lock().await;
        let Some(entry) = state.connections.remove(&conn_id) else {
            return vec![];
        };

        let mut rooms: Vec<Uuid> = entry.rooms.into_iter().collect();
        rooms.sort();
        for &channel_id in &rooms {
            state.remove_from_room(conn_id, entry.user_id, channel_id);
            state.publish_presence(channel_id);
        }

        debug!("Connection {} cleaned up from {} rooms", conn_id, rooms.len());
        rooms
    }

    pub async fn members_of(&self, channel_id: Uuid) -> Vec<Uuid> {
        self.inner.lock().await.presence.members_of(channel_id)
    }

    /// Rooms a connection currently occupies.
    #[cfg(test)]
    pub(crate) async fn rooms_of(&self, conn_id: ConnId) -> Vec<Uuid> {
        let state = self.inner.lock().await;
        let mut rooms: Vec<Uuid> = state
            .connections
            .get(&conn_id)
            .map(|e| e.rooms.iter().copied().collect())
            .unwrap_or_default();
        rooms.sort();
        rooms
    }
}

impl DispatcherState {
    fn remove_from_room(&mut self, conn_id: ConnId, user_id: Uuid, channel_id: Uuid) {
        if let Some(members) = self.rooms.get_mut(&channel_id) {
            members.remove(&conn_id);
            if members.is_empty() {
                self.rooms.remove(&channel_id);
            }
        }
        self.presence.leave(channel_id, user_id);
    }

    fn publish_presence(&self, channel_id: Uuid) -> Vec<Uuid> {
        let participants = self.presence.members_of(channel_id);
        let event = ServerEvent::PresenceUpdate {
            channel_id,
            participants: participants.clone(),
        };
        self.send_to_room(channel_id, None, &event);
        participants
    }

    fn send_to_room(&self, channel_id: Uuid, except: Option<ConnId>, event: &ServerEvent) -> usize {
        let Some(members) = self.rooms.get(&channel_id) else {
            return 0;
        };

        let mut sent = 0;
        for conn_id in members {
            if Some(*conn_id) == except {
                continue;
            }
            if let Some(entry) = self.connections.get(conn_id) {
                // A closed receiver means the connection is shutting down;
                // its own cleanup will remove it from the room.
                if entry.tx.send(event.clone()).is_ok() {
                    sent += 1;
                }
            }
        }
        sent
    }
}
