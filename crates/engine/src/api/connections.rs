//! Connection management for WebSocket clients.
//!
//! Tracks connected clients and the map rooms they have joined.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use dashmap::DashMap;
use farmstead_domain::UserId;
use farmstead_shared::ServerMessage;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// Information about a connected client.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    /// Unique ID for this connection
    pub connection_id: Uuid,
    /// Caller identified by the upgrade request
    pub user_id: UserId,
    /// Room joined after binding to a map
    pub room: Option<String>,
}

/// Manages all active WebSocket connections.
pub struct ConnectionManager {
    /// Map of connection_id -> (ConnectionInfo, sender channel)
    connections: RwLock<HashMap<Uuid, (ConnectionInfo, mpsc::Sender<ServerMessage>)>>,
    /// room -> member connection ids
    rooms: DashMap<String, HashSet<Uuid>>,
}

pub type SharedConnectionManager = Arc<ConnectionManager>;

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            rooms: DashMap::new(),
        }
    }

    /// Register a new connection.
    pub async fn register(
        &self,
        connection_id: Uuid,
        user_id: UserId,
        sender: mpsc::Sender<ServerMessage>,
    ) {
        let info = ConnectionInfo {
            connection_id,
            user_id,
            room: None,
        };
        let mut connections = self.connections.write().await;
        connections.insert(connection_id, (info, sender));
        tracing::debug!(connection_id = %connection_id, "Connection registered");
    }

    /// Unregister a connection, removing it from its room.
    pub async fn unregister(&self, connection_id: Uuid) {
        let removed = self.connections.write().await.remove(&connection_id);
        if let Some((info, _)) = removed {
            if let Some(room) = info.room {
                self.remove_member(&room, connection_id);
            }
            tracing::debug!(connection_id = %connection_id, "Connection unregistered");
        }
    }

    pub async fn get(&self, connection_id: Uuid) -> Option<ConnectionInfo> {
        let connections = self.connections.read().await;
        connections.get(&connection_id).map(|(info, _)| info.clone())
    }

    pub async fn join_room(&self, connection_id: Uuid, room: &str) {
        let mut connections = self.connections.write().await;
        let Some((info, _)) = connections.get_mut(&connection_id) else {
            return;
        };
        if let Some(previous) = info.room.replace(room.to_string()) {
            if previous != room {
                self.remove_member(&previous, connection_id);
            }
        }
        self.rooms
            .entry(room.to_string())
            .or_default()
            .insert(connection_id);
        tracing::info!(connection_id = %connection_id, room = %room, "Connection joined room");
    }

    pub async fn leave_room(&self, connection_id: Uuid, room: &str) {
        let mut connections = self.connections.write().await;
        if let Some((info, _)) = connections.get_mut(&connection_id) {
            if info.room.as_deref() == Some(room) {
                info.room = None;
            }
        }
        self.remove_member(room, connection_id);
        tracing::info!(connection_id = %connection_id, room = %room, "Connection left room");
    }

    fn remove_member(&self, room: &str, connection_id: Uuid) {
        let now_empty = match self.rooms.get_mut(room) {
            Some(mut members) => {
                members.remove(&connection_id);
                members.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.rooms.remove_if(room, |_, members| members.is_empty());
        }
    }

    pub fn room_size(&self, room: &str) -> usize {
        self.rooms.get(room).map(|m| m.len()).unwrap_or(0)
    }

    /// Broadcast a message to every connection in a room.
    pub async fn broadcast_to_room(&self, room: &str, message: ServerMessage) {
        let members: Vec<Uuid> = match self.rooms.get(room) {
            Some(members) => members.iter().copied().collect(),
            None => return,
        };
        let connections = self.connections.read().await;
        for connection_id in members {
            if let Some((_, sender)) = connections.get(&connection_id) {
                if let Err(e) = sender.try_send(message.clone()) {
                    tracing::warn!(
                        connection_id = %connection_id,
                        error = %e,
                        "Failed to broadcast message"
                    );
                }
            }
        }
    }

    /// Send a message to one connection.
    pub async fn send_to(&self, connection_id: Uuid, message: ServerMessage) {
        let connections = self.connections.read().await;
        if let Some((_, sender)) = connections.get(&connection_id) {
            if let Err(e) = sender.try_send(message) {
                tracing::warn!(connection_id = %connection_id, error = %e, "Failed to send message");
            }
        }
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
