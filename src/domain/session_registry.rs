//! Set of player connections currently attached to a room.
//!
//! [`SessionRegistry`] maps [`ConnectionId`] to a shared [`Connection`]
//! handle behind a [`tokio::sync::RwLock`]. Broadcasts work from a
//! [`SessionRegistry::snapshot`], so connections may come and go while a
//! broadcast is in flight without the broadcast faulting.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::ConnectionId;
use crate::error::SendError;

/// Capability to push a single text frame to one connected player.
///
/// Implementations must not block: the WebSocket implementation queues the
/// frame for its writer task.
pub trait Connection: Send + Sync + fmt::Debug {
    /// Identifier of this connection.
    fn id(&self) -> ConnectionId;

    /// Queues one text frame for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Closed`] if the connection is gone and
    /// [`SendError::QueueFull`] if it cannot accept more frames right now.
    fn send_text(&self, frame: &str) -> Result<(), SendError>;
}

/// Thread-safe set of a room's active connections.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    connections: RwLock<HashMap<ConnectionId, Arc<dyn Connection>>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection. Returns `false` if its id was already present, in
    /// which case the new handle replaces the old one.
    pub async fn add(&self, connection: Arc<dyn Connection>) -> bool {
        let id = connection.id();
        let replaced = self.connections.write().await.insert(id, connection);
        tracing::debug!(connection_id = %id, "connection added");
        replaced.is_none()
    }

    /// Removes a connection, returning its handle if it was present.
    pub async fn remove(&self, id: ConnectionId) -> Option<Arc<dyn Connection>> {
        let removed = self.connections.write().await.remove(&id);
        if removed.is_some() {
            tracing::debug!(connection_id = %id, "connection removed");
        }
        removed
    }

    /// Returns the connections present at the time of the call.
    pub async fn snapshot(&self) -> Vec<Arc<dyn Connection>> {
        self.connections.read().await.values().cloned().collect()
    }

    /// Returns `true` if the id is currently registered.
    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.connections.read().await.contains_key(&id)
    }

    /// Number of active connections.
    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Returns `true` if no connection is registered.
    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }
}
