//! The set of rooms hosted by this process.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures_util::future::join_all;

use super::room_host::RoomHost;
use crate::config::RoomConfig;
use crate::directory::{DirectoryClient, HttpDirectoryClient};
use crate::domain::RoomDefinition;
use crate::error::RoomError;

/// Hosted rooms keyed by id. Built once at startup and shared read-only.
#[derive(Debug)]
pub struct RoomSet<C = HttpDirectoryClient> {
    rooms: BTreeMap<String, Arc<RoomHost<C>>>,
}

impl<C: DirectoryClient> RoomSet<C> {
    /// Creates a host for each room, all registering through `client`.
    ///
    /// Rooms are expected to have unique ids; a later duplicate replaces an
    /// earlier one.
    #[must_use]
    pub fn new(
        rooms: impl IntoIterator<Item = RoomDefinition>,
        client: &Arc<C>,
        config: &RoomConfig,
    ) -> Self {
        let rooms = rooms
            .into_iter()
            .map(|room| {
                let host = RoomHost::new(room, Arc::clone(client), config);
                (host.id().to_string(), Arc::new(host))
            })
            .collect();
        Self { rooms }
    }

    /// Looks up a room by id.
    #[must_use]
    pub fn get(&self, room_id: &str) -> Option<&Arc<RoomHost<C>>> {
        self.rooms.get(room_id)
    }

    /// Looks up a room by id, failing with [`RoomError::RoomNotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::RoomNotFound`] if no such room is hosted.
    pub fn require(&self, room_id: &str) -> Result<&Arc<RoomHost<C>>, RoomError> {
        self.get(room_id)
            .ok_or_else(|| RoomError::RoomNotFound(room_id.to_string()))
    }

    /// Rooms in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<RoomHost<C>>> {
        self.rooms.values()
    }

    /// Number of hosted rooms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Returns `true` if no room is hosted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Reconciles every room concurrently. Failures are logged per room and
    /// do not stop the others; rooms that could not reach the directory keep
    /// retrying in the background.
    ///
    /// Returns the number of rooms resolved in this pass.
    pub async fn reconcile_all(&self) -> usize {
        let results = join_all(self.rooms.values().map(|host| async move {
            (host.id().to_string(), host.reconcile().await)
        }))
        .await;

        let mut resolved = 0;
        for (room_id, result) in results {
            match result {
                Ok(true) => resolved += 1,
                Ok(false) => tracing::info!(%room_id, "registration deferred"),
                Err(e) => tracing::error!(%room_id, error = %e, "registration failed"),
            }
        }
        tracing::info!(resolved, total = self.rooms.len(), "initial registration pass complete");
        resolved
    }

    /// Stops every background registration loop.
    pub fn shutdown(&self) {
        for host in self.rooms.values() {
            host.shutdown();
        }
    }
}
