//! One hosted room with everything attached to it.

use std::sync::Arc;

use crate::broadcast::EventBroadcaster;
use crate::config::RoomConfig;
use crate::directory::{DirectoryClient, HttpDirectoryClient};
use crate::domain::{RoomDefinition, SessionRegistry};
use crate::error::RoomError;
use crate::reconcile::{ReconciliationEngine, RegistrationStatus};

/// A room definition bundled with its reconciliation engine, its connected
/// players and its broadcaster.
#[derive(Debug)]
pub struct RoomHost<C = HttpDirectoryClient> {
    room: Arc<RoomDefinition>,
    engine: Arc<ReconciliationEngine<C>>,
    sessions: Arc<SessionRegistry>,
    broadcaster: EventBroadcaster,
}

impl<C: DirectoryClient> RoomHost<C> {
    /// Creates a host for `room` that registers through `client`.
    #[must_use]
    pub fn new(room: RoomDefinition, client: Arc<C>, config: &RoomConfig) -> Self {
        let room = Arc::new(room);
        let sessions = Arc::new(SessionRegistry::new());
        let engine = Arc::new(ReconciliationEngine::new(
            Arc::clone(&room),
            client,
            config,
        ));
        let broadcaster = EventBroadcaster::new(room.id(), Arc::clone(&sessions));
        Self {
            room,
            engine,
            sessions,
            broadcaster,
        }
    }

    /// Room id.
    #[must_use]
    pub fn id(&self) -> &str {
        self.room.id()
    }

    /// The room definition.
    #[must_use]
    pub fn room(&self) -> &Arc<RoomDefinition> {
        &self.room
    }

    /// The room's reconciliation engine.
    #[must_use]
    pub fn engine(&self) -> &Arc<ReconciliationEngine<C>> {
        &self.engine
    }

    /// Players connected to the room.
    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// The room's broadcaster.
    #[must_use]
    pub fn broadcaster(&self) -> &EventBroadcaster {
        &self.broadcaster
    }

    /// Runs one reconciliation cycle for the room.
    ///
    /// # Errors
    ///
    /// See [`ReconciliationEngine::reconcile`].
    pub async fn reconcile(&self) -> Result<bool, RoomError> {
        self.engine.reconcile().await
    }

    /// Current registration status.
    pub async fn status(&self) -> RegistrationStatus {
        self.engine.status().await
    }

    /// Stops any background registration loop.
    pub fn shutdown(&self) {
        self.engine.retry().shutdown();
    }
}
