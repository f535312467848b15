//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::service::RoomSet;
use crate::ws::InboundFrame;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Hosted rooms.
    pub rooms: Arc<RoomSet>,
    /// Where player frames are handed to the content engine.
    pub inbound: mpsc::Sender<InboundFrame>,
    /// Outbound queue capacity for each new connection.
    pub connection_queue_capacity: usize,
}

impl AppState {
    /// Creates the state shared by every handler.
    #[must_use]
    pub fn new(
        rooms: Arc<RoomSet>,
        inbound: mpsc::Sender<InboundFrame>,
        connection_queue_capacity: usize,
    ) -> Self {
        Self {
            rooms,
            inbound,
            connection_queue_capacity,
        }
    }
}
