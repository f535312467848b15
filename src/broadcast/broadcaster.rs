//! Bookmarked fan-out of room events to connected players.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::envelope::encode;
use crate::domain::{BroadcastEvent, LocationChange, SessionRegistry};
use crate::error::{RoomError, SendError};

/// Outcome of one broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// Bookmark stamped on the frame.
    pub bookmark: u64,
    /// Connections that accepted the frame.
    pub delivered: usize,
    /// Connections that did not.
    pub failed: usize,
}

/// Stamps events with a room-wide bookmark and sends the resulting frame to
/// every connection in the room.
///
/// The recipient field of a frame is advisory: all connections receive every
/// frame and filter on their side.
#[derive(Debug)]
pub struct EventBroadcaster {
    room_id: String,
    sessions: Arc<SessionRegistry>,
    next_bookmark: AtomicU64,
}

impl EventBroadcaster {
    /// Creates a broadcaster whose first bookmark is `1`.
    #[must_use]
    pub fn new(room_id: impl Into<String>, sessions: Arc<SessionRegistry>) -> Self {
        Self {
            room_id: room_id.into(),
            sessions,
            next_bookmark: AtomicU64::new(1),
        }
    }

    /// The registry this broadcaster sends to.
    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// Most recently issued bookmark, `0` if none has been issued.
    #[must_use]
    pub fn last_bookmark(&self) -> u64 {
        self.next_bookmark.load(Ordering::Acquire).saturating_sub(1)
    }

    /// Encodes `event` under the next bookmark and delivers it to every
    /// connection present at the time of the call.
    ///
    /// Connections whose queue is closed are removed from the registry. A
    /// full queue drops the frame for that connection only.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::Encode`] if the envelope cannot be serialized.
    /// The bookmark is consumed either way.
    pub async fn broadcast(&self, event: &BroadcastEvent) -> Result<Delivery, RoomError> {
        let bookmark = self.next_bookmark.fetch_add(1, Ordering::AcqRel);
        let frame = encode(event, bookmark)?.to_string();
        tracing::trace!(room_id = %self.room_id, bookmark, %frame, "broadcasting");

        let mut delivery = Delivery {
            bookmark,
            delivered: 0,
            failed: 0,
        };
        for connection in self.sessions.snapshot().await {
            match connection.send_text(&frame) {
                Ok(()) => delivery.delivered += 1,
                Err(e) => {
                    delivery.failed += 1;
                    let connection_id = connection.id();
                    tracing::warn!(
                        room_id = %self.room_id,
                        %connection_id,
                        bookmark,
                        error = %e,
                        "frame not delivered"
                    );
                    if e == SendError::Closed {
                        self.sessions.remove(connection_id).await;
                    }
                }
            }
        }

        tracing::debug!(
            room_id = %self.room_id,
            kind = event.kind_str(),
            sender = event.sender_id(),
            bookmark,
            delivered = delivery.delivered,
            failed = delivery.failed,
            "event broadcast"
        );
        Ok(delivery)
    }

    /// Broadcasts a player action.
    ///
    /// # Errors
    ///
    /// See [`EventBroadcaster::broadcast`].
    pub async fn player_message(
        &self,
        sender_id: &str,
        self_text: Option<&str>,
        others_text: Option<&str>,
    ) -> Result<Delivery, RoomError> {
        self.broadcast(&BroadcastEvent::PlayerMessage {
            sender_id: sender_id.to_string(),
            self_text: self_text.map(str::to_owned),
            others_text: others_text.map(str::to_owned),
        })
        .await
    }

    /// Broadcasts a room-wide announcement.
    ///
    /// # Errors
    ///
    /// See [`EventBroadcaster::broadcast`].
    pub async fn room_message(&self, text: &str) -> Result<Delivery, RoomError> {
        self.broadcast(&BroadcastEvent::RoomMessage {
            text: text.to_string(),
        })
        .await
    }

    /// Broadcasts a chat line.
    ///
    /// # Errors
    ///
    /// See [`EventBroadcaster::broadcast`].
    pub async fn chat(&self, username: &str, text: &str) -> Result<Delivery, RoomError> {
        self.broadcast(&BroadcastEvent::ChatMessage {
            username: username.to_string(),
            text: text.to_string(),
        })
        .await
    }

    /// Broadcasts a player's view of the room.
    ///
    /// # Errors
    ///
    /// See [`EventBroadcaster::broadcast`].
    pub async fn location(&self, location: LocationChange) -> Result<Delivery, RoomError> {
        self.broadcast(&BroadcastEvent::LocationChange(location))
            .await
    }

    /// Broadcasts a player leaving through `exit_id`.
    ///
    /// # Errors
    ///
    /// See [`EventBroadcaster::broadcast`].
    pub async fn exit(
        &self,
        sender_id: &str,
        exit_id: &str,
        text: &str,
    ) -> Result<Delivery, RoomError> {
        self.broadcast(&BroadcastEvent::ExitTraversal {
            sender_id: sender_id.to_string(),
            exit_id: exit_id.to_string(),
            text: text.to_string(),
        })
        .await
    }
}
