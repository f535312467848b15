//! Frames received from players.

use crate::domain::ConnectionId;

/// A text frame a player sent to a room, handed to the content engine
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundFrame {
    /// Room the connection is attached to.
    pub room_id: String,
    /// Connection the frame arrived on.
    pub connection_id: ConnectionId,
    /// Raw frame text.
    pub text: String,
}

impl InboundFrame {
    /// Splits a `<kind>,<target>,<payload>` frame into its parts.
    ///
    /// Returns `None` if the frame has fewer than three fields.
    #[must_use]
    pub fn route(&self) -> Option<(&str, &str, &str)> {
        let mut parts = self.text.splitn(3, ',');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(kind), Some(target), Some(payload)) => Some((kind, target, payload)),
            _ => None,
        }
    }
}
