//! Domain events emitted by the game content engine for a room.
//!
//! Every [`BroadcastEvent`] is stamped with a bookmark and fanned out to all
//! connections by [`crate::broadcast::EventBroadcaster`].

use std::collections::BTreeMap;

use super::RoomDefinition;

/// Everything a player needs to render the room they are standing in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationChange {
    /// Player the view is for.
    pub sender_id: String,
    /// Room id.
    pub room_id: String,
    /// Room full name.
    pub full_name: String,
    /// Room description.
    pub description: String,
    /// Exit direction to exit description. Keys are upper-cased on the wire.
    pub exits: BTreeMap<String, String>,
    /// Room-specific commands and their help text. Keys are upper-cased on
    /// the wire.
    pub commands: BTreeMap<String, String>,
    /// Items the player carries.
    pub inventory: Vec<String>,
    /// Items visible in the room.
    pub objects: Vec<String>,
}

impl LocationChange {
    /// Builds a location view from the room's own definition and its current
    /// exit snapshot. Exits are described by the neighbour's door text.
    pub async fn for_room(
        room: &RoomDefinition,
        sender_id: impl Into<String>,
        commands: BTreeMap<String, String>,
        inventory: Vec<String>,
        objects: Vec<String>,
    ) -> Self {
        let exits = room
            .exits()
            .await
            .values()
            .map(|exit| {
                (
                    exit.direction.as_key().to_string(),
                    exit.door_description.clone(),
                )
            })
            .collect();
        Self {
            sender_id: sender_id.into(),
            room_id: room.id().to_string(),
            full_name: room.name().to_string(),
            description: room.description().to_string(),
            exits,
            commands,
            inventory,
            objects,
        }
    }
}

/// Game event to be delivered to a room's players.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastEvent {
    /// Something a player did, with separate text for the actor and for
    /// everyone else. Either text may be absent.
    PlayerMessage {
        /// Acting player.
        sender_id: String,
        /// Text shown to the acting player.
        self_text: Option<String>,
        /// Text shown to everyone else.
        others_text: Option<String>,
    },
    /// Something the room itself announces to everyone.
    RoomMessage {
        /// Announcement text.
        text: String,
    },
    /// A chat line.
    ChatMessage {
        /// Display name of the speaker.
        username: String,
        /// What was said.
        text: String,
    },
    /// A player's view of the room.
    LocationChange(LocationChange),
    /// A player leaving through an exit.
    ExitTraversal {
        /// Departing player.
        sender_id: String,
        /// Exit the player took (direction key).
        exit_id: String,
        /// Narrative shown to the player.
        text: String,
    },
}

impl BroadcastEvent {
    /// Returns the event kind as a static string slice.
    #[must_use]
    pub const fn kind_str(&self) -> &'static str {
        match self {
            Self::PlayerMessage { .. } => "player_message",
            Self::RoomMessage { .. } => "room_message",
            Self::ChatMessage { .. } => "chat_message",
            Self::LocationChange(_) => "location_change",
            Self::ExitTraversal { .. } => "exit_traversal",
        }
    }

    /// Returns the player the event originates from, if any.
    #[must_use]
    pub fn sender_id(&self) -> Option<&str> {
        match self {
            Self::PlayerMessage { sender_id, .. } | Self::ExitTraversal { sender_id, .. } => {
                Some(sender_id)
            }
            Self::LocationChange(location) => Some(&location.sender_id),
            Self::RoomMessage { .. } | Self::ChatMessage { .. } => None,
        }
    }
}
