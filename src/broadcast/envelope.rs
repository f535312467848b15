//! Wire encoding of room events.
//!
//! A frame is `<category>,<recipient>,<json>` where the JSON envelope always
//! starts with `type` and ends with `bookmark`:
//!
//! ```text
//! player,*,{"type":"chat","username":"alice","content":"hi","bookmark":1}
//! playerLocation,bob,{"type":"exit","exitId":"n","content":"You leave.","bookmark":2}
//! player,bob,{"type":"location","name":"kitchen","fullName":"The Kitchen",...,"bookmark":3}
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::domain::{BroadcastEvent, LocationChange};

/// Recipient meaning "everyone in the room".
pub const ALL_RECIPIENTS: &str = "*";

/// First field of a wire frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Messages rendered to players.
    Player,
    /// Messages that move a player between rooms.
    PlayerLocation,
}

impl Category {
    /// Wire form of the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::PlayerLocation => "playerLocation",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An encoded event, ready to be written to every connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireFrame {
    /// Frame category.
    pub category: Category,
    /// Intended recipient: a player id or `*`.
    pub recipient: String,
    /// JSON envelope.
    pub json: String,
}

impl fmt::Display for WireFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.category, self.recipient, self.json)
    }
}

#[derive(Serialize)]
struct Envelope<'a> {
    #[serde(flatten)]
    body: Body<'a>,
    bookmark: u64,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Body<'a> {
    Event {
        content: BTreeMap<&'a str, &'a str>,
    },
    Chat {
        username: &'a str,
        content: &'a str,
    },
    Location(LocationContent<'a>),
    Exit {
        #[serde(rename = "exitId")]
        exit_id: &'a str,
        content: &'a str,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LocationContent<'a> {
    name: &'a str,
    full_name: &'a str,
    description: &'a str,
    exits: BTreeMap<String, &'a str>,
    commands: BTreeMap<String, &'a str>,
    pockets: &'a [String],
    objects: &'a [String],
}

impl<'a> LocationContent<'a> {
    fn new(location: &'a LocationChange) -> Self {
        Self {
            name: &location.room_id,
            full_name: &location.full_name,
            description: &location.description,
            exits: upper_keys(&location.exits),
            commands: upper_keys(&location.commands),
            pockets: &location.inventory,
            objects: &location.objects,
        }
    }
}

fn upper_keys(map: &BTreeMap<String, String>) -> BTreeMap<String, &str> {
    map.iter()
        .map(|(k, v)| (k.to_uppercase(), v.as_str()))
        .collect()
}

fn non_empty(text: Option<&String>) -> Option<&str> {
    text.map(String::as_str).filter(|t| !t.is_empty())
}

/// Encodes `event` with the given bookmark.
///
/// # Errors
///
/// Returns the serializer error if the envelope cannot be encoded.
pub fn encode(event: &BroadcastEvent, bookmark: u64) -> Result<WireFrame, serde_json::Error> {
    let (category, recipient, body) = match event {
        BroadcastEvent::PlayerMessage {
            sender_id,
            self_text,
            others_text,
        } => {
            let mut content = BTreeMap::new();
            let others = non_empty(others_text.as_ref());
            if let Some(text) = others {
                content.insert(ALL_RECIPIENTS, text);
            }
            if let Some(text) = non_empty(self_text.as_ref()) {
                content.insert(sender_id.as_str(), text);
            }
            let recipient = if others.is_some() {
                ALL_RECIPIENTS
            } else {
                sender_id.as_str()
            };
            (Category::Player, recipient, Body::Event { content })
        }
        BroadcastEvent::RoomMessage { text } => {
            let mut content = BTreeMap::new();
            content.insert(ALL_RECIPIENTS, text.as_str());
            (Category::Player, ALL_RECIPIENTS, Body::Event { content })
        }
        BroadcastEvent::ChatMessage { username, text } => (
            Category::Player,
            ALL_RECIPIENTS,
            Body::Chat {
                username: username.as_str(),
                content: text.as_str(),
            },
        ),
        BroadcastEvent::LocationChange(location) => (
            Category::Player,
            location.sender_id.as_str(),
            Body::Location(LocationContent::new(location)),
        ),
        BroadcastEvent::ExitTraversal {
            sender_id,
            exit_id,
            text,
        } => (
            Category::PlayerLocation,
            sender_id.as_str(),
            Body::Exit {
                exit_id: exit_id.as_str(),
                content: text.as_str(),
            },
        ),
    };

    let json = serde_json::to_string(&Envelope { body, bookmark })?;
    Ok(WireFrame {
        category,
        recipient: recipient.to_string(),
        json,
    })
}
