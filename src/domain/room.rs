//! Room definition: identity, doors, and the exit map resolved by the
//! directory service.
//!
//! The exit map is copy-on-write. Reconciliation builds a complete new map
//! and swaps it in under a short write lock; readers clone the current
//! [`Arc`] and never observe a half-applied update.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Compass and vertical directions a room can be linked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// North (`n`).
    #[serde(rename = "n", alias = "N", alias = "north")]
    North,
    /// South (`s`).
    #[serde(rename = "s", alias = "S", alias = "south")]
    South,
    /// East (`e`).
    #[serde(rename = "e", alias = "E", alias = "east")]
    East,
    /// West (`w`).
    #[serde(rename = "w", alias = "W", alias = "west")]
    West,
    /// Up (`u`).
    #[serde(rename = "u", alias = "U", alias = "up")]
    Up,
    /// Down (`d`).
    #[serde(rename = "d", alias = "D", alias = "down")]
    Down,
}

impl Direction {
    /// Lower-case key used in directory door and exit maps.
    #[must_use]
    pub const fn as_key(self) -> &'static str {
        match self {
            Self::North => "n",
            Self::South => "s",
            Self::East => "e",
            Self::West => "w",
            Self::Up => "u",
            Self::Down => "d",
        }
    }

    /// Upper-case key used in player-facing location events.
    #[must_use]
    pub const fn as_upper_key(self) -> &'static str {
        match self {
            Self::North => "N",
            Self::South => "S",
            Self::East => "E",
            Self::West => "W",
            Self::Up => "U",
            Self::Down => "D",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "n" | "north" => Ok(Self::North),
            "s" | "south" => Ok(Self::South),
            "e" | "east" => Ok(Self::East),
            "w" | "west" => Ok(Self::West),
            "u" | "up" => Ok(Self::Up),
            "d" | "down" => Ok(Self::Down),
            other => Err(format!("unknown direction {other:?}")),
        }
    }
}

/// A room's own description of one of its exits, offered to the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Door {
    /// Which side of the room the door is on.
    pub direction: Direction,
    /// What a player sees when looking at the door.
    pub description: String,
}

impl Door {
    /// Creates a door.
    #[must_use]
    pub fn new(direction: Direction, description: impl Into<String>) -> Self {
        Self {
            direction,
            description: description.into(),
        }
    }
}

/// A resolved link from this room to a neighbour, as wired by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Exit {
    /// Direction of travel.
    pub direction: Direction,
    /// Short name of the neighbouring room.
    pub name: String,
    /// Full name of the neighbouring room.
    pub full_name: String,
    /// Door description supplied by the neighbour.
    pub door_description: String,
    /// Directory id of the neighbouring room.
    pub remote_id: String,
    /// Connection type of the neighbour; absent for rooms without their own
    /// endpoint (e.g. the first room).
    pub connection_type: Option<String>,
    /// Connection target of the neighbour.
    pub connection_target: Option<String>,
}

/// Exits keyed by direction.
pub type ExitMap = BTreeMap<Direction, Exit>;

/// A room hosted by this process.
#[derive(Debug)]
pub struct RoomDefinition {
    id: String,
    name: String,
    description: String,
    doors: Vec<Door>,
    exits: RwLock<Arc<ExitMap>>,
}

impl RoomDefinition {
    /// Creates a room with no resolved exits.
    ///
    /// Doors keep their given order; a later door for a direction already
    /// present replaces the earlier one in place.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        doors: impl IntoIterator<Item = Door>,
    ) -> Self {
        let mut ordered: Vec<Door> = Vec::new();
        for door in doors {
            match ordered.iter_mut().find(|d| d.direction == door.direction) {
                Some(existing) => *existing = door,
                None => ordered.push(door),
            }
        }
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            doors: ordered,
            exits: RwLock::new(Arc::new(ExitMap::new())),
        }
    }

    /// Stable identifier; registered in the directory as the room `name`.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable name; registered as the room `fullName`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Room description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Doors in declaration order.
    #[must_use]
    pub fn doors(&self) -> &[Door] {
        &self.doors
    }

    /// Door facing the given direction, if any.
    #[must_use]
    pub fn door(&self, direction: Direction) -> Option<&Door> {
        self.doors.iter().find(|d| d.direction == direction)
    }

    /// Current exit map snapshot.
    pub async fn exits(&self) -> Arc<ExitMap> {
        Arc::clone(&*self.exits.read().await)
    }

    /// Swaps in a complete exit map.
    pub(crate) async fn replace_exits(&self, exits: ExitMap) {
        let fresh = Arc::new(exits);
        *self.exits.write().await = fresh;
    }
}
