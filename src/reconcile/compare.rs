//! Structural comparison between a local room and its directory record.

use std::fmt;

use crate::domain::registration::WEBSOCKET;
use crate::domain::{Direction, RoomDefinition, RoomInfo};

/// First difference found between the local room and the directory's view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// Registered name differs from the room id.
    Name,
    /// Registered full name differs.
    FullName,
    /// Registered description differs.
    Description,
    /// Number of doors differs.
    DoorCount {
        /// Doors defined locally.
        local: usize,
        /// Doors the directory holds.
        remote: usize,
    },
    /// A door is missing remotely or has different text.
    Door(Direction),
    /// No connection details are registered.
    ConnectionDetailsAbsent,
    /// Registered connection type is not `websocket`.
    ConnectionType(String),
    /// Registered connection target is not this room's endpoint.
    ConnectionTarget(String),
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => f.write_str("name differs"),
            Self::FullName => f.write_str("full name differs"),
            Self::Description => f.write_str("description differs"),
            Self::DoorCount { local, remote } => {
                write!(f, "door count differs (local {local}, remote {remote})")
            }
            Self::Door(direction) => write!(f, "door {direction} differs"),
            Self::ConnectionDetailsAbsent => f.write_str("connection details absent"),
            Self::ConnectionType(kind) => write!(f, "connection type is {kind:?}"),
            Self::ConnectionTarget(target) => write!(f, "connection target is {target:?}"),
        }
    }
}

/// Whether the directory record needs rewriting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparison {
    /// The record matches; no write is needed.
    UpToDate,
    /// The record differs; a full update is needed.
    NeedsUpdate(Mismatch),
}

/// Compares `room` (advertised at `endpoint`) with the directory's `info`.
#[must_use]
pub fn compare(room: &RoomDefinition, info: &RoomInfo, endpoint: &str) -> Comparison {
    match first_mismatch(room, info, endpoint) {
        Some(mismatch) => Comparison::NeedsUpdate(mismatch),
        None => Comparison::UpToDate,
    }
}

fn first_mismatch(room: &RoomDefinition, info: &RoomInfo, endpoint: &str) -> Option<Mismatch> {
    if info.name != room.id() {
        return Some(Mismatch::Name);
    }
    if info.full_name != room.name() {
        return Some(Mismatch::FullName);
    }
    if info.description != room.description() {
        return Some(Mismatch::Description);
    }

    let local = room.doors().len();
    let remote = info.doors.len();
    if local != remote {
        return Some(Mismatch::DoorCount { local, remote });
    }
    for door in room.doors() {
        if info.doors.get(door.direction.as_key()) != Some(&door.description) {
            return Some(Mismatch::Door(door.direction));
        }
    }

    let Some(details) = &info.connection_details else {
        return Some(Mismatch::ConnectionDetailsAbsent);
    };
    if details.kind != WEBSOCKET {
        return Some(Mismatch::ConnectionType(details.kind.clone()));
    }
    if details.target != endpoint {
        return Some(Mismatch::ConnectionTarget(details.target.clone()));
    }
    None
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::domain::{ConnectionDetails, Door};

    const ENDPOINT: &str = "ws://rooms/ws/kitchen";

    fn room() -> RoomDefinition {
        RoomDefinition::new(
            "kitchen",
            "The Kitchen",
            "Pots everywhere.",
            [
                Door::new(Direction::North, "a wooden door"),
                Door::new(Direction::West, "a pantry curtain"),
            ],
        )
    }

    fn matching_info() -> RoomInfo {
        let mut doors = BTreeMap::new();
        doors.insert("n".to_string(), "a wooden door".to_string());
        doors.insert("w".to_string(), "a pantry curtain".to_string());
        RoomInfo {
            name: "kitchen".to_string(),
            full_name: "The Kitchen".to_string(),
            description: "Pots everywhere.".to_string(),
            doors,
            connection_details: Some(ConnectionDetails::websocket(ENDPOINT)),
        }
    }

    #[test]
    fn identical_is_up_to_date() {
        assert_eq!(
            compare(&room(), &matching_info(), ENDPOINT),
            Comparison::UpToDate
        );
    }

    #[test]
    fn door_text_difference() {
        let mut info = matching_info();
        info.doors
            .insert("n".to_string(), "a creaky door".to_string());
        assert_eq!(
            compare(&room(), &info, ENDPOINT),
            Comparison::NeedsUpdate(Mismatch::Door(Direction::North))
        );
    }

    #[test]
    fn extra_remote_door() {
        let mut info = matching_info();
        info.doors.insert("u".to_string(), "a ladder".to_string());
        assert_eq!(
            compare(&room(), &info, ENDPOINT),
            Comparison::NeedsUpdate(Mismatch::DoorCount {
                local: 2,
                remote: 3
            })
        );
    }

    #[test]
    fn door_under_other_direction() {
        let mut info = matching_info();
        info.doors.remove("w");
        info.doors
            .insert("e".to_string(), "a pantry curtain".to_string());
        assert_eq!(
            compare(&room(), &info, ENDPOINT),
            Comparison::NeedsUpdate(Mismatch::Door(Direction::West))
        );
    }

    #[test]
    fn connection_target_difference() {
        let mut info = matching_info();
        info.connection_details = Some(ConnectionDetails::websocket("ws://old/ws/kitchen"));
        assert!(matches!(
            compare(&room(), &info, ENDPOINT),
            Comparison::NeedsUpdate(Mismatch::ConnectionTarget(_))
        ));
    }

    #[test]
    fn connection_type_and_absence() {
        let mut info = matching_info();
        info.connection_details = Some(ConnectionDetails {
            kind: "http".to_string(),
            target: ENDPOINT.to_string(),
        });
        assert!(matches!(
            compare(&room(), &info, ENDPOINT),
            Comparison::NeedsUpdate(Mismatch::ConnectionType(_))
        ));

        info.connection_details = None;
        assert_eq!(
            compare(&room(), &info, ENDPOINT),
            Comparison::NeedsUpdate(Mismatch::ConnectionDetailsAbsent)
        );
    }

    #[test]
    fn basic_fields() {
        let mut info = matching_info();
        info.full_name = "Kitchen".to_string();
        assert_eq!(
            compare(&room(), &info, ENDPOINT),
            Comparison::NeedsUpdate(Mismatch::FullName)
        );
        let mut info = matching_info();
        info.name = "scullery".to_string();
        assert_eq!(
            compare(&room(), &info, ENDPOINT),
            Comparison::NeedsUpdate(Mismatch::Name)
        );
    }
}
