//! Directory-side view of a room: records, payloads and outcomes.
//!
//! Records are parsed strictly at the top level (a record without `_id` or
//! `info` is malformed) and leniently per exit: a bad exit entry is logged
//! and skipped so one broken neighbour cannot hide the others.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Direction, Exit, ExitMap, RoomDefinition};
use crate::error::RoomError;

/// The only connection type rooms advertise.
pub const WEBSOCKET: &str = "websocket";

/// How the directory tells players to reach a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDetails {
    /// Connection type, always `"websocket"` for rooms we register.
    #[serde(rename = "type")]
    pub kind: String,
    /// Endpoint URL.
    pub target: String,
}

impl ConnectionDetails {
    /// WebSocket connection details for the given endpoint.
    #[must_use]
    pub fn websocket(target: impl Into<String>) -> Self {
        Self {
            kind: WEBSOCKET.to_string(),
            target: target.into(),
        }
    }
}

/// The `info` block of a directory record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo {
    /// Registered room name (our room id).
    #[serde(default)]
    pub name: String,
    /// Registered full name.
    #[serde(default)]
    pub full_name: String,
    /// Registered description.
    #[serde(default)]
    pub description: String,
    /// Door descriptions keyed by lower-case direction.
    #[serde(default)]
    pub doors: BTreeMap<String, String>,
    /// Advertised connection details.
    #[serde(default)]
    pub connection_details: Option<ConnectionDetails>,
}

/// A room as the directory knows it.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationRecord {
    /// Directory-assigned record id.
    pub id: String,
    /// What the directory believes about the room.
    pub info: RoomInfo,
    /// Exits the directory has wired for the room.
    pub exits: ExitMap,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "_id")]
    id: String,
    info: RoomInfo,
    #[serde(default)]
    exits: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExit {
    name: String,
    full_name: String,
    door: String,
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    connection_details: Option<ConnectionDetails>,
}

impl RegistrationRecord {
    /// Parses a full directory record.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::MalformedResponse`] if the body is not a JSON
    /// object carrying `_id` and `info`.
    pub fn parse(body: &str) -> Result<Self, RoomError> {
        let raw: RawRecord = serde_json::from_str(body)
            .map_err(|e| RoomError::MalformedResponse(format!("registration record: {e}")))?;
        let exits = parse_exits(&raw.id, raw.exits);
        Ok(Self {
            id: raw.id,
            info: raw.info,
            exits,
        })
    }
}

fn parse_exits(record_id: &str, raw: serde_json::Map<String, serde_json::Value>) -> ExitMap {
    let mut exits = ExitMap::new();
    for (key, value) in raw {
        let direction = match key.parse::<Direction>() {
            Ok(d) => d,
            Err(reason) => {
                tracing::warn!(record_id, exit = %key, %reason, "skipping exit");
                continue;
            }
        };
        match serde_json::from_value::<RawExit>(value) {
            Ok(raw_exit) => {
                let (connection_type, connection_target) = raw_exit
                    .connection_details
                    .map_or((None, None), |c| (Some(c.kind), Some(c.target)));
                exits.insert(
                    direction,
                    Exit {
                        direction,
                        name: raw_exit.name,
                        full_name: raw_exit.full_name,
                        door_description: raw_exit.door,
                        remote_id: raw_exit.id,
                        connection_type,
                        connection_target,
                    },
                );
            }
            Err(e) => {
                tracing::warn!(record_id, exit = %key, error = %e, "skipping malformed exit");
            }
        }
    }
    exits
}

/// Extracts the record id from a `GET ?owner=&name=` query response.
///
/// # Errors
///
/// Returns [`RoomError::MalformedResponse`] if the body is not a non-empty
/// JSON array whose first element carries a string `_id`.
pub fn first_match_id(body: &str) -> Result<String, RoomError> {
    let hits: Vec<serde_json::Value> = serde_json::from_str(body)
        .map_err(|e| RoomError::MalformedResponse(format!("room query: {e}")))?;
    if hits.len() > 1 {
        tracing::warn!(matches = hits.len(), "room query matched more than one record");
    }
    hits.first()
        .and_then(|hit| hit.get("_id"))
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| RoomError::MalformedResponse("room query returned no _id".to_string()))
}

/// Body of a create (`POST`) or update (`PUT`) request. Always the full
/// description of the room, never a partial diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationPayload {
    /// Room id.
    pub name: String,
    /// Room full name.
    pub full_name: String,
    /// Room description.
    pub description: String,
    /// Door descriptions keyed by lower-case direction.
    pub doors: BTreeMap<String, String>,
    /// Where players connect.
    pub connection_details: ConnectionDetails,
}

impl RegistrationPayload {
    /// Builds the payload describing `room` at `endpoint`.
    #[must_use]
    pub fn for_room(room: &RoomDefinition, endpoint: &str) -> Self {
        Self {
            name: room.id().to_string(),
            full_name: room.name().to_string(),
            description: room.description().to_string(),
            doors: room
                .doors()
                .iter()
                .map(|d| (d.direction.as_key().to_string(), d.description.clone()))
                .collect(),
            connection_details: ConnectionDetails::websocket(endpoint),
        }
    }
}

/// Result of looking a room up in the directory.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationOutcome {
    /// The directory has no record for the room.
    NotRegistered,
    /// The directory has a record for the room.
    Registered(RegistrationRecord),
    /// The directory cannot answer right now; try again later.
    ServiceUnavailable,
}
