//! Domain layer: rooms, registration records, connections and events.
//!
//! This module contains the room-side model: the room definition with its
//! copy-on-write exit map, the directory's view of a room, the set of player
//! connections attached to a room, and the events broadcast to them.

pub mod connection_id;
pub mod registration;
pub mod room;
pub mod room_event;
pub mod session_registry;

pub use connection_id::ConnectionId;
pub use registration::{
    ConnectionDetails, RegistrationOutcome, RegistrationPayload, RegistrationRecord, RoomInfo,
};
pub use room::{Direction, Door, Exit, ExitMap, RoomDefinition};
pub use room_event::{BroadcastEvent, LocationChange};
pub use session_registry::{Connection, SessionRegistry};
