//! WebSocket layer: player connections to hosted rooms.
//!
//! `GET /ws/{room_id}` attaches a player to one room. The connection is
//! registered in that room's session registry for the life of the socket;
//! inbound frames are handed to the content engine through an mpsc channel.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod outbound;

pub use messages::InboundFrame;
pub use outbound::WsConnection;
