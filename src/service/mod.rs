//! Service layer: hosted rooms and the catalog they are loaded from.
//!
//! [`RoomSet`] owns one [`RoomHost`] per catalog entry. Each host wires a
//! room to its reconciliation engine, its session registry and its
//! broadcaster.

pub mod catalog;
pub mod room_host;
pub mod room_set;

pub use catalog::{CatalogEntry, load_catalog, parse_catalog};
pub use room_host::RoomHost;
pub use room_set::RoomSet;
