//! # gameon-room
//!
//! Room service for a distributed text adventure.
//!
//! Each hosted room keeps its identity, doors and connection address in step
//! with a central directory (map) service, and streams bookmarked game
//! events to the players connected to it over WebSocket.
//!
//! ## Architecture
//!
//! ```text
//! Players (WebSocket)      Operators (HTTP)
//!     │                        │
//!     ├── WS Handler (ws/)     ├── REST Handlers (api/)
//!     │                        │
//!     └──────── RoomSet / RoomHost (service/) ────────┐
//!                 │                 │                 │
//!       SessionRegistry     EventBroadcaster   ReconciliationEngine
//!          (domain/)         (broadcast/)        (reconcile/)
//!                                                     │
//!                                              DirectoryClient
//!                                               (directory/)
//!                                                     │
//!                                            Directory (map) service
//! ```

pub mod api;
pub mod app_state;
pub mod broadcast;
pub mod config;
pub mod directory;
pub mod domain;
pub mod error;
pub mod reconcile;
pub mod service;
pub mod ws;
