//! Axum WebSocket upgrade handler.

use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::response::Response;

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::error::RoomError;

/// `GET /ws/{room_id}`: upgrade to a player connection for one room.
///
/// # Errors
///
/// Returns [`RoomError::RoomNotFound`] (404) if the room is not hosted here.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, RoomError> {
    let host = Arc::clone(state.rooms.require(&room_id)?);
    let inbound = state.inbound.clone();
    let capacity = state.connection_queue_capacity;
    Ok(ws.on_upgrade(move |socket| run_connection(socket, host, inbound, capacity)))
}
