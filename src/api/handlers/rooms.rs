//! Room status handlers: list, get, reconcile.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{ReconcileResponse, RoomSummaryDto};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, RoomError};

/// `GET /rooms`: List hosted rooms.
#[utoipa::path(
    get,
    path = "/api/v1/rooms",
    tag = "Rooms",
    summary = "List hosted rooms",
    description = "Returns every room hosted by this process with its registration state, resolved exits and connection count.",
    responses(
        (status = 200, description = "Hosted rooms", body = Vec<RoomSummaryDto>),
    )
)]
pub async fn list_rooms(State(state): State<AppState>) -> Json<Vec<RoomSummaryDto>> {
    let mut rooms = Vec::with_capacity(state.rooms.len());
    for host in state.rooms.iter() {
        rooms.push(RoomSummaryDto::capture(host).await);
    }
    Json(rooms)
}

/// `GET /rooms/{room_id}`: Get one room.
///
/// # Errors
///
/// Returns [`RoomError::RoomNotFound`] if the room is not hosted here.
#[utoipa::path(
    get,
    path = "/api/v1/rooms/{room_id}",
    tag = "Rooms",
    summary = "Get room status",
    params(("room_id" = String, Path, description = "Room id")),
    responses(
        (status = 200, description = "Room status", body = RoomSummaryDto),
        (status = 404, description = "Room not hosted here", body = ErrorResponse),
    )
)]
pub async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomSummaryDto>, RoomError> {
    let host = state.rooms.require(&room_id)?;
    Ok(Json(RoomSummaryDto::capture(host).await))
}

/// `POST /rooms/{room_id}/reconcile`: Run one registration cycle now.
///
/// # Errors
///
/// Returns [`RoomError::RoomNotFound`] for an unknown room and a `502`
/// error when the directory answers unexpectedly.
#[utoipa::path(
    post,
    path = "/api/v1/rooms/{room_id}/reconcile",
    tag = "Rooms",
    summary = "Reconcile room registration",
    description = "Compares the room with its directory record and writes the record if it differs. A directory that is unavailable yields `resolved: false` and a background retry.",
    params(("room_id" = String, Path, description = "Room id")),
    responses(
        (status = 200, description = "Cycle finished", body = ReconcileResponse),
        (status = 404, description = "Room not hosted here", body = ErrorResponse),
        (status = 502, description = "Directory protocol error", body = ErrorResponse),
    )
)]
pub async fn reconcile_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<ReconcileResponse>, RoomError> {
    let host = state.rooms.require(&room_id)?;
    let resolved = host.reconcile().await?;
    Ok(Json(ReconcileResponse {
        room_id,
        resolved,
        status: host.status().await.into(),
    }))
}

/// Room routes, mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rooms", get(list_rooms))
        .route("/rooms/{room_id}", get(get_room))
        .route("/rooms/{room_id}/reconcile", post(reconcile_room))
}
