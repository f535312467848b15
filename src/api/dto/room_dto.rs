//! Room status DTOs for the operational API.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::Exit;
use crate::reconcile::RegistrationStatus;
use crate::service::RoomHost;

/// Registration state as reported by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum RegistrationStatusDto {
    /// No registration cycle has completed.
    Pending,
    /// The directory record is current.
    Registered {
        /// Directory record id.
        #[serde(rename = "remoteId")]
        remote_id: String,
        /// When the record was last confirmed.
        at: DateTime<Utc>,
    },
    /// Waiting for the directory to come back.
    Deferred {
        /// When the directory was first found unavailable.
        since: DateTime<Utc>,
    },
    /// The last cycle failed.
    Failed {
        /// Failure message.
        reason: String,
        /// When the failure happened.
        at: DateTime<Utc>,
    },
}

impl From<RegistrationStatus> for RegistrationStatusDto {
    fn from(status: RegistrationStatus) -> Self {
        match status {
            RegistrationStatus::Pending => Self::Pending,
            RegistrationStatus::Registered { remote_id, at } => Self::Registered { remote_id, at },
            RegistrationStatus::Deferred { since } => Self::Deferred { since },
            RegistrationStatus::Failed { reason, at } => Self::Failed { reason, at },
        }
    }
}

/// One resolved exit.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExitDto {
    /// Lower-case direction key.
    pub direction: String,
    /// Neighbouring room's id.
    pub name: String,
    /// Neighbouring room's full name.
    pub full_name: String,
    /// Description of the door on the neighbour's side.
    pub door: String,
    /// Neighbour's directory record id.
    pub remote_id: String,
    /// Where the neighbour accepts connections, if advertised.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_target: Option<String>,
}

impl From<&Exit> for ExitDto {
    fn from(exit: &Exit) -> Self {
        Self {
            direction: exit.direction.as_key().to_string(),
            name: exit.name.clone(),
            full_name: exit.full_name.clone(),
            door: exit.door_description.clone(),
            remote_id: exit.remote_id.clone(),
            connection_target: exit.connection_target.clone(),
        }
    }
}

/// Status of one hosted room for `GET /api/v1/rooms[/{room_id}]`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    /// Room id.
    pub id: String,
    /// Room full name.
    pub full_name: String,
    /// Registration state.
    pub status: RegistrationStatusDto,
    /// Exits resolved by the last successful registration.
    pub exits: Vec<ExitDto>,
    /// Connected players.
    pub connections: usize,
    /// Last bookmark issued by the room's broadcaster.
    pub last_bookmark: u64,
}

impl RoomSummaryDto {
    /// Captures the current state of `host`.
    pub async fn capture(host: &RoomHost) -> Self {
        let exits = host.room().exits().await;
        Self {
            id: host.id().to_string(),
            full_name: host.room().name().to_string(),
            status: host.status().await.into(),
            exits: exits.values().map(ExitDto::from).collect(),
            connections: host.sessions().len().await,
            last_bookmark: host.broadcaster().last_bookmark(),
        }
    }
}

/// Response body for `POST /api/v1/rooms/{room_id}/reconcile`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileResponse {
    /// Room id.
    pub room_id: String,
    /// `true` if the directory record is now current, `false` if the
    /// directory was unavailable and a background retry is running.
    pub resolved: bool,
    /// Registration state after the cycle.
    pub status: RegistrationStatusDto,
}
