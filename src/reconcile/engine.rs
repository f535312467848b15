//! Per-room registration state machine.
//!
//! ```text
//! QueryExisting ──204──→ Create ──201──→ ApplyExits
//!       │
//!       ├──200──→ Compare ──match──→ ApplyExits (no write)
//!       │            └──differs──→ Update ──200──→ ApplyExits
//!       │
//!       ├──404/503/refused──→ ScheduleRetry (returns false)
//!       └──other──→ protocol error
//! ```
//!
//! A failed update still applies the exits of the record that was just
//! fetched, so the room keeps its last known-good wiring. A failed create
//! leaves the exit map untouched.

use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use tokio::sync::RwLock;

use super::compare::{Comparison, compare};
use super::retry::{RetryAttempt, RetryScheduler};
use crate::config::RoomConfig;
use crate::directory::{DirectoryClient, DirectoryResponse};
use crate::domain::registration::first_match_id;
use crate::domain::{RegistrationOutcome, RegistrationPayload, RegistrationRecord, RoomDefinition};
use crate::error::{DirectoryError, RoomError};

/// Observable registration state of a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationStatus {
    /// No cycle has completed yet.
    Pending,
    /// The directory holds an up-to-date record.
    Registered {
        /// Directory record id.
        remote_id: String,
        /// When the record was last confirmed.
        at: DateTime<Utc>,
    },
    /// The directory was unavailable; a background loop is retrying.
    Deferred {
        /// When the directory was first found unavailable.
        since: DateTime<Utc>,
    },
    /// The last cycle failed with a protocol or transport error.
    Failed {
        /// Error message.
        reason: String,
        /// When the failure happened.
        at: DateTime<Utc>,
    },
}

impl RegistrationStatus {
    /// Short state name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Registered { .. } => "registered",
            Self::Deferred { .. } => "deferred",
            Self::Failed { .. } => "failed",
        }
    }
}

enum WriteMode<'a> {
    Create,
    Update(&'a str),
}

/// Keeps one room's directory record in line with its local definition.
#[derive(Debug)]
pub struct ReconciliationEngine<C> {
    room: Arc<RoomDefinition>,
    client: Arc<C>,
    owner_id: String,
    endpoint: String,
    retry: RetryScheduler,
    status: RwLock<RegistrationStatus>,
}

impl<C: DirectoryClient> ReconciliationEngine<C> {
    /// Creates an engine for `room`, advertised at the endpoint derived from
    /// `config`.
    #[must_use]
    pub fn new(room: Arc<RoomDefinition>, client: Arc<C>, config: &RoomConfig) -> Self {
        let endpoint = config.endpoint_for(room.id());
        let retry = RetryScheduler::new(room.id(), config.retry_period);
        Self {
            room,
            client,
            owner_id: config.owner_id.clone(),
            endpoint,
            retry,
            status: RwLock::new(RegistrationStatus::Pending),
        }
    }

    /// The room being reconciled.
    #[must_use]
    pub fn room(&self) -> &Arc<RoomDefinition> {
        &self.room
    }

    /// WebSocket endpoint advertised for the room.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The room's retry scheduler.
    #[must_use]
    pub fn retry(&self) -> &RetryScheduler {
        &self.retry
    }

    /// Current registration status.
    pub async fn status(&self) -> RegistrationStatus {
        self.status.read().await.clone()
    }

    /// Full create/update body for the room.
    #[must_use]
    pub fn payload(&self) -> RegistrationPayload {
        RegistrationPayload::for_room(&self.room, &self.endpoint)
    }

    /// Runs one reconciliation cycle.
    ///
    /// Returns `Ok(true)` when the directory record is confirmed or written
    /// and the exit map updated, `Ok(false)` when the directory is
    /// unavailable and the cycle was handed to the background retry loop.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::Protocol`] for unexpected status codes,
    /// [`RoomError::MalformedResponse`] for unparseable bodies and
    /// [`RoomError::Directory`] for transport failures. No retry is
    /// scheduled for these.
    pub async fn reconcile(self: &Arc<Self>) -> Result<bool, RoomError> {
        let room_id = self.room.id();
        let result = match self.query_existing().await {
            Ok(RegistrationOutcome::NotRegistered) => {
                tracing::info!(room_id, "room not registered, creating");
                self.register().await
            }
            Ok(RegistrationOutcome::Registered(record)) => self.refresh(record).await,
            Ok(RegistrationOutcome::ServiceUnavailable) => {
                tracing::info!(room_id, "directory unavailable, deferring registration");
                self.defer().await;
                return Ok(false);
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(remote_id) => {
                *self.status.write().await = RegistrationStatus::Registered {
                    remote_id,
                    at: Utc::now(),
                };
                Ok(true)
            }
            Err(e) => {
                tracing::error!(room_id, error = %e, "room registration failed");
                *self.status.write().await = RegistrationStatus::Failed {
                    reason: e.to_string(),
                    at: Utc::now(),
                };
                Err(e)
            }
        }
    }

    /// Looks the room up by owner and name.
    async fn query_existing(&self) -> Result<RegistrationOutcome, RoomError> {
        let Some(response) = self
            .reachable(self.client.find_room(&self.owner_id, self.room.id()).await)?
        else {
            return Ok(RegistrationOutcome::ServiceUnavailable);
        };

        match response.status {
            StatusCode::NO_CONTENT => Ok(RegistrationOutcome::NotRegistered),
            StatusCode::OK => {
                let id = first_match_id(&response.body)?;
                let Some(full) = self.reachable(self.client.get_room(&id).await)? else {
                    return Ok(RegistrationOutcome::ServiceUnavailable);
                };
                match full.status {
                    StatusCode::OK => {
                        tracing::debug!(room_id = self.room.id(), remote_id = %id, body = %full.body, "existing registration");
                        Ok(RegistrationOutcome::Registered(RegistrationRecord::parse(
                            &full.body,
                        )?))
                    }
                    StatusCode::NOT_FOUND | StatusCode::SERVICE_UNAVAILABLE => {
                        Ok(RegistrationOutcome::ServiceUnavailable)
                    }
                    _ => Err(protocol_error(full)),
                }
            }
            // A missing collection is treated as the directory being down.
            StatusCode::NOT_FOUND | StatusCode::SERVICE_UNAVAILABLE => {
                Ok(RegistrationOutcome::ServiceUnavailable)
            }
            _ => Err(protocol_error(response)),
        }
    }

    /// Maps a refused connection to `None`; both lookups treat it like a
    /// `503`.
    fn reachable(
        &self,
        reply: Result<DirectoryResponse, DirectoryError>,
    ) -> Result<Option<DirectoryResponse>, RoomError> {
        match reply {
            Ok(response) => Ok(Some(response)),
            Err(DirectoryError::Unreachable(reason)) => {
                tracing::info!(room_id = self.room.id(), %reason, "directory unreachable");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// `Compare` followed by `Update` when needed. Returns the record id.
    async fn refresh(&self, record: RegistrationRecord) -> Result<String, RoomError> {
        let room_id = self.room.id();
        match compare(&self.room, &record.info, &self.endpoint) {
            Comparison::UpToDate => {
                tracing::info!(room_id, remote_id = %record.id, "registration up to date");
                let RegistrationRecord { id, exits, .. } = record;
                self.room.replace_exits(exits).await;
                Ok(id)
            }
            Comparison::NeedsUpdate(mismatch) => {
                tracing::info!(room_id, remote_id = %record.id, %mismatch, "registration needs update");
                match self.write(WriteMode::Update(&record.id)).await {
                    Ok(updated) => {
                        let RegistrationRecord { id, exits, .. } = updated;
                        self.room.replace_exits(exits).await;
                        Ok(id)
                    }
                    Err(e) => {
                        tracing::warn!(room_id, "update failed, keeping exits from existing registration");
                        self.room.replace_exits(record.exits).await;
                        Err(e)
                    }
                }
            }
        }
    }

    /// `Create` followed by `ApplyExits`. Returns the new record id.
    async fn register(&self) -> Result<String, RoomError> {
        let created = self.write(WriteMode::Create).await?;
        let RegistrationRecord { id, exits, .. } = created;
        self.room.replace_exits(exits).await;
        Ok(id)
    }

    async fn write(&self, mode: WriteMode<'_>) -> Result<RegistrationRecord, RoomError> {
        let payload = self.payload();
        let (response, expected) = match mode {
            WriteMode::Create => (
                self.client.create_room(&payload).await?,
                StatusCode::CREATED,
            ),
            WriteMode::Update(id) => (
                self.client.update_room(id, &payload).await?,
                StatusCode::OK,
            ),
        };
        if response.status != expected {
            return Err(protocol_error(response));
        }
        let record = RegistrationRecord::parse(&response.body)?;
        tracing::info!(
            room_id = self.room.id(),
            remote_id = %record.id,
            exits = record.exits.len(),
            "registration written"
        );
        Ok(record)
    }

    async fn defer(self: &Arc<Self>) {
        let started = self.schedule_retry();
        let mut status = self.status.write().await;
        if started || !matches!(*status, RegistrationStatus::Deferred { .. }) {
            *status = RegistrationStatus::Deferred { since: Utc::now() };
        }
    }

    fn schedule_retry(self: &Arc<Self>) -> bool {
        let engine = Arc::clone(self);
        self.retry.try_start(move || -> RetryAttempt {
            let engine = Arc::clone(&engine);
            async move { engine.reconcile().await }.boxed()
        })
    }
}

fn protocol_error(response: DirectoryResponse) -> RoomError {
    tracing::error!(
        status = response.status.as_u16(),
        body = %response.body,
        "unexpected directory response"
    );
    RoomError::Protocol {
        status: response.status.as_u16(),
        body: response.body,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::directory::fake::{Call, ScriptedDirectory};
    use crate::domain::{Direction, Door};

    fn config() -> RoomConfig {
        let lookup = |key: &str| match key {
            "MAP_SERVICE_URL" => Some("http://map.local/map/v1/sites".to_string()),
            "ROOM_SERVICE_URL" => Some("ws://rooms.local".to_string()),
            "REGISTRATION_SECRET" => Some("secret".to_string()),
            _ => None,
        };
        let Ok(cfg) = RoomConfig::from_lookup(lookup) else {
            panic!("test config must load");
        };
        cfg
    }

    fn kitchen() -> Arc<RoomDefinition> {
        Arc::new(RoomDefinition::new(
            "kitchen",
            "The Kitchen",
            "Pots everywhere.",
            [Door::new(Direction::North, "a wooden door")],
        ))
    }

    fn engine(dir: &Arc<ScriptedDirectory>) -> Arc<ReconciliationEngine<ScriptedDirectory>> {
        Arc::new(ReconciliationEngine::new(kitchen(), Arc::clone(dir), &config()))
    }

    fn record(door: &str, target: &str, exits: &str) -> String {
        format!(
            r#"{{"_id":"rec1","info":{{"name":"kitchen","fullName":"The Kitchen","description":"Pots everywhere.","doors":{{"n":"{door}"}},"connectionDetails":{{"type":"websocket","target":"{target}"}}}},"exits":{exits}}}"#
        )
    }

    const HALL_EXIT: &str =
        r#"{"n":{"name":"hall","fullName":"The Hall","door":"an arch","_id":"hall1"}}"#;
    const GARDEN_EXIT: &str =
        r#"{"s":{"name":"garden","fullName":"The Garden","door":"a gate","_id":"garden1"}}"#;
    const ENDPOINT: &str = "ws://rooms.local/ws/kitchen";

    #[tokio::test]
    async fn unregistered_room_is_created_once() {
        let dir = Arc::new(ScriptedDirectory::new());
        dir.on_find(StatusCode::NO_CONTENT, "").on_create(
            StatusCode::CREATED,
            &record("a wooden door", ENDPOINT, HALL_EXIT),
        );
        let engine = engine(&dir);

        let resolved = engine.reconcile().await;
        assert!(matches!(resolved, Ok(true)));

        let writes = dir.writes();
        assert_eq!(writes.len(), 1);
        let Some(Call::Create(payload)) = writes.first() else {
            panic!("expected a create call");
        };
        assert_eq!(payload, &engine.payload());

        let exits = engine.room().exits().await;
        assert_eq!(
            exits.get(&Direction::North).map(|e| e.remote_id.as_str()),
            Some("hall1")
        );
        assert!(matches!(
            engine.status().await,
            RegistrationStatus::Registered { .. }
        ));
    }

    #[tokio::test]
    async fn matching_record_needs_no_write() {
        let dir = Arc::new(ScriptedDirectory::new());
        dir.on_find(StatusCode::OK, r#"[{"_id":"rec1"}]"#).on_get(
            StatusCode::OK,
            &record("a wooden door", ENDPOINT, HALL_EXIT),
        );
        let engine = engine(&dir);

        assert!(matches!(engine.reconcile().await, Ok(true)));
        assert!(dir.writes().is_empty());
        assert_eq!(
            dir.calls().get(1),
            Some(&Call::Get("rec1".to_string()))
        );
        assert_eq!(engine.room().exits().await.len(), 1);
    }

    #[tokio::test]
    async fn differing_door_issues_full_update() {
        let dir = Arc::new(ScriptedDirectory::new());
        dir.on_find(StatusCode::OK, r#"[{"_id":"rec1"}]"#)
            .on_get(
                StatusCode::OK,
                &record("a creaky door", ENDPOINT, HALL_EXIT),
            )
            .on_update(
                StatusCode::OK,
                &record("a wooden door", ENDPOINT, GARDEN_EXIT),
            );
        let engine = engine(&dir);

        assert!(matches!(engine.reconcile().await, Ok(true)));
        let writes = dir.writes();
        assert_eq!(writes.len(), 1);
        let Some(Call::Update(id, payload)) = writes.first() else {
            panic!("expected an update call");
        };
        assert_eq!(id, "rec1");
        assert_eq!(
            payload.doors.get("n").map(String::as_str),
            Some("a wooden door")
        );
        assert_eq!(payload.full_name, "The Kitchen");
        assert_eq!(payload.connection_details.target, ENDPOINT);

        let exits = engine.room().exits().await;
        assert!(exits.contains_key(&Direction::South));
        assert!(!exits.contains_key(&Direction::North));
    }

    #[tokio::test]
    async fn differing_target_issues_update() {
        let dir = Arc::new(ScriptedDirectory::new());
        dir.on_find(StatusCode::OK, r#"[{"_id":"rec1"}]"#)
            .on_get(
                StatusCode::OK,
                &record("a wooden door", "ws://old/ws/kitchen", HALL_EXIT),
            )
            .on_update(
                StatusCode::OK,
                &record("a wooden door", ENDPOINT, HALL_EXIT),
            );
        let engine = engine(&dir);

        assert!(matches!(engine.reconcile().await, Ok(true)));
        assert_eq!(dir.writes().len(), 1);
    }

    #[tokio::test]
    async fn failed_update_keeps_existing_exits() {
        let dir = Arc::new(ScriptedDirectory::new());
        dir.on_find(StatusCode::OK, r#"[{"_id":"rec1"}]"#)
            .on_get(
                StatusCode::OK,
                &record("a creaky door", ENDPOINT, HALL_EXIT),
            )
            .on_update(StatusCode::FORBIDDEN, "nope");
        let engine = engine(&dir);

        let result = engine.reconcile().await;
        assert!(matches!(
            result,
            Err(RoomError::Protocol { status: 403, .. })
        ));
        let exits = engine.room().exits().await;
        assert!(exits.contains_key(&Direction::North));
        assert!(matches!(
            engine.status().await,
            RegistrationStatus::Failed { .. }
        ));
    }

    #[tokio::test]
    async fn failed_create_leaves_exits_untouched() {
        let dir = Arc::new(ScriptedDirectory::new());
        dir.on_find(StatusCode::NO_CONTENT, "")
            .on_create(StatusCode::BAD_REQUEST, "bad");
        let engine = engine(&dir);

        assert!(engine.reconcile().await.is_err());
        assert!(engine.room().exits().await.is_empty());
        assert!(!engine.retry().is_active());
    }

    #[tokio::test]
    async fn unexpected_query_status_is_protocol_error_without_retry() {
        let dir = Arc::new(ScriptedDirectory::new());
        dir.on_find(StatusCode::INTERNAL_SERVER_ERROR, "oops");
        let engine = engine(&dir);

        let result = engine.reconcile().await;
        assert!(matches!(
            result,
            Err(RoomError::Protocol { status: 500, .. })
        ));
        assert!(!engine.retry().is_active());
        assert_eq!(engine.retry().loops_started(), 0);
    }

    #[tokio::test]
    async fn malformed_query_body_is_an_error() {
        let dir = Arc::new(ScriptedDirectory::new());
        dir.on_find(StatusCode::OK, "not json");
        let engine = engine(&dir);
        assert!(matches!(
            engine.reconcile().await,
            Err(RoomError::MalformedResponse(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_defers_and_retries_after_period() {
        let dir = Arc::new(ScriptedDirectory::new());
        dir.on_find(StatusCode::NOT_FOUND, "")
            .on_find(StatusCode::NO_CONTENT, "")
            .on_create(
                StatusCode::CREATED,
                &record("a wooden door", ENDPOINT, HALL_EXIT),
            );
        let engine = engine(&dir);

        assert!(matches!(engine.reconcile().await, Ok(false)));
        assert!(engine.retry().is_active());
        assert!(matches!(
            engine.status().await,
            RegistrationStatus::Deferred { .. }
        ));

        tokio::time::sleep(Duration::from_secs(9)).await;
        assert_eq!(dir.find_count(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(dir.find_count(), 2);
        assert_eq!(dir.writes().len(), 1);
        assert!(!engine.retry().is_active());
        assert!(matches!(
            engine.status().await,
            RegistrationStatus::Registered { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_directory_defers() {
        let dir = Arc::new(ScriptedDirectory::new());
        dir.on_find_err(DirectoryError::Unreachable("refused".to_string()));
        let engine = engine(&dir);

        assert!(matches!(engine.reconcile().await, Ok(false)));
        assert_eq!(engine.retry().loops_started(), 1);
        engine.retry().shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn refused_record_fetch_defers() {
        let dir = Arc::new(ScriptedDirectory::new());
        dir.on_find(StatusCode::OK, r#"[{"_id":"rec1"}]"#)
            .on_get_err(DirectoryError::Unreachable("connection refused".to_string()));
        let engine = engine(&dir);

        assert!(matches!(engine.reconcile().await, Ok(false)));
        assert_eq!(engine.retry().loops_started(), 1);
        assert!(engine.retry().is_active());
        assert!(matches!(
            engine.status().await,
            RegistrationStatus::Deferred { .. }
        ));
        assert!(dir.writes().is_empty());
        engine.retry().shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_unavailable_schedules_one_loop() {
        let dir = Arc::new(ScriptedDirectory::new());
        let engine = engine(&dir);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let engine = Arc::clone(&engine);
            handles.push(tokio::spawn(async move { engine.reconcile().await }));
        }
        for handle in handles {
            let Ok(result) = handle.await else {
                panic!("task failed");
            };
            assert!(matches!(result, Ok(false)));
        }
        assert_eq!(engine.retry().loops_started(), 1);

        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(dir.find_count(), 8 + 3);
        assert_eq!(engine.retry().loops_started(), 1);
        engine.retry().shutdown();
    }
}
