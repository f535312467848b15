//! `HttpDirectoryClient` and the reconciliation engine against an in-process
//! fake directory served by axum.

#![allow(clippy::panic, clippy::indexing_slicing)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

use gameon_room::config::RoomConfig;
use gameon_room::directory::{DirectoryClient, HttpDirectoryClient};
use gameon_room::domain::{Direction, Door, RoomDefinition};
use gameon_room::error::DirectoryError;
use gameon_room::reconcile::{ReconciliationEngine, RegistrationStatus};

#[derive(Debug, Clone)]
struct Seen {
    method: &'static str,
    query: HashMap<String, String>,
    gameon_id: Option<String>,
    gameon_secret: Option<String>,
}

#[derive(Debug, Default)]
struct Directory {
    record: Mutex<Option<Value>>,
    seen: Mutex<Vec<Seen>>,
}

type Shared = Arc<Directory>;

impl Directory {
    fn observe(&self, method: &'static str, headers: &HeaderMap, query: HashMap<String, String>) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(Seen {
                method,
                query,
                gameon_id: header("gameon-id"),
                gameon_secret: header("gameon-secret"),
            });
        }
    }

    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn record(&self) -> Option<Value> {
        self.record.lock().ok().and_then(|r| r.clone())
    }

    fn store(&self, info: Value) -> Value {
        let record = json!({
            "_id": "rec1",
            "info": info,
            "exits": {
                "n": {"name": "hall", "fullName": "The Hall", "door": "an arch", "_id": "hall1",
                      "connectionDetails": {"type": "websocket", "target": "ws://other/ws/hall"}}
            }
        });
        if let Ok(mut slot) = self.record.lock() {
            *slot = Some(record.clone());
        }
        record
    }
}

async fn query_rooms(
    State(dir): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    dir.observe("GET", &headers, query);
    match dir.record() {
        Some(record) => Json(json!([{"_id": record["_id"]}])).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

async fn create_room(
    State(dir): State<Shared>,
    headers: HeaderMap,
    Json(info): Json<Value>,
) -> Response {
    dir.observe("POST", &headers, HashMap::new());
    (StatusCode::CREATED, Json(dir.store(info))).into_response()
}

async fn get_room(State(dir): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    dir.observe("GET", &headers, HashMap::new());
    match dir.record() {
        Some(record) if record["_id"] == id.as_str() => Json(record).into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn update_room(
    State(dir): State<Shared>,
    headers: HeaderMap,
    Path(_id): Path<String>,
    Json(info): Json<Value>,
) -> Response {
    dir.observe("PUT", &headers, HashMap::new());
    Json(dir.store(info)).into_response()
}

async fn serve_directory() -> (String, Shared) {
    let dir = Shared::default();
    let app = Router::new()
        .route("/map/v1/sites", get(query_rooms).post(create_room))
        .route("/map/v1/sites/{id}", get(get_room).put(update_room))
        .with_state(Arc::clone(&dir));
    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}/map/v1/sites"), dir)
}

fn config(map_url: &str) -> RoomConfig {
    let map_url = map_url.to_string();
    let lookup = move |key: &str| match key {
        "MAP_SERVICE_URL" => Some(map_url.clone()),
        "ROOM_SERVICE_URL" => Some("ws://rooms.test:9080".to_string()),
        "REGISTRATION_SECRET" => Some("s3cret".to_string()),
        "GAMEON_ID" => Some("owner-1".to_string()),
        _ => None,
    };
    let Ok(config) = RoomConfig::from_lookup(lookup) else {
        panic!("config must load");
    };
    config
}

fn client(config: &RoomConfig) -> HttpDirectoryClient {
    let Ok(client) = HttpDirectoryClient::from_config(config) else {
        panic!("client must build");
    };
    client
}

fn kitchen(door: &str) -> RoomDefinition {
    RoomDefinition::new(
        "kitchen",
        "The Kitchen",
        "Pots everywhere.",
        [Door::new(Direction::North, door)],
    )
}

#[tokio::test]
async fn query_carries_owner_name_and_auth_headers() {
    let (url, dir) = serve_directory().await;
    let config = config(&url);
    let client = client(&config);

    let response = tokio_test::assert_ok!(client.find_room("owner-1", "kitchen").await);
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let seen = dir.seen();
    assert_eq!(seen.len(), 1);
    let call = &seen[0];
    assert_eq!(call.method, "GET");
    assert_eq!(call.query.get("owner").map(String::as_str), Some("owner-1"));
    assert_eq!(call.query.get("name").map(String::as_str), Some("kitchen"));
    assert_eq!(call.gameon_id.as_deref(), Some("owner-1"));
    assert_eq!(call.gameon_secret.as_deref(), Some("s3cret"));
}

#[tokio::test]
async fn refused_connection_is_unreachable() {
    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    drop(listener);

    let config = config(&format!("http://{addr}/map/v1/sites"));
    let result = client(&config).find_room("owner-1", "kitchen").await;
    assert!(matches!(result, Err(DirectoryError::Unreachable(_))));
}

#[tokio::test]
async fn registers_then_stays_quiet_then_updates() {
    let (url, dir) = serve_directory().await;
    let config = config(&url);
    let client = Arc::new(client(&config));

    let room = Arc::new(kitchen("a wooden door"));
    let engine = Arc::new(ReconciliationEngine::new(
        Arc::clone(&room),
        Arc::clone(&client),
        &config,
    ));

    // First cycle creates the record and wires exits from the response.
    assert!(tokio_test::assert_ok!(engine.reconcile().await));
    let exits = room.exits().await;
    let Some(north) = exits.get(&Direction::North) else {
        panic!("north exit missing");
    };
    assert_eq!(north.remote_id, "hall1");
    assert_eq!(north.connection_target.as_deref(), Some("ws://other/ws/hall"));

    let Some(stored) = dir.record() else {
        panic!("record not stored");
    };
    assert_eq!(stored["info"]["connectionDetails"]["target"], "ws://rooms.test:9080/ws/kitchen");
    assert_eq!(stored["info"]["doors"]["n"], "a wooden door");

    // Second cycle finds an identical record and writes nothing.
    assert!(tokio_test::assert_ok!(engine.reconcile().await));
    let methods: Vec<&str> = dir.seen().iter().map(|s| s.method).collect();
    assert_eq!(methods, vec!["GET", "POST", "GET", "GET"]);

    // A changed door text triggers exactly one full update.
    let changed = Arc::new(ReconciliationEngine::new(
        Arc::new(kitchen("a creaky door")),
        client,
        &config,
    ));
    assert!(tokio_test::assert_ok!(changed.reconcile().await));
    let puts = dir.seen().iter().filter(|s| s.method == "PUT").count();
    assert_eq!(puts, 1);
    let Some(stored) = dir.record() else {
        panic!("record not stored");
    };
    assert_eq!(stored["info"]["doors"]["n"], "a creaky door");
    assert!(matches!(
        changed.status().await,
        RegistrationStatus::Registered { .. }
    ));
}
