//! Room service configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). The resulting [`RoomConfig`] is built
//! once at startup and handed by reference to everything that needs it;
//! nothing below `main` reads the environment.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Owner id used when the environment does not name one.
pub const DEFAULT_OWNER_ID: &str = "game-on.org";

/// Shared secret for directory requests. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wraps a secret value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the secret for use in an outgoing request.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Top-level room service configuration.
///
/// Loaded once at startup via [`RoomConfig::from_env`].
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Base URL of the directory (map) service, e.g. `http://map:9080/map/v1/sites`.
    pub map_url: String,

    /// Externally reachable base of this process, e.g. `ws://rooms.example:9080`.
    /// Room endpoints are `<room_service_url>/ws/<room_id>`.
    pub room_service_url: String,

    /// Shared secret applied to every directory request.
    pub registration_secret: Secret,

    /// Owner id rooms are registered under.
    pub owner_id: String,

    /// Socket address to bind the HTTP/WebSocket server to.
    pub listen_addr: SocketAddr,

    /// JSON file listing the rooms this process hosts.
    pub rooms_file: PathBuf,

    /// Period of the background registration retry loop.
    pub retry_period: Duration,

    /// Request timeout for directory calls.
    pub directory_timeout: Duration,

    /// Capacity of each connection's outbound frame queue.
    pub connection_queue_capacity: usize,
}

impl RoomConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when `MAP_SERVICE_URL`,
    /// `ROOM_SERVICE_URL` or `REGISTRATION_SECRET` is absent, and
    /// [`ConfigError::Invalid`] when a value cannot be used.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`RoomConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let map_url = required(&lookup, "MAP_SERVICE_URL")?;
        let room_service_url = required(&lookup, "ROOM_SERVICE_URL")?;
        let registration_secret = Secret::new(required(&lookup, "REGISTRATION_SECRET")?);

        if !map_url.starts_with("http://") && !map_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                key: "MAP_SERVICE_URL",
                reason: format!("expected an http(s) url, got {map_url}"),
            });
        }

        let owner_id = lookup("GAMEON_ID")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_OWNER_ID.to_string());

        let listen_addr_raw = lookup("LISTEN_ADDR").unwrap_or_else(|| "0.0.0.0:9080".to_string());
        let listen_addr: SocketAddr =
            listen_addr_raw
                .parse()
                .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                    key: "LISTEN_ADDR",
                    reason: e.to_string(),
                })?;

        let rooms_file = PathBuf::from(lookup("ROOMS_FILE").unwrap_or_else(|| "rooms.json".into()));

        let retry_secs: u64 = parse_or(&lookup, "REGISTRATION_RETRY_SECS", 10);
        if retry_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "REGISTRATION_RETRY_SECS",
                reason: "retry period must be at least one second".to_string(),
            });
        }
        let timeout_secs: u64 = parse_or(&lookup, "DIRECTORY_TIMEOUT_SECS", 10);
        let connection_queue_capacity: usize =
            parse_or(&lookup, "CONNECTION_QUEUE_CAPACITY", 256).max(1);

        Ok(Self {
            map_url: map_url.trim_end_matches('/').to_string(),
            room_service_url: room_service_url.trim_end_matches('/').to_string(),
            registration_secret,
            owner_id,
            listen_addr,
            rooms_file,
            retry_period: Duration::from_secs(retry_secs),
            directory_timeout: Duration::from_secs(timeout_secs.max(1)),
            connection_queue_capacity,
        })
    }

    /// Returns the WebSocket endpoint the directory should advertise for a room.
    #[must_use]
    pub fn endpoint_for(&self, room_id: &str) -> String {
        format!("{}/ws/{room_id}", self.room_service_url)
    }
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(key))
}

/// Parses a value as `T`, returning `default` on missing or invalid values.
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
