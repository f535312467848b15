//! gameon-room server entry point.
//!
//! Loads the room catalog, registers every room with the directory and
//! serves the WebSocket and operational HTTP endpoints.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use gameon_room::api;
use gameon_room::app_state::AppState;
use gameon_room::config::RoomConfig;
use gameon_room::directory::HttpDirectoryClient;
use gameon_room::service::{RoomSet, load_catalog};
use gameon_room::ws::InboundFrame;

const INBOUND_QUEUE_CAPACITY: usize = 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = RoomConfig::from_env().context("loading configuration")?;
    tracing::info!(
        addr = %config.listen_addr,
        map = %config.map_url,
        owner = %config.owner_id,
        "starting gameon-room"
    );

    let rooms = load_catalog(&config.rooms_file).context("loading room catalog")?;
    let client = Arc::new(HttpDirectoryClient::from_config(&config)?);
    let rooms = Arc::new(RoomSet::new(rooms, &client, &config));

    // Initial registration runs in the background; rooms accept players
    // whether or not the directory is reachable.
    let registering = Arc::clone(&rooms);
    tokio::spawn(async move {
        registering.reconcile_all().await;
    });

    let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_QUEUE_CAPACITY);
    tokio::spawn(drain_inbound(inbound_rx));

    let app_state = AppState::new(
        Arc::clone(&rooms),
        inbound_tx,
        config.connection_queue_capacity,
    );
    let app = api::build_app(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, rooms = rooms.len(), "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    rooms.shutdown();
    tracing::info!("server stopped");
    Ok(())
}

/// Player frames are handed to the content engine here. No engine is wired
/// into this binary, so frames are only logged.
async fn drain_inbound(mut rx: mpsc::Receiver<InboundFrame>) {
    while let Some(frame) = rx.recv().await {
        let kind = frame.route().map_or("unrouted", |(kind, _, _)| kind);
        tracing::debug!(
            room_id = %frame.room_id,
            connection_id = %frame.connection_id,
            kind,
            "inbound frame"
        );
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
