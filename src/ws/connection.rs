//! Read/write loop for one player connection.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::messages::InboundFrame;
use super::outbound::WsConnection;
use crate::domain::Connection;
use crate::service::RoomHost;

/// Attaches `socket` to `host` until either side closes.
///
/// Outbound frames queued by the room's broadcaster are written in order.
/// Inbound text frames are forwarded to `inbound`; when that channel is full
/// the frame is dropped.
pub async fn run_connection(
    socket: WebSocket,
    host: Arc<RoomHost>,
    inbound: mpsc::Sender<InboundFrame>,
    queue_capacity: usize,
) {
    let (connection, mut outbound_rx) = WsConnection::channel(queue_capacity);
    let connection_id = connection.id();
    let room_id = host.id().to_string();
    host.sessions().add(connection).await;
    tracing::info!(%room_id, %connection_id, "player connected");

    let (mut ws_tx, mut ws_rx) = socket.split();
    loop {
        tokio::select! {
            frame = outbound_rx.recv() => {
                let Some(frame) = frame else { break };
                if ws_tx.send(Message::text(frame)).await.is_err() {
                    break;
                }
            }
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let frame = InboundFrame {
                            room_id: room_id.clone(),
                            connection_id,
                            text: text.as_str().to_owned(),
                        };
                        match inbound.try_send(frame) {
                            Ok(()) => {}
                            Err(TrySendError::Full(_)) => {
                                tracing::warn!(%room_id, %connection_id, "inbound queue full, frame dropped");
                            }
                            Err(TrySendError::Closed(_)) => {
                                tracing::debug!(%room_id, %connection_id, "inbound queue closed");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(%room_id, %connection_id, error = %e, "ws read failed");
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    host.sessions().remove(connection_id).await;
    tracing::info!(%room_id, %connection_id, "player disconnected");
}
