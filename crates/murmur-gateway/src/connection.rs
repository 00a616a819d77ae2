use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tracing::{info, warn};

use murmur_db::Database;
use murmur_types::token::DemoClaims;

use crate::dispatcher::Dispatcher;
use crate::handler::{Session, handle_frame};

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Drive one authenticated WebSocket connection until it ends.
///
/// The demo token was checked at the HTTP upgrade, so there is no handshake
/// left to do here. However the connection ends (close frame, read error,
/// failed send, missed heartbeats), cleanup runs exactly once at the bottom.
pub async fn handle_connection(
    socket: WebSocket,
    dispatcher: Dispatcher,
    db: Arc<Database>,
    user: DemoClaims,
) {
    let (mut sender, mut receiver) = socket.split();
    let (conn_id, mut events_rx) = dispatcher.register(user.id).await;

    info!("{} ({}) connected to gateway [conn={}]", user.name, user.id, conn_id);

    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received.clone();

    // Forward queued events -> client, with heartbeat
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        loop {
            tokio::select! {
                result = events_rx.recv() => {
                    let Some(event) = result else { break };
                    let text = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!("Failed to serialize outbound event: {}", e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= 2 {
                            warn!("Heartbeat timeout (missed {} pongs), dropping connection", missed_heartbeats);
                            break;
                        }
                    }
                    if sender.send(Message::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Read events from client. One at a time, so a connection's events are
    // handled in the order they arrived.
    let session = Session {
        conn_id,
        user: user.clone(),
        dispatcher: dispatcher.clone(),
        db,
    };
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => handle_frame(&session, text.as_str()).await,
                Message::Pong(_) => pong_flag_recv.store(true, Ordering::Release),
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    let rooms = dispatcher.disconnect(conn_id).await;
    info!(
        "{} ({}) disconnected from gateway, left {} rooms",
        user.name,
        user.id,
        rooms.len()
    );
}
