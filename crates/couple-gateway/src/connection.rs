use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use couple_types::events::{GatewayCommand, GatewayEvent};

use crate::dispatcher::Dispatcher;

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Serve one gateway WebSocket until either side goes away.
pub async fn handle_connection(socket: WebSocket, dispatcher: Dispatcher) {
    let (mut sender, mut receiver) = socket.split();

    let (conn_id, mut events_rx) = dispatcher.register_connection().await;
    info!("Gateway connection {} opened", conn_id);

    match serde_json::to_string(&GatewayEvent::Ready) {
        Ok(ready) => {
            if sender.send(Message::Text(ready.into())).await.is_err() {
                dispatcher.unregister_connection(conn_id).await;
                return;
            }
        }
        Err(e) => warn!("Failed to encode Ready frame: {}", e),
    }

    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received;

    // Forward subscribed events -> client, with heartbeat
    let send_dispatcher = dispatcher.clone();
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        loop {
            tokio::select! {
                result = events_rx.recv() => {
                    let event = match result {
                        Ok(event) => event,
                        Err(RecvError::Lagged(n)) => {
                            warn!("Gateway connection {} lagged by {} events", conn_id, n);
                            continue;
                        }
                        Err(RecvError::Closed) => break,
                    };

                    if !send_dispatcher.is_subscribed(conn_id, &event.channel).await {
                        continue;
                    }

                    let frame = GatewayEvent::Event((*event).clone());
                    let text = match serde_json::to_string(&frame) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!("Failed to encode {} event: {}", event.event, e);
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
                            warn!("Heartbeat timeout (missed {} pongs), dropping connection {}", missed_heartbeats, conn_id);
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

    // Read commands from client
    let recv_dispatcher = dispatcher.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<GatewayCommand>(&text) {
                    Ok(cmd) => handle_command(&recv_dispatcher, conn_id, cmd).await,
                    Err(e) => {
                        warn!(
                            "Connection {} bad command: {} -- raw: {}",
                            conn_id,
                            e,
                            text.chars().take(200).collect::<String>()
                        );
                    }
                },
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
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

    dispatcher.unregister_connection(conn_id).await;
    info!("Gateway connection {} closed", conn_id);
}

async fn handle_command(dispatcher: &Dispatcher, conn_id: Uuid, cmd: GatewayCommand) {
    match cmd {
        GatewayCommand::Subscribe { channels } => {
            debug!("Connection {} subscribing to {:?}", conn_id, channels);
            dispatcher.subscribe_channels(conn_id, channels).await;
        }
        GatewayCommand::Unsubscribe { channels } => {
            debug!("Connection {} unsubscribing from {:?}", conn_id, channels);
            dispatcher.unsubscribe_channels(conn_id, &channels).await;
        }
    }
}
