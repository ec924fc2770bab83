//! WebSocket endpoint for the lesson room channel
//!
//! Frames are the tagged JSON enums from `liveboard_core::protocol`. The
//! first frame on a connection must be `join`; after that the socket is a
//! dumb relay: inbound `event` frames go to the room bus, bus frames that
//! pass the echo rule come back down the socket. The relay holds no board
//! state at all; the clients' controllers own that.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use liveboard_core::protocol::{ClientMessage, ServerMessage};
use tokio::sync::mpsc;

use crate::api::AppState;
use crate::rooms::RoomRegistry;

pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.registry.clone()))
}

async fn handle_socket(socket: WebSocket, registry: Arc<RoomRegistry>) {
    let (mut sink, mut stream) = socket.split();

    // First frame must be a join.
    let (room_code, me) = loop {
        let frame = match stream.next().await {
            Some(Ok(Message::Text(text))) => text.to_string(),
            Some(Ok(Message::Close(_))) | None => return,
            Some(Ok(_)) => continue,
            Some(Err(err)) => {
                tracing::debug!(%err, "socket error before join");
                return;
            }
        };
        match serde_json::from_str::<ClientMessage>(&frame) {
            Ok(ClientMessage::Join { room, participant }) => break (room, participant),
            Ok(_) => {
                let _ = send_frame(
                    &mut sink,
                    &ServerMessage::Error {
                        message: "expected a join frame first".to_string(),
                    },
                )
                .await;
            }
            Err(err) => {
                let _ = send_frame(
                    &mut sink,
                    &ServerMessage::Error {
                        message: format!("invalid frame: {err}"),
                    },
                )
                .await;
            }
        }
    };

    let (mut bus_rx, roster) = registry.join(&room_code, me.clone());
    if send_frame(
        &mut sink,
        &ServerMessage::Joined {
            room: room_code.clone(),
            roster,
        },
    )
    .await
    .is_err()
    {
        registry.leave(&room_code, me.id);
        return;
    }

    tracing::info!(room = %room_code, participant = %me.name, "socket joined room");

    // Outbound frames funnel through one mpsc so the bus forwarder and the
    // inbound loop never fight over the sink.
    let (out_tx, mut out_rx) = mpsc::channel::<ServerMessage>(64);

    let send_task = tokio::spawn(async move {
        while let Some(message) = out_rx.recv().await {
            if send_frame(&mut sink, &message).await.is_err() {
                break;
            }
        }
    });

    let bus_out = out_tx.clone();
    let viewer = me.id;
    let bus_task = tokio::spawn(async move {
        loop {
            match bus_rx.recv().await {
                Ok(broadcast) => {
                    if broadcast.delivers_to(viewer)
                        && bus_out.send(broadcast.message).await.is_err()
                    {
                        break;
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    // Fine for this protocol: every payload is full state, the
                    // next frame supersedes whatever was missed.
                    tracing::warn!(room_lag = skipped, "slow socket skipped bus frames");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // Inbound loop.
    loop {
        let frame = match stream.next().await {
            Some(Ok(Message::Text(text))) => text.to_string(),
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => continue,
            Some(Err(err)) => {
                tracing::debug!(room = %room_code, %err, "socket read error");
                break;
            }
        };
        match serde_json::from_str::<ClientMessage>(&frame) {
            Ok(ClientMessage::Event { event }) => {
                registry.relay(&room_code, me.id, event);
            }
            Ok(ClientMessage::Leave) => break,
            Ok(ClientMessage::Join { .. }) => {
                let _ = out_tx
                    .send(ServerMessage::Error {
                        message: "already joined".to_string(),
                    })
                    .await;
            }
            Err(err) => {
                let _ = out_tx
                    .send(ServerMessage::Error {
                        message: format!("invalid frame: {err}"),
                    })
                    .await;
            }
        }
    }

    registry.leave(&room_code, me.id);
    tracing::info!(room = %room_code, participant = %me.name, "socket left room");
    bus_task.abort();
    drop(out_tx);
    let _ = send_task.await;
}

async fn send_frame(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    message: &ServerMessage,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(message).unwrap_or_else(|err| {
        // ServerMessage serialization cannot fail; keep the connection alive
        // with an error frame if it somehow does.
        format!("{{\"type\":\"error\",\"message\":\"{err}\"}}")
    });
    sink.send(Message::Text(json.into())).await
}
