//! Push-channel connection lifecycle.
//!
//! A connection subscribes to exactly one room with its first frame. When the
//! subscribe (or a later `reconnect`) names a player, the connection is bound
//! to them: closing it marks the player disconnected and arms the grace
//! timer, and a timely reconnect on a new connection cancels the removal.

use std::sync::Arc;

use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};

use crate::protocol::{ClientMessage, ErrorCode, PlayerId};
use crate::server::hub::Subscription;
use crate::server::GameServer;

pub(super) async fn handle_socket(socket: WebSocket, server: Arc<GameServer>) {
    let (mut sender, mut receiver) = socket.split();

    let Some((mut subscription, mut bound_player)) =
        wait_for_subscribe(&mut sender, &mut receiver, &server).await
    else {
        let _ = sender.close().await;
        return;
    };

    tracing::debug!(
        room_id = %subscription.room_id,
        subscription_id = %subscription.id,
        bound = bound_player.is_some(),
        "Push channel attached"
    );

    loop {
        tokio::select! {
            frame = subscription.receiver.recv() => {
                match frame {
                    Some(frame) => {
                        // Hub frames are serde_json output and therefore UTF-8.
                        let Ok(text) = Utf8Bytes::try_from(frame.json) else {
                            continue;
                        };
                        if sender.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    // Dropped as a slow consumer, or the room was closed.
                    None => break,
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if handle_client_frame(&mut sender, &server, &text, &mut bound_player)
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        tracing::debug!(error = %err, "Push channel error");
                        break;
                    }
                }
            }
        }
    }

    server.unsubscribe(&subscription.room_id, subscription.id);
    if let Some(player_id) = bound_player {
        // The room may already be gone; disconnect is best-effort.
        let _ = server
            .disconnect_player(&subscription.room_id, player_id)
            .await;
    }
    let _ = sender.close().await;
}

/// Drive the connection until its first `subscribe` frame. Pings are answered
/// while waiting; anything else is reported and skipped.
async fn wait_for_subscribe(
    sender: &mut SplitSink<WebSocket, Message>,
    receiver: &mut SplitStream<WebSocket>,
    server: &Arc<GameServer>,
) -> Option<(Subscription, Option<PlayerId>)> {
    while let Some(incoming) = receiver.next().await {
        let text = match incoming {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => return None,
            Ok(_) => continue,
            Err(_) => return None,
        };

        match serde_json::from_str::<ClientMessage>(&text) {
            Ok(ClientMessage::Subscribe { room_id, player_id }) => {
                let subscription = match server.subscribe(&room_id).await {
                    Ok(subscription) => subscription,
                    Err(err) => {
                        let _ = send_error(sender, &err.to_string(), err.code()).await;
                        return None;
                    }
                };

                let mut bound = None;
                if let Some(player_id) = player_id {
                    // Binding doubles as an implicit reconnect.
                    match server.reconnect_player(&room_id, player_id).await {
                        Ok(()) => bound = Some(player_id),
                        Err(err) => {
                            if send_error(sender, &err.to_string(), err.code()).await.is_err() {
                                server.unsubscribe(&subscription.room_id, subscription.id);
                                return None;
                            }
                        }
                    }
                }
                return Some((subscription, bound));
            }
            Ok(ClientMessage::Ping) => {
                if send_pong(sender).await.is_err() {
                    return None;
                }
            }
            Ok(ClientMessage::Reconnect { .. }) => {
                if send_error(sender, "Subscribe to a room first", ErrorCode::InvalidState)
                    .await
                    .is_err()
                {
                    return None;
                }
            }
            Err(err) => {
                if send_error(
                    sender,
                    &format!("Malformed frame: {err}"),
                    ErrorCode::InvalidArgument,
                )
                .await
                .is_err()
                {
                    return None;
                }
            }
        }
    }
    None
}

async fn handle_client_frame(
    sender: &mut SplitSink<WebSocket, Message>,
    server: &Arc<GameServer>,
    text: &str,
    bound_player: &mut Option<PlayerId>,
) -> Result<(), axum::Error> {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Ping) => send_pong(sender).await,
        Ok(ClientMessage::Reconnect { room_id, player_id }) => {
            match server.reconnect_player(&room_id, player_id).await {
                Ok(()) => {
                    *bound_player = Some(player_id);
                    Ok(())
                }
                Err(err) => send_error(sender, &err.to_string(), err.code()).await,
            }
        }
        Ok(ClientMessage::Subscribe { .. }) => {
            send_error(
                sender,
                "Already subscribed on this connection",
                ErrorCode::InvalidState,
            )
            .await
        }
        Err(err) => {
            send_error(
                sender,
                &format!("Malformed frame: {err}"),
                ErrorCode::InvalidArgument,
            )
            .await
        }
    }
}

async fn send_pong(sender: &mut SplitSink<WebSocket, Message>) -> Result<(), axum::Error> {
    let frame = serde_json::json!({"type": "pong"}).to_string();
    sender.send(Message::Text(frame.into())).await
}

async fn send_error(
    sender: &mut SplitSink<WebSocket, Message>,
    message: &str,
    code: ErrorCode,
) -> Result<(), axum::Error> {
    let frame = serde_json::json!({
        "type": "error",
        "payload": {"message": message, "code": code},
    })
    .to_string();
    sender.send(Message::Text(frame.into())).await
}
