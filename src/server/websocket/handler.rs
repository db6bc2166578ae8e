//! WebSocket route handler.
//!
//! Validates the session, upgrades the connection and streams marketplace
//! events to the client until either side hangs up.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use tracing::debug;

use super::messages::{msg_types, system, ClientMessage, ServerMessage};
use crate::server::session::Session;
use crate::server::state::GuardedEventHub;

/// Route handler for `GET /ws`.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    session: Session,
    State(event_hub): State<GuardedEventHub>,
) -> Response {
    debug!("WebSocket upgrade for user {}", session.user_id);
    ws.on_upgrade(move |socket| handle_socket(socket, session, event_hub))
}

async fn handle_socket(mut socket: WebSocket, session: Session, event_hub: GuardedEventHub) {
    let mut events = event_hub.subscribe();

    let connected = ServerMessage::new(
        msg_types::CONNECTED,
        system::Connected {
            server_version: env!("CARGO_PKG_VERSION").to_string(),
        },
    );
    if send_message(&mut socket, &connected).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Ok(msg) => {
                        if send_message(&mut socket, &msg).await.is_err() {
                            break;
                        }
                    }
                    // Lagged: this client missed events, keep streaming the rest.
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(
                            "WebSocket client for user {} lagged, skipped {} events",
                            session.user_id, skipped
                        );
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        handle_client_message(&mut socket, &text).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        debug!("WebSocket error for user {}: {}", session.user_id, err);
                        break;
                    }
                }
            }
        }
    }

    debug!("WebSocket disconnected for user {}", session.user_id);
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<(), axum::Error> {
    match serde_json::to_string(msg) {
        Ok(json) => socket.send(Message::Text(json.into())).await,
        Err(err) => {
            debug!("Failed to serialize WebSocket message: {}", err);
            Ok(())
        }
    }
}

async fn handle_client_message(socket: &mut WebSocket, text: &str) {
    let reply = match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) if msg.msg_type == msg_types::PING => {
            ServerMessage::new(msg_types::PONG, system::Pong)
        }
        Ok(msg) => ServerMessage::new(
            msg_types::ERROR,
            system::Error::new(
                "unknown_type",
                format!("Unknown message type: {}", msg.msg_type),
            ),
        ),
        Err(err) => ServerMessage::new(
            msg_types::ERROR,
            system::Error::new("parse_error", format!("Invalid message format: {}", err)),
        ),
    };
    let _ = send_message(socket, &reply).await;
}
