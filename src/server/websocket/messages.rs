//! WebSocket message envelopes.
//!
//! Everything on the wire is a `{type, payload}` pair; payloads are plain
//! JSON values so new event types need no protocol change.
#![allow(dead_code)]

use serde::{Deserialize, Serialize};

/// Server -> Client message envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub payload: serde_json::Value,
}

impl ServerMessage {
    pub fn new(msg_type: impl Into<String>, payload: impl Serialize) -> Self {
        Self {
            msg_type: msg_type.into(),
            payload: serde_json::to_value(payload).unwrap_or(serde_json::Value::Null),
        }
    }

    pub fn empty(msg_type: impl Into<String>) -> Self {
        Self {
            msg_type: msg_type.into(),
            payload: serde_json::Value::Null,
        }
    }
}

/// Client -> Server message envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// System-level messages used by the websocket plumbing itself.
pub mod system {
    use serde::{Deserialize, Serialize};

    /// Sent immediately after the connection is established.
    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    pub struct Connected {
        pub server_version: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    pub struct Pong;

    /// Sent when the server cannot process a client message.
    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    pub struct Error {
        pub code: String,
        pub message: String,
    }

    impl Error {
        pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
            Self {
                code: code.into(),
                message: message.into(),
            }
        }
    }
}

/// Reserved message type constants. Marketplace events use their own names
/// (`shift_created`, `application_created`, `application_status_updated`).
pub mod msg_types {
    pub const CONNECTED: &str = "connected";
    pub const PING: &str = "ping";
    pub const PONG: &str = "pong";
    pub const ERROR: &str = "error";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_serializes_with_type_field() {
        let msg = ServerMessage::new("shift_created", serde_json::json!({"id": 7}));
        let json = serde_json::to_string(&msg).unwrap();

        assert!(json.contains("\"type\":\"shift_created\""));
        assert!(json.contains("\"payload\":{\"id\":7}"));
    }

    #[test]
    fn client_message_deserializes_without_payload() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(msg.msg_type, "ping");
        assert_eq!(msg.payload, serde_json::Value::Null);
    }

    #[test]
    fn empty_message_has_null_payload() {
        let msg = ServerMessage::empty(msg_types::PONG);
        assert_eq!(msg.msg_type, "pong");
        assert_eq!(msg.payload, serde_json::Value::Null);
    }
}
