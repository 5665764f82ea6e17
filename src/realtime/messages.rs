//! WebSocket control messages
//!
//! Board events themselves are [`crate::types::BoardEvent`]; this module holds
//! the frames a client sends and the non-event frames the server answers with.

use serde::{Deserialize, Serialize};

use crate::types::BoardId;

/// Client message types
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Start receiving events for a board
    JoinBoard {
        #[serde(rename = "boardId")]
        board_id: BoardId,
    },

    /// Stop receiving events for a board
    LeaveBoard {
        #[serde(rename = "boardId")]
        board_id: BoardId,
    },

    /// Ping for heartbeat
    Ping,
}

/// Server control frames
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once after the handshake is accepted
    Connected {
        #[serde(rename = "connectionId")]
        connection_id: String,
        #[serde(rename = "userId")]
        user_id: String,
    },

    /// Reply to `ping`
    Pong,

    /// The client sent something the server could not act on
    Error { code: String, message: String },
}

impl ServerMessage {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_parsing() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"join_board","boardId":"board-1"}"#).unwrap();
        assert_eq!(msg, ClientMessage::JoinBoard { board_id: "board-1".to_string() });

        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"leave_board","boardId":"board-1"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::LeaveBoard { .. }));

        let msg: ClientMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Ping));
    }

    #[test]
    fn test_join_without_board_is_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"join_board"}"#).is_err());
    }

    #[test]
    fn test_server_message_serialization() {
        let json = serde_json::to_string(&ServerMessage::Pong).unwrap();
        assert_eq!(json, r#"{"type":"pong"}"#);

        let json = serde_json::to_string(&ServerMessage::Connected {
            connection_id: "c1".to_string(),
            user_id: "alice".to_string(),
        })
        .unwrap();
        assert!(json.contains(r#""type":"connected""#));
        assert!(json.contains(r#""userId":"alice""#));
    }
}
