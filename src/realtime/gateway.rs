//! Realtime gateway: connection lifecycle bound to the registry
//!
//! ```text
//! Connecting ──auth ok──▶ Authenticated ──join(A)──▶ Subscribed(A)
//!     │                        ▲                      │      │
//!  auth fails                  └──────leave(A)────────┘   join(B): leave A, join B
//!     ▼                                                      ▼
//!  rejected             any state ──close──▶ Closed     Subscribed(B)
//! ```
//!
//! A connection never reaches `Authenticated` without a verified credential.
//! Each session handles its own messages one at a time, so a connection's
//! joins and leaves apply in the order the client sent them.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::connection::{Connection, Frame};
use super::messages::{ClientMessage, ServerMessage};
use super::registry::ConnectionRegistry;
use crate::auth::{AuthError, SharedVerifier};
use crate::types::BoardId;

/// Lifecycle state of one connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Authenticated,
    Subscribed(BoardId),
    Closed,
}

/// Admits connections and hands out sessions
#[derive(Clone)]
pub struct Gateway {
    verifier: SharedVerifier,
    registry: Arc<ConnectionRegistry>,
    outbound_capacity: usize,
}

impl Gateway {
    pub fn new(
        verifier: SharedVerifier,
        registry: Arc<ConnectionRegistry>,
        outbound_capacity: usize,
    ) -> Self {
        Self {
            verifier,
            registry,
            outbound_capacity,
        }
    }

    /// Run the handshake for a connection presenting `credential`.
    ///
    /// On success the session is `Authenticated` and the receiver yields every
    /// frame queued for the connection.
    pub fn open(
        &self,
        credential: Option<&str>,
    ) -> Result<(GatewaySession, mpsc::Receiver<Frame>), AuthError> {
        let mut state = ConnectionState::Connecting;

        let credential = credential
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let principal = self.verifier.verify(credential)?;
        let (connection, outbound) = Connection::new(principal, self.outbound_capacity);
        state = transition(&connection, state, ConnectionState::Authenticated);

        let session = GatewaySession {
            connection,
            state,
            registry: self.registry.clone(),
        };
        Ok((session, outbound))
    }
}

fn transition(
    connection: &Connection,
    from: ConnectionState,
    to: ConnectionState,
) -> ConnectionState {
    tracing::debug!("[Gateway] {} {:?} -> {:?}", connection.id(), from, to);
    to
}

/// One authenticated connection's view of the gateway
pub struct GatewaySession {
    connection: Connection,
    state: ConnectionState,
    registry: Arc<ConnectionRegistry>,
}

impl GatewaySession {
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Board this connection is viewing, if any
    pub fn board(&self) -> Option<&str> {
        match &self.state {
            ConnectionState::Subscribed(board_id) => Some(board_id),
            _ => None,
        }
    }

    /// Welcome frame for the client
    pub fn welcome(&self) -> ServerMessage {
        ServerMessage::Connected {
            connection_id: self.connection.id().to_string(),
            user_id: self.connection.principal().to_string(),
        }
    }

    /// Dispatch one client message; returns a direct reply if there is one
    pub fn handle(&mut self, message: ClientMessage) -> Option<ServerMessage> {
        match message {
            ClientMessage::JoinBoard { board_id } => {
                self.join_board(&board_id);
                None
            }
            ClientMessage::LeaveBoard { board_id } => {
                self.leave_board(&board_id);
                None
            }
            ClientMessage::Ping => Some(ServerMessage::Pong),
        }
    }

    /// Subscribe to `board_id`, leaving the current board first
    pub fn join_board(&mut self, board_id: &str) {
        if board_id.is_empty() {
            return;
        }
        match &self.state {
            ConnectionState::Connecting | ConnectionState::Closed => return,
            ConnectionState::Subscribed(current) if current == board_id => {
                // Repeated join is harmless
                self.registry.subscribe(&self.connection, board_id);
                return;
            }
            ConnectionState::Subscribed(current) => {
                self.registry.unsubscribe(self.connection.id(), current);
            }
            ConnectionState::Authenticated => {}
        }

        self.registry.subscribe(&self.connection, board_id);
        let from = std::mem::replace(&mut self.state, ConnectionState::Closed);
        self.state = transition(
            &self.connection,
            from,
            ConnectionState::Subscribed(board_id.to_string()),
        );
        tracing::info!(
            "[Gateway] {} ({}) joined board {}",
            self.connection.id(),
            self.connection.principal(),
            board_id
        );
    }

    /// Unsubscribe from `board_id` immediately
    pub fn leave_board(&mut self, board_id: &str) {
        if self.state == ConnectionState::Closed {
            return;
        }
        self.registry.unsubscribe(self.connection.id(), board_id);

        if self.board() == Some(board_id) {
            let from = std::mem::replace(&mut self.state, ConnectionState::Closed);
            self.state = transition(&self.connection, from, ConnectionState::Authenticated);
            tracing::info!("[Gateway] {} left board {}", self.connection.id(), board_id);
        }
    }

    /// Transport closed: forget every subscription of this connection
    pub fn close(&mut self) {
        if self.state == ConnectionState::Closed {
            return;
        }
        let left = self.registry.drop_connection(self.connection.id());
        let from = std::mem::replace(&mut self.state, ConnectionState::Closed);
        transition(&self.connection, from, ConnectionState::Closed);
        tracing::info!(
            "[Gateway] {} disconnected (left {} board(s))",
            self.connection.id(),
            left
        );
    }
}

impl Drop for GatewaySession {
    fn drop(&mut self) {
        self.close();
    }
}
