//! Live connection handle
//!
//! A `Connection` is the registry's view of one WebSocket: an identifier, the
//! authenticated principal and the sending half of that socket's outbound
//! queue. The socket task drains the queue, so handing a frame to a
//! connection never waits on the network.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::types::PrincipalId;

/// Unique identifier of a connection
pub type ConnectionId = Uuid;

/// Serialized frame shared by every recipient of one publish
pub type Frame = Arc<str>;

/// Failure to hand a frame to one connection
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DeliveryError {
    #[error("connection {0} is closed")]
    Closed(ConnectionId),
    #[error("connection {0} outbound queue is full")]
    Backlogged(ConnectionId),
}

/// Handle to a live, authenticated connection
#[derive(Clone)]
pub struct Connection {
    id: ConnectionId,
    principal: PrincipalId,
    outbound: mpsc::Sender<Frame>,
}

impl Connection {
    /// Create a connection whose outbound queue holds up to `capacity` frames.
    ///
    /// The returned receiver belongs to the socket writer.
    pub fn new(principal: impl Into<PrincipalId>, capacity: usize) -> (Self, mpsc::Receiver<Frame>) {
        let (outbound, rx) = mpsc::channel(capacity.max(1));
        let connection = Self {
            id: Uuid::new_v4(),
            principal: principal.into(),
            outbound,
        };
        (connection, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn principal(&self) -> &str {
        &self.principal
    }

    /// Queue a frame without waiting
    pub fn deliver(&self, frame: Frame) -> Result<(), DeliveryError> {
        self.outbound.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::Backlogged(self.id),
            TrySendError::Closed(_) => DeliveryError::Closed(self.id),
        })
    }

    /// Whether the socket side has gone away
    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }
}

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Connection {}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("principal", &self.principal)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deliver_reaches_receiver() {
        let (conn, mut rx) = Connection::new("alice", 4);
        conn.deliver(Frame::from("hello")).unwrap();

        assert_eq!(rx.recv().await.as_deref(), Some("hello"));
    }

    #[test]
    fn test_deliver_to_closed_connection() {
        let (conn, rx) = Connection::new("alice", 4);
        drop(rx);

        assert!(conn.is_closed());
        assert_eq!(
            conn.deliver(Frame::from("hello")),
            Err(DeliveryError::Closed(conn.id()))
        );
    }

    #[test]
    fn test_deliver_to_full_queue() {
        let (conn, _rx) = Connection::new("alice", 1);
        conn.deliver(Frame::from("one")).unwrap();

        assert_eq!(
            conn.deliver(Frame::from("two")),
            Err(DeliveryError::Backlogged(conn.id()))
        );
    }
}
