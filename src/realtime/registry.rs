//! Board → connections subscription registry
//!
//! Every operation is total: unsubscribing a connection that is not
//! subscribed, or dropping one that never subscribed, is a no-op. A board
//! entry is removed as soon as its last connection leaves, so the map never
//! holds empty sets.

use std::collections::HashMap;

use parking_lot::Mutex;

use super::connection::{Connection, ConnectionId};
use crate::types::BoardId;

/// Live subscriptions of this process
#[derive(Default)]
pub struct ConnectionRegistry {
    boards: Mutex<HashMap<BoardId, Vec<Connection>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `connection` to the board's set. Returns false if already present.
    pub(crate) fn subscribe(&self, connection: &Connection, board_id: &str) -> bool {
        let mut boards = self.boards.lock();
        let subscribers = boards.entry(board_id.to_string()).or_default();

        if subscribers.iter().any(|c| c.id() == connection.id()) {
            return false;
        }
        subscribers.push(connection.clone());
        tracing::debug!(
            "[Registry] {} joined board {} ({} viewing)",
            connection.id(),
            board_id,
            subscribers.len()
        );
        true
    }

    /// Remove the connection from the board's set. Returns false if it was not there.
    pub(crate) fn unsubscribe(&self, connection_id: ConnectionId, board_id: &str) -> bool {
        let mut boards = self.boards.lock();
        let Some(subscribers) = boards.get_mut(board_id) else {
            return false;
        };

        let before = subscribers.len();
        subscribers.retain(|c| c.id() != connection_id);
        let removed = subscribers.len() != before;

        if subscribers.is_empty() {
            boards.remove(board_id);
        }
        if removed {
            tracing::debug!("[Registry] {} left board {}", connection_id, board_id);
        }
        removed
    }

    /// Remove the connection from every board. Returns how many boards it left.
    pub(crate) fn drop_connection(&self, connection_id: ConnectionId) -> usize {
        let mut boards = self.boards.lock();
        let mut left = 0;

        boards.retain(|_, subscribers| {
            let before = subscribers.len();
            subscribers.retain(|c| c.id() != connection_id);
            left += before - subscribers.len();
            !subscribers.is_empty()
        });
        left
    }

    /// Connections currently viewing `board_id`, in join order
    pub fn subscribers_of(&self, board_id: &str) -> Vec<Connection> {
        self.boards
            .lock()
            .get(board_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Run `f` on each subscriber of `board_id` while holding the registry lock.
    ///
    /// Concurrent publishers are serialized here, so every subscriber of a
    /// board observes events in the same order. `f` must not block.
    pub(crate) fn for_each_subscriber<F>(&self, board_id: &str, mut f: F) -> usize
    where
        F: FnMut(&Connection),
    {
        let boards = self.boards.lock();
        match boards.get(board_id) {
            Some(subscribers) => {
                subscribers.iter().for_each(&mut f);
                subscribers.len()
            }
            None => 0,
        }
    }

    /// Boards the connection is subscribed to
    pub fn boards_of(&self, connection_id: ConnectionId) -> Vec<BoardId> {
        self.boards
            .lock()
            .iter()
            .filter(|(_, subscribers)| subscribers.iter().any(|c| c.id() == connection_id))
            .map(|(board_id, _)| board_id.clone())
            .collect()
    }

    /// Whether the registry holds an entry for `board_id`
    pub fn has_board(&self, board_id: &str) -> bool {
        self.boards.lock().contains_key(board_id)
    }

    /// Number of boards with at least one viewer
    pub fn board_count(&self) -> usize {
        self.boards.lock().len()
    }

    /// Number of distinct subscribed connections
    pub fn connection_count(&self) -> usize {
        let boards = self.boards.lock();
        let mut ids: Vec<ConnectionId> = boards
            .values()
            .flat_map(|subscribers| subscribers.iter().map(Connection::id))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }

    /// Forget every subscription, releasing all connection handles
    pub(crate) fn clear(&self) {
        self.boards.lock().clear();
    }
}
