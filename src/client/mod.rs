//! Client side of board sync
//!
//! A client joins a board over the WebSocket, feeds every text frame it
//! receives to [`BoardState::apply_frame`], and refetches the board's cards
//! through the REST API whenever it (re)connects.

mod reducer;

pub use reducer::{ApplyOutcome, BoardState};
