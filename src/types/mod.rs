//! Data types for the board synchronization server
//!
//! This module contains the board records (cards, columns, comments) shared by
//! the server and the client reducer, and the closed set of board events.

mod board;
mod event;

pub use board::{Board, Card, CardPatch, Column, Comment, Workspace};
pub use event::{
    BoardEvent, BoardEventKind, CardDeleted, CardMoved, CardUpdated, CommentAdded, EVENT_TYPES,
};

/// Identifier of a board
pub type BoardId = String;

/// Identifier of a workspace
pub type WorkspaceId = String;

/// Identifier of a column
pub type ColumnId = String;

/// Identifier of a card
pub type CardId = String;

/// Identifier of a comment
pub type CommentId = String;

/// Identifier of an authenticated user
pub type PrincipalId = String;

/// Ordering key of cards within a column and columns within a board
pub type Sequence = u64;
