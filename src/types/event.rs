//! Board events fanned out to the clients viewing a board
//!
//! Wire envelope:
//!
//! ```json
//! {
//!   "type": "CARD_MOVED",
//!   "boardId": "board-1",
//!   "payload": { "card": {...}, "oldColumnId": "col-1", "newColumnId": "col-2", "userId": "alice" },
//!   "timestamp": "2024-05-01T12:00:00Z"
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BoardId, Card, CardId, CardPatch, ColumnId, Comment, PrincipalId};

/// Every value the envelope's `type` field can take
pub const EVENT_TYPES: [&str; 4] = ["CARD_MOVED", "CARD_UPDATED", "CARD_DELETED", "COMMENT_ADDED"];

/// A card changed column and/or sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardMoved {
    pub card: Card,
    pub old_column_id: ColumnId,
    pub new_column_id: ColumnId,
    pub user_id: PrincipalId,
}

/// Some of a card's fields changed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardUpdated {
    pub card: CardPatch,
    pub user_id: PrincipalId,
}

/// A card was removed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDeleted {
    pub card_id: CardId,
    pub user_id: PrincipalId,
}

/// A comment was posted on a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentAdded {
    pub comment: Comment,
    pub card_id: CardId,
    pub user_id: PrincipalId,
}

/// Variant-specific part of a board event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoardEventKind {
    CardMoved(CardMoved),
    CardUpdated(CardUpdated),
    CardDeleted(CardDeleted),
    CommentAdded(CommentAdded),
}

impl BoardEventKind {
    /// Wire name of the variant
    pub fn type_name(&self) -> &'static str {
        match self {
            BoardEventKind::CardMoved(_) => EVENT_TYPES[0],
            BoardEventKind::CardUpdated(_) => EVENT_TYPES[1],
            BoardEventKind::CardDeleted(_) => EVENT_TYPES[2],
            BoardEventKind::CommentAdded(_) => EVENT_TYPES[3],
        }
    }
}

/// Immutable board mutation record, only ever in transit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardEvent {
    #[serde(flatten)]
    pub kind: BoardEventKind,

    #[serde(rename = "boardId")]
    pub board_id: BoardId,

    /// When the server created the event
    pub timestamp: DateTime<Utc>,
}

impl BoardEvent {
    /// Wrap a payload for `board_id`, stamped now
    pub fn new(board_id: impl Into<BoardId>, kind: BoardEventKind) -> Self {
        Self {
            kind,
            board_id: board_id.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn card_moved(
        board_id: impl Into<BoardId>,
        card: Card,
        old_column_id: impl Into<ColumnId>,
        user_id: impl Into<PrincipalId>,
    ) -> Self {
        let new_column_id = card.column_id.clone();
        Self::new(
            board_id,
            BoardEventKind::CardMoved(CardMoved {
                card,
                old_column_id: old_column_id.into(),
                new_column_id,
                user_id: user_id.into(),
            }),
        )
    }

    pub fn card_updated(
        board_id: impl Into<BoardId>,
        card: impl Into<CardPatch>,
        user_id: impl Into<PrincipalId>,
    ) -> Self {
        Self::new(
            board_id,
            BoardEventKind::CardUpdated(CardUpdated {
                card: card.into(),
                user_id: user_id.into(),
            }),
        )
    }

    pub fn card_deleted(
        board_id: impl Into<BoardId>,
        card_id: impl Into<CardId>,
        user_id: impl Into<PrincipalId>,
    ) -> Self {
        Self::new(
            board_id,
            BoardEventKind::CardDeleted(CardDeleted {
                card_id: card_id.into(),
                user_id: user_id.into(),
            }),
        )
    }

    pub fn comment_added(
        board_id: impl Into<BoardId>,
        comment: Comment,
        user_id: impl Into<PrincipalId>,
    ) -> Self {
        let card_id = comment.card_id.clone();
        Self::new(
            board_id,
            BoardEventKind::CommentAdded(CommentAdded {
                comment,
                card_id,
                user_id: user_id.into(),
            }),
        )
    }

    /// The principal whose action produced the event
    pub fn actor(&self) -> &str {
        match &self.kind {
            BoardEventKind::CardMoved(p) => &p.user_id,
            BoardEventKind::CardUpdated(p) => &p.user_id,
            BoardEventKind::CardDeleted(p) => &p.user_id,
            BoardEventKind::CommentAdded(p) => &p.user_id,
        }
    }

    /// Wire name of the event type
    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }
}
