//! Local board state kept in step with pushed board events
//!
//! Applying an event leaves the state it would have after a refetch, so the
//! same event may be applied twice, or after a refetch that already saw it,
//! without changing the result. Events about cards this state does not hold
//! are skipped; the next refetch picks those cards up.

use std::collections::{BTreeMap, HashMap};

use crate::types::{BoardEvent, BoardEventKind, BoardId, Card, CardId, Comment};

/// What applying one event did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// State now reflects the event
    Applied,
    /// The event refers to a card (or comment list) this state does not hold
    Stale,
    /// The event belongs to another board
    OtherBoard,
    /// The frame was not a board event (control frame or garbage)
    NotAnEvent,
}

/// Client-side copy of one board
#[derive(Debug, Clone, PartialEq)]
pub struct BoardState {
    board_id: BoardId,
    cards: BTreeMap<CardId, Card>,
    comments: HashMap<CardId, Vec<Comment>>,
}

impl BoardState {
    pub fn new(board_id: impl Into<BoardId>) -> Self {
        Self {
            board_id: board_id.into(),
            cards: BTreeMap::new(),
            comments: HashMap::new(),
        }
    }

    pub fn board_id(&self) -> &str {
        &self.board_id
    }

    /// Replace every card with the result of a full refetch
    pub fn replace_cards(&mut self, cards: impl IntoIterator<Item = Card>) {
        self.cards = cards
            .into_iter()
            .filter(|card| card.board_id.is_empty() || card.board_id == self.board_id)
            .map(|card| (card.id.clone(), card))
            .collect();
        self.comments.retain(|card_id, _| self.cards.contains_key(card_id));
    }

    /// Start tracking the comments of a card, seeded with what was fetched
    pub fn track_comments(&mut self, card_id: impl Into<CardId>, comments: Vec<Comment>) {
        self.comments.insert(card_id.into(), comments);
    }

    pub fn card(&self, card_id: &str) -> Option<&Card> {
        self.cards.get(card_id)
    }

    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.cards.values()
    }

    /// Tracked comments of a card, oldest first
    pub fn comments(&self, card_id: &str) -> Option<&[Comment]> {
        self.comments.get(card_id).map(Vec::as_slice)
    }

    /// Cards of one column in display order
    pub fn cards_in_column(&self, column_id: &str) -> Vec<&Card> {
        let mut cards: Vec<&Card> = self
            .cards
            .values()
            .filter(|card| card.column_id == column_id)
            .collect();
        cards.sort_by(|a, b| a.sequence.cmp(&b.sequence).then_with(|| a.id.cmp(&b.id)));
        cards
    }

    /// Parse a text frame and apply it if it is a board event
    pub fn apply_frame(&mut self, frame: &str) -> ApplyOutcome {
        match serde_json::from_str::<BoardEvent>(frame) {
            Ok(event) => self.apply(&event),
            Err(e) => {
                tracing::debug!("Skipping non-event frame: {}", e);
                ApplyOutcome::NotAnEvent
            }
        }
    }

    /// Apply one board event
    pub fn apply(&mut self, event: &BoardEvent) -> ApplyOutcome {
        if event.board_id != self.board_id {
            return ApplyOutcome::OtherBoard;
        }

        match &event.kind {
            BoardEventKind::CardMoved(moved) => match self.cards.get_mut(&moved.card.id) {
                Some(card) => {
                    card.column_id = moved.new_column_id.clone();
                    card.sequence = moved.card.sequence;
                    ApplyOutcome::Applied
                }
                None => ApplyOutcome::Stale,
            },
            BoardEventKind::CardUpdated(updated) => match self.cards.get_mut(&updated.card.id) {
                Some(card) => {
                    card.merge(&updated.card);
                    ApplyOutcome::Applied
                }
                None => ApplyOutcome::Stale,
            },
            BoardEventKind::CardDeleted(deleted) => {
                self.comments.remove(&deleted.card_id);
                match self.cards.remove(&deleted.card_id) {
                    Some(_) => ApplyOutcome::Applied,
                    None => ApplyOutcome::Stale,
                }
            }
            BoardEventKind::CommentAdded(added) => match self.comments.get_mut(&added.card_id) {
                Some(comments) => {
                    if !comments.iter().any(|c| c.id == added.comment.id) {
                        comments.push(added.comment.clone());
                    }
                    ApplyOutcome::Applied
                }
                None => ApplyOutcome::Stale,
            },
        }
    }
}
