//! Board mutation service
//!
//! Every mutation follows the same order: authorize against the board,
//! commit to the store, write the activity log, then publish a board event.
//! An event is only published for a committed change, and a publish never
//! fails the mutation.
//!
//! Mutations on one board are serialized by a per-board lock held from the
//! first read to the last publish, so a renumbering never works from a stale
//! view of its column and events leave in commit order.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::activity::{ActivityEntry, ActivityLogger};
use crate::error::ServiceError;
use crate::realtime::BoardBroadcaster;
use crate::sequence::{current_index, next_sequence, plan_move, SequencePlan};
use crate::store::{
    filter, from_document, to_document, Document, DocumentStore, StoreError, BOARDS, CARDS,
    COLUMNS, COMMENTS, WORKSPACES,
};
use crate::types::{Board, BoardEvent, BoardId, Card, CardPatch, Column, Comment, Workspace};

type Result<T> = std::result::Result<T, ServiceError>;

/// Card, comment and column mutations for authorized board members
pub struct BoardService {
    store: Arc<dyn DocumentStore>,
    activity: Arc<dyn ActivityLogger>,
    broadcaster: Arc<BoardBroadcaster>,
    board_locks: Mutex<HashMap<BoardId, Arc<Mutex<()>>>>,
}

impl BoardService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        activity: Arc<dyn ActivityLogger>,
        broadcaster: Arc<BoardBroadcaster>,
    ) -> Self {
        Self {
            store,
            activity,
            broadcaster,
            board_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Load the board and check that `actor` may change it.
    ///
    /// A board in a workspace admits the workspace owner and members; a board
    /// without one admits its creator and invited users.
    pub fn authorize(&self, board_id: &str, actor: &str) -> Result<Board> {
        let board: Board = self
            .store
            .find_one(BOARDS, &filter([("_id", board_id)]))?
            .map(from_document)
            .transpose()?
            .ok_or_else(|| ServiceError::not_found(format!("Board {}", board_id)))?;

        let allowed = match &board.workspace_id {
            Some(workspace_id) => self
                .load_workspace(workspace_id)?
                .is_some_and(|workspace| workspace.is_member(actor)),
            None => board.is_member(actor),
        };
        if !allowed {
            tracing::warn!("[Auth] {} may not access board {}", actor, board_id);
            return Err(ServiceError::Forbidden(board_id.to_string()));
        }
        Ok(board)
    }

    /// Create a board owned by `actor`.
    ///
    /// Without a workspace the board goes into the actor's default workspace,
    /// which is created on first use.
    pub fn create_board(&self, name: &str, workspace_id: Option<&str>, actor: &str) -> Result<Board> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::BadRequest("Board name is required".to_string()));
        }

        let workspace = match workspace_id {
            Some(workspace_id) => self
                .load_workspace(workspace_id)?
                .filter(|workspace| workspace.is_member(actor))
                .ok_or_else(|| {
                    tracing::warn!("[Auth] {} may not use workspace {}", actor, workspace_id);
                    ServiceError::Forbidden(workspace_id.to_string())
                })?,
            None => self.default_workspace(actor)?,
        };

        let board = Board::new(uuid::Uuid::new_v4().to_string(), name, actor).in_workspace(workspace.id);
        self.store.insert(BOARDS, to_document(&board)?)?;

        tracing::info!("Board {} created by {}", board.id, actor);
        Ok(board)
    }

    /// Columns of a board ordered by sequence
    pub fn list_columns(&self, board_id: &str, actor: &str) -> Result<Vec<Column>> {
        self.authorize(board_id, actor)?;

        let mut columns: Vec<Column> = self.columns_of(board_id)?;
        columns.sort_by(|a, b| a.sequence.cmp(&b.sequence).then_with(|| a.id.cmp(&b.id)));
        Ok(columns)
    }

    /// Append a column after the board's last column
    pub fn create_column(&self, board_id: &str, name: &str, actor: &str) -> Result<Column> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::BadRequest("Column name is required".to_string()));
        }
        let lock = self.board_lock(board_id);
        let _guard = lock.lock();
        self.authorize(board_id, actor)?;

        let sequence = next_sequence(&self.columns_of(board_id)?);
        let column = Column::new(uuid::Uuid::new_v4().to_string(), board_id, name, sequence);
        self.store.insert(COLUMNS, to_document(&column)?)?;

        self.activity.log(
            ActivityEntry::new(board_id, actor, "column_created", "column", &column.id)
                .with_details(json!({ "columnName": column.name })),
        );
        tracing::info!("Column {} created at #{} on board {}", column.id, sequence, board_id);
        Ok(column)
    }

    /// Append a card after the last card of `column_id`.
    ///
    /// There is no creation event; viewers pick the card up on refetch.
    pub fn create_card(
        &self,
        board_id: &str,
        column_id: &str,
        title: &str,
        description: &str,
        actor: &str,
    ) -> Result<Card> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ServiceError::BadRequest("Card title is required".to_string()));
        }
        let lock = self.board_lock(board_id);
        let _guard = lock.lock();
        self.authorize(board_id, actor)?;
        self.load_column(board_id, column_id)?;

        let sequence = next_sequence(&self.cards_in_column(board_id, column_id)?);
        let mut card = Card::new(uuid::Uuid::new_v4().to_string(), board_id, column_id, sequence, title);
        card.description = description.to_string();
        self.store.insert(CARDS, to_document(&card)?)?;

        self.activity.log(
            ActivityEntry::new(board_id, actor, "card_created", "card", &card.id)
                .with_details(json!({ "title": card.title, "columnId": column_id })),
        );
        tracing::info!("Card {} created in {}#{} on board {}", card.id, column_id, sequence, board_id);
        Ok(card)
    }

    /// Cards of a board ordered by column, then sequence
    pub fn list_cards(&self, board_id: &str, actor: &str) -> Result<Vec<Card>> {
        self.authorize(board_id, actor)?;

        let mut cards: Vec<Card> = decode_all(self.store.find(CARDS, &filter([("boardId", board_id)]))?)?;
        cards.sort_by(|a, b| {
            a.column_id
                .cmp(&b.column_id)
                .then(a.sequence.cmp(&b.sequence))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(cards)
    }

    /// Move a card to `index` within `column_id`, renumbering the cards after it.
    ///
    /// Dropping a card where it already is changes nothing and publishes nothing.
    pub fn move_card(
        &self,
        board_id: &str,
        card_id: &str,
        column_id: &str,
        index: usize,
        actor: &str,
    ) -> Result<Card> {
        let lock = self.board_lock(board_id);
        let _guard = lock.lock();
        self.authorize(board_id, actor)?;
        let mut card = self.load_card(board_id, card_id)?;
        self.load_column(board_id, column_id)?;

        let column_cards = self.cards_in_column(board_id, column_id)?;

        if card.column_id == column_id {
            let last = column_cards.len().saturating_sub(1);
            if current_index(&column_cards, card_id) == Some(index.min(last)) {
                tracing::debug!("Card {} dropped in place, nothing to do", card_id);
                return Ok(card);
            }
        }

        let plan = plan_move(&column_cards, card_id, index);
        let mut updates = sequence_updates(&plan);
        if let Some((_, changes)) = updates.first_mut() {
            changes.insert("columnId".to_string(), Value::from(column_id));
        }
        self.store.update_many(CARDS, &updates)?;

        let old_column_id = std::mem::replace(&mut card.column_id, column_id.to_string());
        card.sequence = plan.moved.sequence;

        self.activity.log(
            ActivityEntry::new(board_id, actor, "card_moved", "card", card_id).with_details(json!({
                "oldColumnId": old_column_id,
                "newColumnId": column_id,
                "sequence": card.sequence,
            })),
        );

        self.broadcaster
            .publish(&BoardEvent::card_moved(board_id, card.clone(), old_column_id, actor));
        for shifted in &plan.shifted {
            self.broadcaster.publish(&BoardEvent::card_updated(
                board_id,
                CardPatch::sequence(shifted.id.clone(), shifted.sequence),
                actor,
            ));
        }

        tracing::info!(
            "Card {} moved to {}#{} on board {} ({} shifted)",
            card_id,
            column_id,
            card.sequence,
            board_id,
            plan.shifted.len()
        );
        Ok(card)
    }

    /// Shallow-merge `patch` into a card
    pub fn update_card(
        &self,
        board_id: &str,
        card_id: &str,
        patch: CardPatch,
        actor: &str,
    ) -> Result<Card> {
        if patch.is_empty() {
            return Err(ServiceError::BadRequest("No card fields to update".to_string()));
        }
        let lock = self.board_lock(board_id);
        let _guard = lock.lock();
        self.authorize(board_id, actor)?;
        self.load_card(board_id, card_id)?;

        let changes = patch.to_changes();
        let stored = self
            .store
            .update(CARDS, card_id, &changes)?
            .ok_or_else(|| ServiceError::not_found(format!("Card {}", card_id)))?;
        let card: Card = from_document(stored)?;

        let fields: Vec<&String> = changes.keys().collect();
        self.activity.log(
            ActivityEntry::new(board_id, actor, "card_updated", "card", card_id)
                .with_details(json!({ "fields": fields })),
        );
        self.broadcaster
            .publish(&BoardEvent::card_updated(board_id, card.clone(), actor));

        Ok(card)
    }

    /// Remove a card and its comments
    pub fn delete_card(&self, board_id: &str, card_id: &str, actor: &str) -> Result<()> {
        let lock = self.board_lock(board_id);
        let _guard = lock.lock();
        self.authorize(board_id, actor)?;
        let card = self.load_card(board_id, card_id)?;

        self.store.delete(CARDS, card_id)?;
        let comments = self.store.find(COMMENTS, &filter([("cardId", card_id)]))?;
        for comment in &comments {
            if let Some(id) = comment.get("_id").and_then(Value::as_str) {
                self.store.delete(COMMENTS, id)?;
            }
        }

        self.activity.log(
            ActivityEntry::new(board_id, actor, "card_deleted", "card", card_id)
                .with_details(json!({ "title": card.title, "columnId": card.column_id })),
        );
        self.broadcaster
            .publish(&BoardEvent::card_deleted(board_id, card_id, actor));

        Ok(())
    }

    /// Post a comment on a card
    pub fn add_comment(
        &self,
        board_id: &str,
        card_id: &str,
        text: &str,
        actor: &str,
    ) -> Result<Comment> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ServiceError::BadRequest("Comment text is required".to_string()));
        }
        let lock = self.board_lock(board_id);
        let _guard = lock.lock();
        self.authorize(board_id, actor)?;
        self.load_card(board_id, card_id)?;

        let comment = Comment {
            id: uuid::Uuid::new_v4().to_string(),
            card_id: card_id.to_string(),
            author_id: actor.to_string(),
            text: text.to_string(),
            timestamp: Utc::now(),
        };
        self.store.insert(COMMENTS, to_document(&comment)?)?;

        self.activity.log(
            ActivityEntry::new(board_id, actor, "comment_added", "comment", &comment.id)
                .with_details(json!({ "cardId": card_id })),
        );
        self.broadcaster
            .publish(&BoardEvent::comment_added(board_id, comment.clone(), actor));

        Ok(comment)
    }

    /// Move a column to `index` among the board's columns.
    ///
    /// There is no column event; clients pick the new order up on refetch.
    pub fn reorder_column(
        &self,
        board_id: &str,
        column_id: &str,
        index: usize,
        actor: &str,
    ) -> Result<Column> {
        let lock = self.board_lock(board_id);
        let _guard = lock.lock();
        self.authorize(board_id, actor)?;

        let columns = self.columns_of(board_id)?;
        let mut column = columns
            .iter()
            .find(|c| c.id == column_id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found(format!("Column {}", column_id)))?;

        let last = columns.len().saturating_sub(1);
        if current_index(&columns, column_id) == Some(index.min(last)) {
            return Ok(column);
        }

        let plan = plan_move(&columns, column_id, index);
        self.store.update_many(COLUMNS, &sequence_updates(&plan))?;
        column.sequence = plan.moved.sequence;

        self.activity.log(
            ActivityEntry::new(board_id, actor, "column_moved", "column", column_id)
                .with_details(json!({ "sequence": column.sequence })),
        );
        tracing::info!(
            "Column {} moved to #{} on board {}",
            column_id,
            column.sequence,
            board_id
        );
        Ok(column)
    }

    /// Lock serializing mutations of one board
    fn board_lock(&self, board_id: &str) -> Arc<Mutex<()>> {
        self.board_locks
            .lock()
            .entry(board_id.to_string())
            .or_default()
            .clone()
    }

    fn load_card(&self, board_id: &str, card_id: &str) -> Result<Card> {
        self.store
            .find_one(CARDS, &filter([("_id", card_id), ("boardId", board_id)]))?
            .map(from_document)
            .transpose()?
            .ok_or_else(|| ServiceError::not_found(format!("Card {}", card_id)))
    }

    fn load_column(&self, board_id: &str, column_id: &str) -> Result<Column> {
        self.store
            .find_one(COLUMNS, &filter([("_id", column_id), ("boardId", board_id)]))?
            .map(from_document)
            .transpose()?
            .ok_or_else(|| ServiceError::not_found(format!("Column {}", column_id)))
    }

    fn load_workspace(&self, workspace_id: &str) -> Result<Option<Workspace>> {
        Ok(self
            .store
            .find_one(WORKSPACES, &filter([("_id", workspace_id)]))?
            .map(from_document)
            .transpose()?)
    }

    fn default_workspace(&self, actor: &str) -> Result<Workspace> {
        let existing = self.store.find_one(
            WORKSPACES,
            &filter([("ownerId", actor), ("name", Workspace::DEFAULT_NAME)]),
        )?;
        if let Some(doc) = existing {
            return Ok(from_document(doc)?);
        }

        let workspace = Workspace::new(
            format!("ws-{}", uuid::Uuid::new_v4()),
            Workspace::DEFAULT_NAME,
            actor,
        );
        self.store.insert(WORKSPACES, to_document(&workspace)?)?;
        tracing::info!("Default workspace {} created for {}", workspace.id, actor);
        Ok(workspace)
    }

    fn columns_of(&self, board_id: &str) -> Result<Vec<Column>> {
        Ok(decode_all(self.store.find(COLUMNS, &filter([("boardId", board_id)]))?)?)
    }

    fn cards_in_column(&self, board_id: &str, column_id: &str) -> Result<Vec<Card>> {
        Ok(decode_all(
            self.store
                .find(CARDS, &filter([("boardId", board_id), ("columnId", column_id)]))?,
        )?)
    }
}

/// One `{sequence}` update per assignment, moved item first
fn sequence_updates(plan: &SequencePlan) -> Vec<(String, Map<String, Value>)> {
    plan.assignments()
        .map(|a| {
            let mut changes = Map::new();
            changes.insert("sequence".to_string(), Value::from(a.sequence));
            (a.id.clone(), changes)
        })
        .collect()
}

fn decode_all<T: DeserializeOwned>(docs: Vec<Document>) -> std::result::Result<Vec<T>, StoreError> {
    docs.into_iter().map(from_document).collect()
}
