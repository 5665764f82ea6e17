//! Board, column, card and comment records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{BoardId, CardId, ColumnId, CommentId, PrincipalId, Sequence, WorkspaceId};

/// Field names owned by `Card` itself; never copied from a patch's extra fields
const CARD_FIELDS: [&str; 6] = ["_id", "boardId", "columnId", "sequence", "title", "description"];

/// Board document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    #[serde(rename = "_id")]
    pub id: BoardId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "createdBy")]
    pub created_by: PrincipalId,
    #[serde(default)]
    pub users: Vec<PrincipalId>,
    /// When set, access is decided by the workspace instead of `users`
    #[serde(rename = "workspaceId", default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<WorkspaceId>,
}

impl Board {
    /// Create a board owned by `created_by`
    pub fn new(id: impl Into<BoardId>, name: impl Into<String>, created_by: impl Into<PrincipalId>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            created_by: created_by.into(),
            users: Vec::new(),
            workspace_id: None,
        }
    }

    /// Place the board in a workspace
    pub fn in_workspace(mut self, workspace_id: impl Into<WorkspaceId>) -> Self {
        self.workspace_id = Some(workspace_id.into());
        self
    }

    /// Whether the principal created the board or was invited to it
    pub fn is_member(&self, principal: &str) -> bool {
        self.created_by == principal || self.users.iter().any(|u| u == principal)
    }
}

/// Workspace grouping boards under one owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    #[serde(rename = "_id")]
    pub id: WorkspaceId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "ownerId")]
    pub owner_id: PrincipalId,
    #[serde(default)]
    pub members: Vec<PrincipalId>,
}

impl Workspace {
    /// Name given to the workspace created for a user's first board
    pub const DEFAULT_NAME: &'static str = "My Workspace";

    pub fn new(id: impl Into<WorkspaceId>, name: impl Into<String>, owner_id: impl Into<PrincipalId>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            owner_id: owner_id.into(),
            members: Vec::new(),
        }
    }

    pub fn is_member(&self, principal: &str) -> bool {
        self.owner_id == principal || self.members.iter().any(|m| m == principal)
    }
}

/// Column within a board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    #[serde(rename = "_id")]
    pub id: ColumnId,
    #[serde(rename = "boardId")]
    pub board_id: BoardId,
    #[serde(rename = "columnName", default)]
    pub name: String,
    #[serde(default)]
    pub sequence: Sequence,
}

impl Column {
    pub fn new(
        id: impl Into<ColumnId>,
        board_id: impl Into<BoardId>,
        name: impl Into<String>,
        sequence: Sequence,
    ) -> Self {
        Self {
            id: id.into(),
            board_id: board_id.into(),
            name: name.into(),
            sequence,
        }
    }
}

/// Card within a column
///
/// Fields the server does not interpret (labels, assignees, dates) are kept
/// in `extra` and round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    #[serde(rename = "_id")]
    pub id: CardId,
    #[serde(rename = "boardId", default)]
    pub board_id: BoardId,
    #[serde(rename = "columnId")]
    pub column_id: ColumnId,
    #[serde(default)]
    pub sequence: Sequence,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Card {
    /// Create a card with no description or extra fields
    pub fn new(
        id: impl Into<CardId>,
        board_id: impl Into<BoardId>,
        column_id: impl Into<ColumnId>,
        sequence: Sequence,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            board_id: board_id.into(),
            column_id: column_id.into(),
            sequence,
            title: title.into(),
            description: String::new(),
            extra: Map::new(),
        }
    }

    /// Shallow-merge the fields present in `patch` into this card.
    ///
    /// The identifier and board are never changed by a patch.
    pub fn merge(&mut self, patch: &CardPatch) {
        if let Some(column_id) = &patch.column_id {
            self.column_id = column_id.clone();
        }
        if let Some(sequence) = patch.sequence {
            self.sequence = sequence;
        }
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        for (key, value) in patch.changed_extra() {
            self.extra.insert(key.clone(), value.clone());
        }
    }
}

/// Partial card carried by update events and PATCH requests
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardPatch {
    #[serde(rename = "_id", default)]
    pub id: CardId,
    #[serde(rename = "columnId", default, skip_serializing_if = "Option::is_none")]
    pub column_id: Option<ColumnId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<Sequence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CardPatch {
    /// Patch that only reassigns a card's sequence
    pub fn sequence(id: impl Into<CardId>, sequence: Sequence) -> Self {
        Self {
            id: id.into(),
            sequence: Some(sequence),
            ..Self::default()
        }
    }

    /// Extra fields, minus any that shadow a named card field
    pub fn changed_extra(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.extra
            .iter()
            .filter(|(key, _)| !CARD_FIELDS.contains(&key.as_str()))
    }

    /// Whether applying this patch would change nothing
    pub fn is_empty(&self) -> bool {
        self.column_id.is_none()
            && self.sequence.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.changed_extra().next().is_none()
    }

    /// Field changes as a document fragment, for a store update
    pub fn to_changes(&self) -> Map<String, Value> {
        let mut changes = Map::new();
        if let Some(column_id) = &self.column_id {
            changes.insert("columnId".to_string(), Value::from(column_id.clone()));
        }
        if let Some(sequence) = self.sequence {
            changes.insert("sequence".to_string(), Value::from(sequence));
        }
        if let Some(title) = &self.title {
            changes.insert("title".to_string(), Value::from(title.clone()));
        }
        if let Some(description) = &self.description {
            changes.insert("description".to_string(), Value::from(description.clone()));
        }
        for (key, value) in self.changed_extra() {
            changes.insert(key.clone(), value.clone());
        }
        changes
    }
}

impl From<Card> for CardPatch {
    fn from(card: Card) -> Self {
        Self {
            id: card.id,
            column_id: Some(card.column_id),
            sequence: Some(card.sequence),
            title: Some(card.title),
            description: Some(card.description),
            extra: card.extra,
        }
    }
}

/// Comment on a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: CommentId,
    #[serde(rename = "cardId")]
    pub card_id: CardId,
    #[serde(rename = "authorId")]
    pub author_id: PrincipalId,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}
