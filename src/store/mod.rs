//! Document store used by the board mutation service
//!
//! The store is a set of named collections of JSON documents keyed by their
//! `_id` field. Queries are equality filters on top-level fields. Mutations
//! are committed before any board event about them is published.

mod memory;

pub use memory::MemoryStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Collection holding boards
pub const BOARDS: &str = "boards";
/// Collection holding workspaces
pub const WORKSPACES: &str = "workspaces";
/// Collection holding columns
pub const COLUMNS: &str = "columns";
/// Collection holding cards
pub const CARDS: &str = "cards";
/// Collection holding comments
pub const COMMENTS: &str = "comments";
/// Collection holding activity log entries
pub const ACTIVITY_LOG: &str = "activityLog";

/// A stored document
pub type Document = Value;

/// Equality filter over top-level document fields
pub type Filter = Map<String, Value>;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document must be a JSON object with a string _id")]
    InvalidDocument,
    #[error("Duplicate _id '{id}' in collection '{collection}'")]
    DuplicateId { collection: String, id: String },
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Build an equality filter from field/value pairs
pub fn filter<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Filter {
    pairs
        .into_iter()
        .map(|(field, value)| (field.to_string(), Value::from(value)))
        .collect()
}

/// Whether `doc` matches every field in `filter`
pub fn matches(doc: &Document, filter: &Filter) -> bool {
    filter
        .iter()
        .all(|(field, expected)| doc.get(field) == Some(expected))
}

/// Find/insert/update/delete over named collections
pub trait DocumentStore: Send + Sync {
    /// All documents in `collection` matching `filter`
    fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError>;

    /// Insert a document; it must carry a string `_id`
    fn insert(&self, collection: &str, doc: Document) -> Result<Document, StoreError>;

    /// Set `changes` on the document with `id`; `None` if no such document
    fn update(
        &self,
        collection: &str,
        id: &str,
        changes: &Map<String, Value>,
    ) -> Result<Option<Document>, StoreError>;

    /// Apply several updates as one batch; returns how many documents changed
    fn update_many(
        &self,
        collection: &str,
        updates: &[(String, Map<String, Value>)],
    ) -> Result<usize, StoreError>;

    /// Remove the document with `id`, returning it if it existed
    fn delete(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// First document matching `filter`
    fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>, StoreError> {
        Ok(self.find(collection, filter)?.into_iter().next())
    }
}

/// Decode a stored document into a typed record
pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T, StoreError> {
    Ok(serde_json::from_value(doc)?)
}

/// Encode a typed record as a document
pub fn to_document<T: Serialize>(record: &T) -> Result<Document, StoreError> {
    Ok(serde_json::to_value(record)?)
}
