//! In-memory document store

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;
use serde_json::{Map, Value};

use super::{matches, Document, DocumentStore, Filter, StoreError};

type Collection = BTreeMap<String, Document>;

/// Process-local store; collections are created on first insert
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in `collection`
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map_or(0, |docs| docs.len())
    }
}

fn document_id(doc: &Document) -> Result<String, StoreError> {
    doc.get("_id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(StoreError::InvalidDocument)
}

fn apply_changes(doc: &mut Document, changes: &Map<String, Value>) -> Result<(), StoreError> {
    let fields = doc.as_object_mut().ok_or(StoreError::InvalidDocument)?;
    for (key, value) in changes {
        // _id is immutable
        if key != "_id" {
            fields.insert(key.clone(), value.clone());
        }
    }
    Ok(())
}

impl DocumentStore for MemoryStore {
    fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read();
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.values()
                    .filter(|doc| matches(doc, filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn insert(&self, collection: &str, doc: Document) -> Result<Document, StoreError> {
        if !doc.is_object() {
            return Err(StoreError::InvalidDocument);
        }
        let id = document_id(&doc)?;

        let mut collections = self.collections.write();
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.contains_key(&id) {
            return Err(StoreError::DuplicateId {
                collection: collection.to_string(),
                id,
            });
        }
        docs.insert(id, doc.clone());
        Ok(doc)
    }

    fn update(
        &self,
        collection: &str,
        id: &str,
        changes: &Map<String, Value>,
    ) -> Result<Option<Document>, StoreError> {
        let mut collections = self.collections.write();
        match collections.get_mut(collection).and_then(|docs| docs.get_mut(id)) {
            Some(doc) => {
                apply_changes(doc, changes)?;
                Ok(Some(doc.clone()))
            }
            None => Ok(None),
        }
    }

    fn update_many(
        &self,
        collection: &str,
        updates: &[(String, Map<String, Value>)],
    ) -> Result<usize, StoreError> {
        let mut collections = self.collections.write();
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };

        let mut changed = 0;
        for (id, changes) in updates {
            if let Some(doc) = docs.get_mut(id) {
                apply_changes(doc, changes)?;
                changed += 1;
            }
        }
        Ok(changed)
    }

    fn delete(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let mut collections = self.collections.write();
        Ok(collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id)))
    }
}
