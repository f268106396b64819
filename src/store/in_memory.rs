//! InMemoryDocumentStore - HashMap-backed document store for testing and development.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use uuid::Uuid;

use super::{DocumentSnapshot, DocumentStore, Merge, StoreError};
use crate::query::{lookup, sort_documents, Query};
use crate::value::{Document, FieldValue, Numeric, Timestamp, Value};

#[derive(Default)]
struct State {
    collections: HashMap<String, BTreeMap<String, Document>>,
    last_commit: Option<Timestamp>,
}

impl State {
    /// Commit time for the next write. Strictly increasing so that later writes
    /// always carry later server timestamps.
    fn commit_time(&mut self) -> Timestamp {
        let now = Timestamp::now();
        let commit = match self.last_commit {
            Some(last) if now <= last => last.next(),
            _ => now,
        };
        self.last_commit = Some(commit);
        commit
    }

    fn collection_mut(&mut self, name: &str) -> &mut BTreeMap<String, Document> {
        self.collections.entry(name.to_string()).or_default()
    }
}

/// In-memory document store with the filter, ordering and sentinel semantics
/// of a managed document database.
///
/// Collections are created on first write. Clone-friendly via Arc.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryDocumentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently stored in `collection`.
    pub fn len(&self, collection: &str) -> usize {
        self.read()
            .map(|state| state.collections.get(collection).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    /// The stored body of a document, exactly as persisted.
    pub fn raw(&self, collection: &str, id: &str) -> Option<Document> {
        self.read()
            .ok()?
            .collections
            .get(collection)?
            .get(id)
            .cloned()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::internal("lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::internal("lock poisoned"))
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<DocumentSnapshot, StoreError> {
        let state = self.read()?;
        let data = state
            .collections
            .get(collection)
            .and_then(|documents| documents.get(id))
            .cloned();
        Ok(DocumentSnapshot::new(id, data))
    }

    async fn create(&self, collection: &str, data: Document) -> Result<String, StoreError> {
        let id = Uuid::new_v4().simple().to_string();
        let mut state = self.write()?;
        let now = state.commit_time();
        let body = build_document(data, now)?;

        state.collection_mut(collection).insert(id.clone(), body);
        tracing::trace!(collection, id = %id, "document created");
        Ok(id)
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        data: Document,
        merge: &Merge,
    ) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let now = state.commit_time();
        let existing = state
            .collections
            .get(collection)
            .and_then(|documents| documents.get(id))
            .cloned();

        let body = match merge {
            Merge::None => build_document(data, now)?,
            Merge::All => {
                let mut body = existing.unwrap_or_default();
                merge_into(&mut body, data, now)?;
                body
            }
            Merge::Fields(paths) => {
                let mut body = existing.unwrap_or_default();
                for path in paths {
                    let value = lookup(&data, path).cloned().ok_or_else(|| {
                        StoreError::invalid_argument(format!(
                            "field path {path} is listed in merge fields but not present in data"
                        ))
                    })?;
                    write_path(&mut body, path, value, now)?;
                }
                body
            }
        };

        state.collection_mut(collection).insert(id.to_string(), body);
        tracing::trace!(collection, id, ?merge, "document set");
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, data: Document) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let now = state.commit_time();
        let mut body = state
            .collections
            .get(collection)
            .and_then(|documents| documents.get(id))
            .cloned()
            .ok_or_else(|| {
                StoreError::not_found(format!("No document to update: {collection}/{id}"))
            })?;

        for (path, value) in data {
            write_path(&mut body, &path, value, now)?;
        }

        state.collection_mut(collection).insert(id.to_string(), body);
        tracing::trace!(collection, id, "document updated");
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let removed = state
            .collections
            .get_mut(collection)
            .and_then(|documents| documents.remove(id))
            .is_some();
        tracing::trace!(collection, id, removed, "document deleted");
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        query: &Query,
    ) -> Result<Vec<DocumentSnapshot>, StoreError> {
        let state = self.read()?;
        let mut matching: Vec<(String, Document)> = state
            .collections
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|(_, body)| query.matches(body))
                    .map(|(id, body)| (id.clone(), body.clone()))
                    .collect()
            })
            .unwrap_or_default();

        sort_documents(&mut matching, query.ordering());
        if let Some(limit) = query.max_results() {
            matching.truncate(limit);
        }

        Ok(matching
            .into_iter()
            .map(|(id, body)| DocumentSnapshot::new(id, Some(body)))
            .collect())
    }
}

/// Materialize a full document for create and replace. Delete sentinels are
/// rejected because there is nothing to delete from.
fn build_document(data: Document, now: Timestamp) -> Result<Document, StoreError> {
    let mut body = Document::new();
    for (key, value) in data {
        if let Some(value) = resolve(value, None, now, false)? {
            body.insert(key, value);
        }
    }
    Ok(body)
}

/// Deep merge: nested maps merge key by key, everything else overwrites.
fn merge_into(body: &mut Document, data: Document, now: Timestamp) -> Result<(), StoreError> {
    for (key, value) in data {
        match value {
            Value::Absent => {}
            Value::Map(nested) => {
                let target = body.entry(key).or_insert_with(|| Value::Map(Document::new()));
                if !matches!(target, Value::Map(_)) {
                    *target = Value::Map(Document::new());
                }
                if let Value::Map(target) = target {
                    merge_into(target, nested, now)?;
                }
            }
            value => match resolve(value, body.get(&key), now, true)? {
                Some(resolved) => {
                    body.insert(key, resolved);
                }
                None => {
                    body.remove(&key);
                }
            },
        }
    }
    Ok(())
}

/// Write one dotted field path, creating intermediate maps as needed.
fn write_path(
    body: &mut Document,
    path: &str,
    value: Value,
    now: Timestamp,
) -> Result<(), StoreError> {
    // Absent leaves the field as stored; only delete() removes it.
    if value.is_absent() {
        return Ok(());
    }
    let resolved = resolve(value, lookup(body, path), now, true)?;
    let segments: Vec<&str> = path.split('.').collect();
    let Some((last, parents)) = segments.split_last() else {
        return Err(StoreError::invalid_argument("empty field path"));
    };

    let mut current = body;
    for segment in parents {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Map(Document::new()));
        if !matches!(entry, Value::Map(_)) {
            *entry = Value::Map(Document::new());
        }
        current = match entry {
            Value::Map(map) => map,
            _ => return Err(StoreError::internal("intermediate field is not a map")),
        };
    }

    match resolved {
        Some(value) => {
            current.insert(last.to_string(), value);
        }
        None => {
            current.remove(*last);
        }
    }
    Ok(())
}

/// Resolve sentinels and normalize dates. `Ok(None)` means the field is to be
/// removed (or was never set).
fn resolve(
    value: Value,
    existing: Option<&Value>,
    now: Timestamp,
    allow_delete: bool,
) -> Result<Option<Value>, StoreError> {
    match value {
        Value::Absent => Ok(None),
        Value::Sentinel(FieldValue::ServerTimestamp) => Ok(Some(Value::Timestamp(now))),
        Value::Sentinel(FieldValue::Increment(by)) => Ok(Some(increment(existing, by))),
        Value::Sentinel(FieldValue::Delete) if allow_delete => Ok(None),
        Value::Sentinel(FieldValue::Delete) => Err(StoreError::invalid_argument(
            "delete() can only be used in update or merge writes",
        )),
        Value::Date(date) => Ok(Some(Value::Timestamp(Timestamp::from(date)))),
        Value::Array(items) => items
            .into_iter()
            .map(plain)
            .collect::<Result<Vec<_>, _>>()
            .map(|items| Some(Value::Array(items))),
        Value::Map(map) => {
            let mut out = Document::new();
            for (key, value) in map {
                let existing = existing.and_then(|existing| existing.get(&key));
                if let Some(value) = resolve(value, existing, now, false)? {
                    out.insert(key, value);
                }
            }
            Ok(Some(Value::Map(out)))
        }
        other => Ok(Some(other)),
    }
}

/// Array elements: dates are normalized, sentinels are not allowed.
fn plain(value: Value) -> Result<Value, StoreError> {
    match value {
        Value::Sentinel(sentinel) => Err(StoreError::invalid_argument(format!(
            "{sentinel:?} is not supported inside an array"
        ))),
        Value::Absent => Ok(Value::Null),
        Value::Date(date) => Ok(Value::Timestamp(Timestamp::from(date))),
        Value::Array(items) => items
            .into_iter()
            .map(plain)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Map(map) => map
            .into_iter()
            .filter(|(_, value)| !value.is_absent())
            .map(|(key, value)| plain(value).map(|value| (key, value)))
            .collect::<Result<Document, _>>()
            .map(Value::Map),
        other => Ok(other),
    }
}

fn increment(existing: Option<&Value>, by: Numeric) -> Value {
    match (existing, by) {
        (Some(Value::Integer(current)), Numeric::Integer(by)) => {
            Value::Integer(current.saturating_add(by))
        }
        (Some(Value::Integer(current)), Numeric::Double(by)) => Value::Double(*current as f64 + by),
        (Some(Value::Double(current)), Numeric::Integer(by)) => Value::Double(current + by as f64),
        (Some(Value::Double(current)), Numeric::Double(by)) => Value::Double(current + by),
        (_, Numeric::Integer(by)) => Value::Integer(by),
        (_, Numeric::Double(by)) => Value::Double(by),
    }
}
