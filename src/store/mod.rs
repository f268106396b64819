//! Store boundary - what a document database must offer the repositories.
//!
//! Any backend implementing [`DocumentStore`] can sit behind a [`Database`]
//! handle: a managed NoSQL service client, a key-value store with document
//! semantics, or the bundled [`InMemoryDocumentStore`].
//!
//! ## Example
//!
//! ```ignore
//! use document_repo::{Database, InMemoryDocumentStore};
//!
//! let db = Database::new(InMemoryDocumentStore::new());
//! let users = db.collection("users")?;
//! let id = users.add(document).await?;
//! ```

mod in_memory;

use std::fmt;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::query::Query;
use crate::value::Document;

pub use in_memory::InMemoryDocumentStore;

/// A read of one document. `data` is `None` when nothing is stored at the id.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    id: String,
    data: Option<Document>,
}

impl DocumentSnapshot {
    pub fn new(id: impl Into<String>, data: Option<Document>) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    pub fn missing(id: impl Into<String>) -> Self {
        Self::new(id, None)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn exists(&self) -> bool {
        self.data.is_some()
    }

    pub fn data(&self) -> Option<&Document> {
        self.data.as_ref()
    }

    pub fn into_parts(self) -> (String, Option<Document>) {
        (self.id, self.data)
    }
}

/// How a `set` combines with an existing document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Merge {
    /// Replace the whole document.
    #[default]
    None,
    /// Deep-merge the written fields into the existing document.
    All,
    /// Only write the listed field paths; other written fields are ignored.
    Fields(Vec<String>),
}

/// Failure categories reported by a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreErrorCode {
    NotFound,
    AlreadyExists,
    InvalidArgument,
    FailedPrecondition,
    PermissionDenied,
    Unavailable,
    Internal,
}

impl StoreErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreErrorCode::NotFound => "not-found",
            StoreErrorCode::AlreadyExists => "already-exists",
            StoreErrorCode::InvalidArgument => "invalid-argument",
            StoreErrorCode::FailedPrecondition => "failed-precondition",
            StoreErrorCode::PermissionDenied => "permission-denied",
            StoreErrorCode::Unavailable => "unavailable",
            StoreErrorCode::Internal => "internal",
        }
    }
}

impl fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error reported by the store itself (transport, permission, missing document
/// on update...). Repositories pass it through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("store/{code}: {message}")]
pub struct StoreError {
    pub code: StoreErrorCode,
    pub message: String,
}

/// `{code, message}` body describing a [`StoreError`] to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreErrorInfo {
    pub code: String,
    pub message: String,
}

impl StoreError {
    pub fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::NotFound, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::InvalidArgument, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::Internal, message)
    }

    pub fn error_info(&self) -> StoreErrorInfo {
        StoreErrorInfo {
            code: format!("store/{}", self.code),
            message: self.message.clone(),
        }
    }
}

/// Abstract document storage addressed by collection name and document id.
///
/// Writes may carry [`FieldValue`](crate::FieldValue) sentinels that the store
/// resolves at commit time. Implementations own retries and connection
/// lifecycle; callers never retry.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read one document. A missing document is a snapshot without data, not an error.
    async fn get(&self, collection: &str, id: &str) -> Result<DocumentSnapshot, StoreError>;

    /// Create a document under a store-generated id and return that id.
    async fn create(&self, collection: &str, data: Document) -> Result<String, StoreError>;

    /// Create or overwrite the document at `id`, or merge into it.
    async fn set(
        &self,
        collection: &str,
        id: &str,
        data: Document,
        merge: &Merge,
    ) -> Result<(), StoreError>;

    /// Apply field-path updates to an existing document. Fails with
    /// [`StoreErrorCode::NotFound`] when nothing is stored at `id`.
    async fn update(&self, collection: &str, id: &str, data: Document) -> Result<(), StoreError>;

    /// Remove the document at `id`. Removing a missing document succeeds.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Run a filtered, ordered, limited read over one collection.
    async fn query(&self, collection: &str, query: &Query)
        -> Result<Vec<DocumentSnapshot>, StoreError>;
}

/// Shared handle to the current store.
///
/// Clones share the same slot, so [`Database::replace`] is seen by every
/// repository on its next operation.
#[derive(Clone)]
pub struct Database {
    store: Arc<RwLock<Arc<dyn DocumentStore>>>,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    pub fn new<S: DocumentStore + 'static>(store: S) -> Self {
        Self::from_arc(Arc::new(store))
    }

    pub fn from_arc(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
        }
    }

    /// The store currently in use.
    pub fn store(&self) -> Result<Arc<dyn DocumentStore>, StoreError> {
        self.store
            .read()
            .map(|store| Arc::clone(&*store))
            .map_err(|_| StoreError::internal("database handle lock poisoned"))
    }

    /// Swap the underlying store. In-flight operations keep the store they resolved.
    pub fn replace<S: DocumentStore + 'static>(&self, store: S) -> Result<(), StoreError> {
        let mut slot = self
            .store
            .write()
            .map_err(|_| StoreError::internal("database handle lock poisoned"))?;
        *slot = Arc::new(store);
        tracing::debug!("database store replaced");
        Ok(())
    }

    /// Resolve a collection against the current store.
    pub fn collection(&self, name: &str) -> Result<CollectionRef, StoreError> {
        Ok(CollectionRef {
            store: self.store()?,
            name: name.to_string(),
        })
    }
}

/// A collection bound to the store that was current when it was resolved.
#[derive(Clone)]
pub struct CollectionRef {
    store: Arc<dyn DocumentStore>,
    name: String,
}

impl fmt::Debug for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionRef")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl CollectionRef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn get(&self, id: &str) -> Result<DocumentSnapshot, StoreError> {
        self.store.get(&self.name, id).await
    }

    pub async fn add(&self, data: Document) -> Result<String, StoreError> {
        self.store.create(&self.name, data).await
    }

    pub async fn set(&self, id: &str, data: Document, merge: &Merge) -> Result<(), StoreError> {
        self.store.set(&self.name, id, data, merge).await
    }

    pub async fn update(&self, id: &str, data: Document) -> Result<(), StoreError> {
        self.store.update(&self.name, id, data).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete(&self.name, id).await
    }

    pub async fn query(&self, query: &Query) -> Result<Vec<DocumentSnapshot>, StoreError> {
        self.store.query(&self.name, query).await
    }
}
