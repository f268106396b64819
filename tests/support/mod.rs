#![allow(dead_code)]

pub mod readings;
pub mod users;

use document_repo::{Database, InMemoryDocumentStore};

/// A database handle plus the store behind it, for inspecting raw documents.
pub fn database() -> (Database, InMemoryDocumentStore) {
    let store = InMemoryDocumentStore::new();
    (Database::new(store.clone()), store)
}
