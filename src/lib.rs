//! Typed repositories over document stores.
//!
//! A [`Repository`] gives CRUD and filtered queries for one collection of a
//! [`DocumentStore`]. Records are converted to and from store documents by the
//! functions in [`convert`]: unset fields are dropped, dates become store
//! timestamps and back, and server-computed [`FieldValue`]s pass through to
//! the store.
//!
//! ## Example
//!
//! ```ignore
//! use document_repo::{Database, InMemoryDocumentStore, Operator, ReadOptions, Repository};
//!
//! let db = Database::new(InMemoryDocumentStore::new());
//! let users = Repository::<User>::new(db, "users");
//!
//! let adults = users
//!     .get_where(("age", Operator::Gte, 18), Some(10), None, ReadOptions::default())
//!     .await?;
//! ```

extern crate self as document_repo;

pub mod config;
pub mod convert;
pub mod error;
#[cfg(feature = "http")]
pub mod http;
pub mod query;
mod repository;
pub mod store;
pub mod value;

pub use config::RepositoryConfig;
pub use error::{ApiError, AppError, DocumentNotFound, RepositoryError};
pub use query::{Direction, Filter, Operator, OrderBy, Query};
pub use repository::{
    Model, ReadOptions, Repository, SetDocument, SetOptions, UpdateDocument, WriteOptions,
};
pub use store::{
    CollectionRef, Database, DocumentSnapshot, DocumentStore, InMemoryDocumentStore, Merge,
    StoreError, StoreErrorCode, StoreErrorInfo,
};
pub use value::{
    date, from_value, to_value, Document, DocumentRef, Field, FieldValue, Numeric, Timestamp,
    Value,
};

pub use document_repo_macros::Model;

#[doc(hidden)]
pub mod __private {
    pub use crate::repository::ModelDate;
    pub use chrono::{DateTime, Utc};
}
