//! Repository Base - typed, per-collection CRUD and queries.
//!
//! ## Example
//!
//! ```ignore
//! use document_repo::{Database, InMemoryDocumentStore, Model, ReadOptions, Repository, WriteOptions};
//!
//! #[derive(Deserialize, Model)]
//! #[model(data = UserData, patch = UserPatch)]
//! #[serde(rename_all = "camelCase")]
//! struct User {
//!     id: String,
//!     name: String,
//!     #[serde(default, with = "document_repo::date::option")]
//!     created_at: Option<DateTime<Utc>>,
//!     #[serde(default, with = "document_repo::date::option")]
//!     updated_at: Option<DateTime<Utc>>,
//! }
//!
//! let users = Repository::<User>::new(Database::new(InMemoryDocumentStore::new()), "users");
//! let id = users.add(&UserData { name: "Ana".into() }, WriteOptions::default()).await?;
//! let user = users.get_by_id(&id, ReadOptions::default()).await?;
//! ```

mod model;
mod options;
mod repository;

pub use model::{Model, ModelDate, SetDocument, UpdateDocument};
pub use options::{ReadOptions, SetOptions, WriteOptions};
pub use repository::Repository;
