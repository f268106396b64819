use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A record stored in one collection.
///
/// `Data` is what `add` and `set` write, `Patch` is what `update` writes
/// (usually built from [`Field`](crate::Field)s so untouched fields stay absent).
/// Usually derived with `#[derive(Model)]`.
pub trait Model: DeserializeOwned + Send + Sync + 'static {
    type Data: Serialize + Send + Sync;
    type Patch: Serialize + Send + Sync;

    /// Field the document identifier is exposed under. Never written.
    const ID_FIELD: &'static str = "id";
    const CREATED_AT_FIELD: &'static str = "createdAt";
    const UPDATED_AT_FIELD: &'static str = "updatedAt";

    fn id(&self) -> &str;

    fn created_at(&self) -> Option<DateTime<Utc>>;

    fn updated_at(&self) -> Option<DateTime<Utc>>;
}

/// Payload of a create-or-replace at a caller-chosen id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetDocument<D> {
    pub id: String,
    pub data: D,
}

impl<D> SetDocument<D> {
    pub fn new(id: impl Into<String>, data: D) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

/// Payload of a partial update. Keys of `data` may be dotted field paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateDocument<P> {
    pub id: String,
    pub data: P,
}

impl<P> UpdateDocument<P> {
    pub fn new(id: impl Into<String>, data: P) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

/// Timestamp field shapes the `Model` derive can read from.
#[doc(hidden)]
pub trait ModelDate {
    fn model_date(&self) -> Option<DateTime<Utc>>;
}

impl ModelDate for DateTime<Utc> {
    fn model_date(&self) -> Option<DateTime<Utc>> {
        Some(*self)
    }
}

impl ModelDate for Option<DateTime<Utc>> {
    fn model_date(&self) -> Option<DateTime<Utc>> {
        *self
    }
}

impl ModelDate for crate::Field<DateTime<Utc>> {
    fn model_date(&self) -> Option<DateTime<Utc>> {
        self.as_ref().value().copied()
    }
}
