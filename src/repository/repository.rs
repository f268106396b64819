use std::fmt;
use std::marker::PhantomData;

use futures::future::try_join_all;
use serde::Serialize;

use super::model::{Model, SetDocument, UpdateDocument};
use super::options::{ReadOptions, SetOptions, WriteOptions};
use crate::config::RepositoryConfig;
use crate::convert::{from_document, of_document_snapshot, to_store_format, ID_FIELD};
use crate::error::{DocumentNotFound, RepositoryError};
use crate::query::{Filter, OrderBy, Query};
use crate::store::{CollectionRef, Database, DocumentSnapshot, Merge};
use crate::value::{self, to_value, Document, DocumentRef, FieldValue, Value};

/// Typed CRUD and queries over one collection.
///
/// The repository holds the collection name and its timestamp default. Each
/// operation resolves the store currently behind the [`Database`] handle, so a
/// replaced store is used from the next call on.
pub struct Repository<M> {
    db: Database,
    collection_name: String,
    timestamps: bool,
    _marker: PhantomData<fn() -> M>,
}

impl<M> Clone for Repository<M> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            collection_name: self.collection_name.clone(),
            timestamps: self.timestamps,
            _marker: PhantomData,
        }
    }
}

impl<M> fmt::Debug for Repository<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("collection_name", &self.collection_name)
            .field("timestamps", &self.timestamps)
            .finish()
    }
}

impl<M: Model> Repository<M> {
    pub fn new(db: Database, collection_name: impl Into<String>) -> Self {
        Self {
            db,
            collection_name: collection_name.into(),
            timestamps: true,
            _marker: PhantomData,
        }
    }

    /// Collection and timestamp default taken from the host's settings.
    pub fn from_config(db: Database, config: &RepositoryConfig) -> Self {
        Self::new(db, config.collection.clone()).with_timestamps(config.timestamps)
    }

    pub fn with_timestamps(mut self, timestamps: bool) -> Self {
        self.timestamps = timestamps;
        self
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// Read options carrying this repository's timestamp default.
    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            timestamps: self.timestamps,
        }
    }

    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            timestamps: self.timestamps,
        }
    }

    pub fn set_options(&self) -> SetOptions {
        SetOptions::from(self.write_options())
    }

    /// Resolve the collection against the live store.
    pub fn collection(&self) -> Result<CollectionRef, RepositoryError> {
        Ok(self.db.collection(&self.collection_name)?)
    }

    /// Reference to a document of this collection, for storing in other documents.
    pub fn doc_ref(&self, id: &str) -> DocumentRef {
        DocumentRef::from_parts(&self.collection_name, id)
    }

    /// Create a document under a store-generated id and return the id.
    pub async fn add(&self, data: &M::Data, options: WriteOptions) -> Result<String, RepositoryError> {
        let mut document = encode::<M, _>(data)?;
        if options.timestamps {
            stamp_created::<M>(&mut document);
        }

        let id = self.collection()?.add(document).await?;
        tracing::debug!(collection = %self.collection_name, id = %id, "document added");
        Ok(id)
    }

    /// Partially update an existing document. A missing document is reported
    /// by the store and returned unchanged.
    pub async fn update(
        &self,
        payload: &UpdateDocument<M::Patch>,
        options: WriteOptions,
    ) -> Result<(), RepositoryError> {
        let mut document = encode::<M, _>(&payload.data)?;
        if options.timestamps {
            document.remove(M::CREATED_AT_FIELD);
            document.insert(
                M::UPDATED_AT_FIELD.to_string(),
                Value::Sentinel(FieldValue::ServerTimestamp),
            );
        }

        self.collection()?.update(&payload.id, document).await?;
        tracing::debug!(collection = %self.collection_name, id = %payload.id, "document updated");
        Ok(())
    }

    /// Create or replace the document at `payload.id`, or merge into it.
    pub async fn set(
        &self,
        payload: &SetDocument<M::Data>,
        options: SetOptions,
    ) -> Result<(), RepositoryError> {
        let mut document = encode::<M, _>(&payload.data)?;
        if options.timestamps {
            stamp_created::<M>(&mut document);
        }

        self.collection()?
            .set(&payload.id, document, &options.merge)
            .await?;
        tracing::debug!(
            collection = %self.collection_name,
            id = %payload.id,
            merge = options.merge != Merge::None,
            "document set"
        );
        Ok(())
    }

    /// Remove a document. Removing a missing document succeeds.
    pub async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        self.collection()?.delete(id).await?;
        tracing::debug!(collection = %self.collection_name, id, "document deleted");
        Ok(())
    }

    pub async fn get_by_id(&self, id: &str, options: ReadOptions) -> Result<M, RepositoryError> {
        let collection = self.collection()?;
        fetch::<M>(&collection, id, options).await
    }

    /// Fetch every id concurrently. The result follows the order of `ids`; if any
    /// document is missing the whole call fails with [`DocumentNotFound`].
    pub async fn get_by_ids<S: AsRef<str>>(
        &self,
        ids: &[S],
        options: ReadOptions,
    ) -> Result<Vec<M>, RepositoryError> {
        let collection = self.collection()?;
        let records = try_join_all(
            ids.iter()
                .map(|id| fetch::<M>(&collection, id.as_ref(), options)),
        )
        .await?;

        tracing::debug!(collection = %self.collection_name, count = records.len(), "documents fetched by id");
        Ok(records)
    }

    pub async fn get_all(&self, options: ReadOptions) -> Result<Vec<M>, RepositoryError> {
        self.get_docs(&Query::new(), options).await
    }

    /// Records matching one filter. No match is an empty list, not an error.
    pub async fn get_where(
        &self,
        filter: impl Into<Filter>,
        limit: Option<usize>,
        order_by: Option<OrderBy>,
        options: ReadOptions,
    ) -> Result<Vec<M>, RepositoryError> {
        let query = Query::new()
            .filter(filter)
            .with_order(order_by)
            .with_limit(limit);
        self.get_docs(&query, options).await
    }

    /// Records matching every filter. No match is an empty list, not an error.
    pub async fn get_where_many<I>(
        &self,
        filters: I,
        limit: Option<usize>,
        order_by: Option<OrderBy>,
        options: ReadOptions,
    ) -> Result<Vec<M>, RepositoryError>
    where
        I: IntoIterator,
        I::Item: Into<Filter>,
    {
        let query = Query::new()
            .filters(filters)
            .with_order(order_by)
            .with_limit(limit);
        self.get_docs(&query, options).await
    }

    pub async fn get_one_where(
        &self,
        filter: impl Into<Filter>,
        order_by: Option<OrderBy>,
        options: ReadOptions,
    ) -> Result<Option<M>, RepositoryError> {
        let records = self.get_where(filter, Some(1), order_by, options).await?;
        Ok(records.into_iter().next())
    }

    pub async fn get_one_where_many<I>(
        &self,
        filters: I,
        order_by: Option<OrderBy>,
        options: ReadOptions,
    ) -> Result<Option<M>, RepositoryError>
    where
        I: IntoIterator,
        I::Item: Into<Filter>,
    {
        let records = self
            .get_where_many(filters, Some(1), order_by, options)
            .await?;
        Ok(records.into_iter().next())
    }

    /// Run an arbitrary query and decode every result.
    pub async fn get_docs(&self, query: &Query, options: ReadOptions) -> Result<Vec<M>, RepositoryError> {
        let snapshots = self.collection()?.query(query).await?;
        let records = snapshots
            .into_iter()
            .map(|snapshot| decode::<M>(snapshot, options))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            collection = %self.collection_name,
            filters = query.filter_list().len(),
            count = records.len(),
            "query executed"
        );
        Ok(records)
    }
}

/// Serialize a payload into a write body without the identifier field.
fn encode<M: Model, T: Serialize>(payload: &T) -> Result<Document, RepositoryError> {
    match to_store_format(to_value(payload)?) {
        Value::Map(mut document) => {
            document.remove(M::ID_FIELD);
            Ok(document)
        }
        other => Err(RepositoryError::Encode(value::Error::Custom(format!(
            "payload must serialize to a map, got {}",
            other.kind()
        )))),
    }
}

fn stamp_created<M: Model>(document: &mut Document) {
    document.insert(
        M::CREATED_AT_FIELD.to_string(),
        Value::Sentinel(FieldValue::ServerTimestamp),
    );
    document.insert(M::UPDATED_AT_FIELD.to_string(), Value::Null);
}

async fn fetch<M: Model>(
    collection: &CollectionRef,
    id: &str,
    options: ReadOptions,
) -> Result<M, RepositoryError> {
    let snapshot = collection.get(id).await?;
    if !snapshot.exists() {
        tracing::debug!(collection = collection.name(), id, "document not found");
        return Err(DocumentNotFound::new(id).into());
    }
    decode::<M>(snapshot, options)
}

fn decode<M: Model>(snapshot: DocumentSnapshot, options: ReadOptions) -> Result<M, RepositoryError> {
    let id = snapshot.id().to_string();
    let mut document = of_document_snapshot(snapshot, options.timestamps);
    if M::ID_FIELD != ID_FIELD {
        if let Some(value) = document.remove(ID_FIELD) {
            document.insert(M::ID_FIELD.to_string(), value);
        }
    }
    from_document(document).map_err(|source| RepositoryError::Decode { id, source })
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use serde::Deserialize;

    use super::*;
    use crate::Field;

    #[derive(Debug, Deserialize)]
    struct Note {
        #[serde(rename = "noteId")]
        note_id: String,
        text: String,
    }

    #[derive(Serialize)]
    struct NoteData {
        #[serde(rename = "noteId")]
        note_id: Field<String>,
        text: String,
    }

    impl Model for Note {
        type Data = NoteData;
        type Patch = NoteData;

        const ID_FIELD: &'static str = "noteId";

        fn id(&self) -> &str {
            &self.note_id
        }

        fn created_at(&self) -> Option<DateTime<Utc>> {
            None
        }

        fn updated_at(&self) -> Option<DateTime<Utc>> {
            None
        }
    }

    #[test]
    fn encode_strips_the_configured_id_field() {
        let data = NoteData {
            note_id: Field::Value("n1".into()),
            text: "hello".into(),
        };
        let document = encode::<Note, _>(&data).unwrap();
        assert!(!document.contains_key("noteId"));
        assert_eq!(document.get("text"), Some(&Value::from("hello")));
    }

    #[test]
    fn encode_rejects_non_map_payloads() {
        let err = encode::<Note, _>(&vec![1, 2]).unwrap_err();
        assert!(matches!(err, RepositoryError::Encode(_)));
    }

    #[test]
    fn decode_exposes_the_id_under_the_configured_field() {
        let mut data = Document::new();
        data.insert("text".into(), Value::from("hello"));
        let note: Note = decode(DocumentSnapshot::new("n1", Some(data)), ReadOptions::default()).unwrap();
        assert_eq!(note.id(), "n1");
        assert_eq!(note.text, "hello");
    }
}
