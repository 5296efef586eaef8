//! InMemoryDocumentStore - HashMap-backed document collection for testing and development.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{Document, DocumentHandle, DocumentStore, Filter, StoreError};
use crate::entity::ID_KEY;

const CREATED_AT_KEY: &str = "createdAt";
const UPDATED_AT_KEY: &str = "updatedAt";

/// Collection configuration for [`InMemoryDocumentStore`].
///
/// Deserializes from camelCase keys, so it can be loaded straight from a
/// JSON config block:
///
/// ```ignore
/// { "collection": "books", "uniqueFields": ["isbn"], "timestamps": true }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreOptions {
    pub collection: String,
    /// Fields backed by a unique index.
    pub unique_fields: Vec<String>,
    /// Maintain `createdAt` / `updatedAt` on every write.
    pub timestamps: bool,
}

impl StoreOptions {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..Self::default()
        }
    }

    /// Declare a unique index on `field`.
    pub fn unique(mut self, field: impl Into<String>) -> Self {
        self.unique_fields.push(field.into());
        self
    }

    pub fn with_timestamps(mut self) -> Self {
        self.timestamps = true;
        self
    }
}

/// Errors raised by the in-memory store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InMemoryStoreError {
    #[error("duplicate key error in {collection}: {field} {value} already exists")]
    DuplicateKey {
        collection: String,
        field: String,
        value: String,
    },
    #[error("no document found in {collection} for id {id}")]
    DocumentNotFound { collection: String, id: String },
    #[error("in-memory store lock poisoned during {0}")]
    LockPoisoned(&'static str),
}

impl StoreError for InMemoryStoreError {
    fn is_uniqueness_conflict(&self) -> bool {
        matches!(self, InMemoryStoreError::DuplicateKey { .. })
    }

    fn conflicting_field(&self) -> Option<&str> {
        match self {
            InMemoryStoreError::DuplicateKey { field, .. } => Some(field),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Storage {
    documents: HashMap<String, Document>,
    /// Insertion order of live document ids.
    order: Vec<String>,
}

/// In-memory document collection.
///
/// Documents are kept without their `id` field, keyed by id, and listed in
/// insertion order. Clone-friendly via Arc.
#[derive(Debug, Clone)]
pub struct InMemoryDocumentStore {
    options: Arc<StoreOptions>,
    storage: Arc<RwLock<Storage>>,
}

impl InMemoryDocumentStore {
    /// Create an empty collection with no unique indexes and no timestamps.
    pub fn new(collection: impl Into<String>) -> Self {
        Self::with_options(StoreOptions::new(collection))
    }

    pub fn with_options(options: StoreOptions) -> Self {
        Self {
            options: Arc::new(options),
            storage: Arc::new(RwLock::new(Storage::default())),
        }
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Number of stored documents.
    pub fn len(&self) -> Result<usize, InMemoryStoreError> {
        Ok(self.read("len")?.documents.len())
    }

    pub fn is_empty(&self) -> Result<bool, InMemoryStoreError> {
        Ok(self.len()? == 0)
    }

    /// Remove every document.
    pub fn clear(&self) -> Result<(), InMemoryStoreError> {
        let mut storage = self.write("clear")?;
        storage.documents.clear();
        storage.order.clear();
        Ok(())
    }

    fn read(&self, operation: &'static str) -> Result<RwLockReadGuard<'_, Storage>, InMemoryStoreError> {
        self.storage
            .read()
            .map_err(|_| InMemoryStoreError::LockPoisoned(operation))
    }

    fn write(
        &self,
        operation: &'static str,
    ) -> Result<RwLockWriteGuard<'_, Storage>, InMemoryStoreError> {
        self.storage
            .write()
            .map_err(|_| InMemoryStoreError::LockPoisoned(operation))
    }

    fn handle(&self, id: &str, fields: Document) -> InMemoryDocument {
        InMemoryDocument {
            store: self.clone(),
            id: id.to_string(),
            fields,
            is_new: false,
        }
    }

    fn generate_id() -> String {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(24);
        id
    }

    /// Write `fields` under `id`, enforcing unique indexes and timestamps.
    /// Returns the stored field bag including the id.
    fn persist(
        &self,
        id: &str,
        mut fields: Document,
        is_new: bool,
    ) -> Result<Document, InMemoryStoreError> {
        fields.remove(ID_KEY);

        let mut storage = self.write("save")?;
        let previous = storage.documents.get(id).cloned();

        match (&previous, is_new) {
            (Some(_), true) => {
                return Err(InMemoryStoreError::DuplicateKey {
                    collection: self.options.collection.clone(),
                    field: ID_KEY.to_string(),
                    value: id.to_string(),
                })
            }
            (None, false) => {
                return Err(InMemoryStoreError::DocumentNotFound {
                    collection: self.options.collection.clone(),
                    id: id.to_string(),
                })
            }
            _ => {}
        }

        self.check_unique(&storage, id, &fields)?;

        if self.options.timestamps {
            let now = Utc::now();
            match &previous {
                None => {
                    let stamp = Value::String(format_timestamp(now));
                    fields.insert(CREATED_AT_KEY.to_string(), stamp.clone());
                    fields.insert(UPDATED_AT_KEY.to_string(), stamp);
                }
                Some(previous) => {
                    if let Some(created) = previous.get(CREATED_AT_KEY) {
                        fields.insert(CREATED_AT_KEY.to_string(), created.clone());
                    }
                    let updated = next_timestamp(previous.get(UPDATED_AT_KEY), now);
                    fields.insert(
                        UPDATED_AT_KEY.to_string(),
                        Value::String(format_timestamp(updated)),
                    );
                }
            }
        }

        if previous.is_none() {
            storage.order.push(id.to_string());
        }
        storage.documents.insert(id.to_string(), fields.clone());

        Ok(with_id(id, fields))
    }

    fn check_unique(
        &self,
        storage: &Storage,
        id: &str,
        fields: &Document,
    ) -> Result<(), InMemoryStoreError> {
        for field in &self.options.unique_fields {
            let Some(value) = fields.get(field).filter(|value| !value.is_null()) else {
                continue;
            };
            let taken = storage
                .documents
                .iter()
                .any(|(other_id, other)| other_id != id && other.get(field) == Some(value));
            if taken {
                return Err(InMemoryStoreError::DuplicateKey {
                    collection: self.options.collection.clone(),
                    field: field.clone(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn with_id(id: &str, mut fields: Document) -> Document {
    fields.insert(ID_KEY.to_string(), Value::String(id.to_string()));
    fields
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// `updatedAt` for a rewrite: now, but always at least one microsecond past
/// the previous value.
fn next_timestamp(previous: Option<&Value>, now: DateTime<Utc>) -> DateTime<Utc> {
    let floor = previous
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|at| at.with_timezone(&Utc) + Duration::microseconds(1));
    match floor {
        Some(floor) if floor > now => floor,
        _ => now,
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    type Error = InMemoryStoreError;
    type Handle = InMemoryDocument;

    fn collection(&self) -> &str {
        &self.options.collection
    }

    async fn find(&self) -> Result<Vec<InMemoryDocument>, InMemoryStoreError> {
        let storage = self.read("find")?;
        Ok(storage
            .order
            .iter()
            .filter_map(|id| {
                storage
                    .documents
                    .get(id)
                    .map(|fields| self.handle(id, fields.clone()))
            })
            .collect())
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<InMemoryDocument>, InMemoryStoreError> {
        let storage = self.read("find_one")?;
        Ok(storage.order.iter().find_map(|id| {
            storage
                .documents
                .get(id)
                .filter(|fields| filter.matches(id, fields))
                .map(|fields| self.handle(id, fields.clone()))
        }))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<InMemoryDocument>, InMemoryStoreError> {
        let storage = self.read("find_by_id")?;
        Ok(storage
            .documents
            .get(id)
            .map(|fields| self.handle(id, fields.clone())))
    }

    async fn create(&self, fields: Document) -> Result<InMemoryDocument, InMemoryStoreError> {
        let id = Self::generate_id();
        let mut stored = self.persist(&id, fields, true)?;
        stored.remove(ID_KEY);
        Ok(self.handle(&id, stored))
    }

    async fn find_by_id_and_delete(&self, id: &str) -> Result<Option<Document>, InMemoryStoreError> {
        let mut storage = self.write("find_by_id_and_delete")?;
        let removed = storage.documents.remove(id);
        if removed.is_some() {
            storage.order.retain(|existing| existing != id);
        }
        Ok(removed.map(|fields| with_id(id, fields)))
    }
}

/// Mutable handle over a document loaded from an [`InMemoryDocumentStore`].
#[derive(Debug, Clone)]
pub struct InMemoryDocument {
    store: InMemoryDocumentStore,
    id: String,
    fields: Document,
    is_new: bool,
}

#[async_trait]
impl DocumentHandle for InMemoryDocument {
    type Error = InMemoryStoreError;

    fn id(&self) -> &str {
        &self.id
    }

    fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    fn set(&mut self, fields: Document) {
        for (field, value) in fields {
            if field != ID_KEY {
                self.fields.insert(field, value);
            }
        }
    }

    fn is_new(&self) -> bool {
        self.is_new
    }

    fn set_is_new(&mut self, is_new: bool) {
        self.is_new = is_new;
    }

    fn to_object(&self) -> Document {
        with_id(&self.id, self.fields.clone())
    }

    async fn save(&mut self) -> Result<Document, InMemoryStoreError> {
        let stored = self.store.persist(&self.id, self.fields.clone(), self.is_new)?;
        self.is_new = false;
        self.fields = stored.clone();
        self.fields.remove(ID_KEY);
        Ok(stored)
    }
}
