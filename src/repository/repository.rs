use serde_json::Value;
use tracing::{debug, warn};

use super::error::{RepositoryError, RepositoryResult};
use super::payload::{PartialUpdate, Payload, Record};
use super::registry::ConstructorRegistry;
use crate::entity::{DEFAULT_DISCRIMINATOR, DISCRIMINATOR_KEY, ID_KEY};
use crate::store::{Document, DocumentHandle, DocumentStore, Filter, StoreError};

/// Polymorphic repository over a single document collection.
///
/// `T` is the family type every stored document is reconstructed into,
/// usually an enum with one variant per concrete record type. The registry
/// decides which variant a document becomes based on its discriminator tag.
pub struct Repository<T, S> {
    store: S,
    registry: ConstructorRegistry<T>,
}

impl<T, S: Clone> Clone for Repository<T, S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            registry: self.registry.clone(),
        }
    }
}

impl<T, S> Repository<T, S>
where
    S: DocumentStore,
{
    /// Create a repository over `store`, reconstructing documents through `registry`.
    pub fn new(store: S, registry: ConstructorRegistry<T>) -> Self {
        Self { store, registry }
    }

    /// The underlying document store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The constructor registry used on every read.
    pub fn registry(&self) -> &ConstructorRegistry<T> {
        &self.registry
    }

    /// Every document in the collection, in store order. Fails as a whole if
    /// any document cannot be reconstructed.
    pub async fn find_all(&self) -> RepositoryResult<Vec<T>, S::Error> {
        debug!(collection = self.store.collection(), "finding all documents");
        let handles = self.store.find().await.map_err(RepositoryError::Store)?;
        handles
            .iter()
            .map(|handle| self.instantiate(handle.to_object()))
            .collect()
    }

    pub async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<T>, S::Error> {
        require_id(id)?;
        debug!(collection = self.store.collection(), id, "finding document by id");
        let handle = self
            .store
            .find_by_id(id)
            .await
            .map_err(RepositoryError::Store)?;
        handle
            .map(|handle| self.instantiate(handle.to_object()))
            .transpose()
    }

    /// First document matching every condition of `filter`.
    ///
    /// Lookups such as `find_by_isbn` are built on this. The filter must
    /// name at least one field and every value must be non-empty.
    pub async fn find_one(&self, filter: &Filter) -> RepositoryResult<Option<T>, S::Error> {
        validate_filter(filter)?;
        debug!(collection = self.store.collection(), ?filter, "finding one document");
        let handle = self
            .store
            .find_one(filter)
            .await
            .map_err(RepositoryError::Store)?;
        handle
            .map(|handle| self.instantiate(handle.to_object()))
            .transpose()
    }

    /// Shorthand for a single-field [`find_one`](Self::find_one).
    pub async fn find_one_by(
        &self,
        field: &str,
        value: impl Into<Value>,
    ) -> RepositoryResult<Option<T>, S::Error> {
        self.find_one(&Filter::eq(field, value)).await
    }

    /// Create or update, depending on the payload.
    ///
    /// The returned entity is always rebuilt from the document as stored, so
    /// store-assigned fields such as the id or timestamps are visible.
    pub async fn save(&self, payload: impl Into<Payload>) -> RepositoryResult<T, S::Error> {
        match payload.into() {
            Payload::New(record) => self.insert(record.as_ref()).await,
            Payload::Update(update) => self.update(update).await,
        }
    }

    /// Delete by id. Returns whether a document was removed.
    pub async fn delete_by_id(&self, id: &str) -> RepositoryResult<bool, S::Error> {
        require_id(id)?;
        debug!(collection = self.store.collection(), id, "deleting document");
        let deleted = self
            .store
            .find_by_id_and_delete(id)
            .await
            .map_err(RepositoryError::Store)?;
        Ok(deleted.is_some())
    }

    async fn insert(&self, record: &dyn Record) -> RepositoryResult<T, S::Error> {
        // New records must not carry an id.
        if let Some(id) = record.record_id().filter(|id| !id.is_empty()) {
            return Err(RepositoryError::NotFound { id: id.to_string() });
        }

        let mut fields = match record.to_value().map_err(RepositoryError::Serialization)? {
            Value::Object(fields) => fields,
            _ => {
                return Err(RepositoryError::IllegalArgument(
                    "the given element must be valid".into(),
                ))
            }
        };
        fields.remove(ID_KEY);
        match record.tag() {
            Some(tag) => {
                fields.insert(DISCRIMINATOR_KEY.to_string(), Value::String(tag.to_string()));
            }
            None => {
                fields.remove(DISCRIMINATOR_KEY);
            }
        }

        debug!(
            collection = self.store.collection(),
            discriminator = record.tag().unwrap_or(DEFAULT_DISCRIMINATOR),
            "inserting document"
        );
        let handle = match self.store.create(fields).await {
            Ok(handle) => handle,
            Err(err) if err.is_uniqueness_conflict() => {
                let field = err.conflicting_field().map(str::to_string);
                warn!(
                    collection = self.store.collection(),
                    field = field.as_deref().unwrap_or("unknown"),
                    "insert rejected by unique index"
                );
                return Err(RepositoryError::UniquenessViolation { field });
            }
            Err(err) => return Err(RepositoryError::Store(err)),
        };
        self.instantiate(handle.to_object())
    }

    async fn update(&self, update: PartialUpdate) -> RepositoryResult<T, S::Error> {
        let (id, mut fields) = update.into_parts();
        require_id(&id)?;
        // Identity and type are fixed once stored.
        fields.remove(ID_KEY);
        fields.remove(DISCRIMINATOR_KEY);

        debug!(collection = self.store.collection(), id = %id, "updating document");
        let found = self
            .store
            .find_by_id(&id)
            .await
            .map_err(RepositoryError::Store)?;
        let Some(mut handle) = found else {
            return Err(RepositoryError::NotFound { id });
        };

        handle.set(fields);
        handle.set_is_new(false);
        let stored = handle.save().await.map_err(RepositoryError::Store)?;
        self.instantiate(stored)
    }

    /// Rebuild a typed entity from a raw document via the registry.
    fn instantiate(&self, document: Document) -> RepositoryResult<T, S::Error> {
        let id = document
            .get(ID_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let discriminator = document
            .get(DISCRIMINATOR_KEY)
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_DISCRIMINATOR)
            .to_string();

        match self.registry.construct(&discriminator, document) {
            Some(Ok(entity)) => Ok(entity),
            Some(Err(source)) => Err(RepositoryError::Reconstruction {
                id,
                discriminator,
                source,
            }),
            None => {
                warn!(
                    collection = self.store.collection(),
                    id = %id,
                    discriminator = %discriminator,
                    "no constructor registered for discriminator"
                );
                Err(RepositoryError::UndefinedConstructor { id, discriminator })
            }
        }
    }
}

fn require_id<E>(id: &str) -> Result<(), RepositoryError<E>> {
    if id.is_empty() {
        return Err(RepositoryError::IllegalArgument(
            "the given ID must be valid".into(),
        ));
    }
    Ok(())
}

fn validate_filter<E>(filter: &Filter) -> Result<(), RepositoryError<E>> {
    if filter.is_empty() {
        return Err(RepositoryError::IllegalArgument(
            "a lookup needs at least one field".into(),
        ));
    }
    for (field, value) in filter.conditions() {
        let empty = match value {
            Value::Null => true,
            Value::String(value) => value.is_empty(),
            _ => false,
        };
        if field.is_empty() || empty {
            return Err(RepositoryError::IllegalArgument(format!(
                "the given {} must be valid",
                if field.is_empty() { "field" } else { field.as_str() }
            )));
        }
    }
    Ok(())
}
