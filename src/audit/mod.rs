//! Auditable repositories - record which actor created and last changed a document.
//!
//! Actor fields are written by the repository; timestamps come from the
//! store (see `StoreOptions::with_timestamps` for the in-memory store).
//!
//! ## Example
//!
//! ```ignore
//! let repo = AuditableRepository::new(store, registry);
//! let book = repo.save(Payload::new(book), "user-1").await?;
//! assert_eq!(book.created_by(), Some("user-1"));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::repository::{
    ConstructorRegistry, PartialUpdate, Payload, Record, Repository, RepositoryError,
    RepositoryResult,
};
use crate::store::{DocumentStore, Filter};

pub const CREATED_BY_KEY: &str = "createdBy";
pub const UPDATED_BY_KEY: &str = "updatedBy";

/// Audit data carried by auditable entities. Flatten it into an entity with
/// `#[serde(flatten)]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

/// Typed access to an entity's audit data.
pub trait Auditable {
    fn audit(&self) -> &AuditFields;

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.audit().created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.audit().updated_at
    }

    fn created_by(&self) -> Option<&str> {
        self.audit().created_by.as_deref()
    }

    fn updated_by(&self) -> Option<&str> {
        self.audit().updated_by.as_deref()
    }
}

/// New record stamped with the creating actor.
struct Audited {
    inner: Box<dyn Record>,
    actor: String,
}

impl Record for Audited {
    fn record_id(&self) -> Option<&str> {
        self.inner.record_id()
    }

    fn tag(&self) -> Option<&'static str> {
        self.inner.tag()
    }

    fn to_value(&self) -> Result<Value, serde_json::Error> {
        let mut value = self.inner.to_value()?;
        if let Value::Object(fields) = &mut value {
            fields.insert(CREATED_BY_KEY.to_string(), Value::String(self.actor.clone()));
            fields.insert(UPDATED_BY_KEY.to_string(), Value::String(self.actor.clone()));
        }
        Ok(value)
    }
}

/// Repository that stamps every save with the acting user.
pub struct AuditableRepository<T, S> {
    inner: Repository<T, S>,
}

impl<T, S: Clone> Clone for AuditableRepository<T, S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T, S> From<Repository<T, S>> for AuditableRepository<T, S> {
    fn from(inner: Repository<T, S>) -> Self {
        Self { inner }
    }
}

impl<T, S> AuditableRepository<T, S>
where
    S: DocumentStore,
{
    pub fn new(store: S, registry: ConstructorRegistry<T>) -> Self {
        Self {
            inner: Repository::new(store, registry),
        }
    }

    pub fn inner(&self) -> &Repository<T, S> {
        &self.inner
    }

    pub async fn find_all(&self) -> RepositoryResult<Vec<T>, S::Error> {
        self.inner.find_all().await
    }

    pub async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<T>, S::Error> {
        self.inner.find_by_id(id).await
    }

    pub async fn find_one(&self, filter: &Filter) -> RepositoryResult<Option<T>, S::Error> {
        self.inner.find_one(filter).await
    }

    pub async fn find_one_by(
        &self,
        field: &str,
        value: impl Into<Value>,
    ) -> RepositoryResult<Option<T>, S::Error> {
        self.inner.find_one_by(field, value).await
    }

    pub async fn delete_by_id(&self, id: &str) -> RepositoryResult<bool, S::Error> {
        self.inner.delete_by_id(id).await
    }

    /// Save on behalf of `actor`. Creates record the actor as both creator
    /// and last updater; updates only touch the last updater.
    pub async fn save(
        &self,
        payload: impl Into<Payload>,
        actor: &str,
    ) -> RepositoryResult<T, S::Error> {
        if actor.is_empty() {
            return Err(RepositoryError::IllegalArgument(
                "the given actor must be valid".into(),
            ));
        }
        let payload = match payload.into() {
            Payload::New(record) => Payload::New(Box::new(Audited {
                inner: record,
                actor: actor.to_string(),
            })),
            Payload::Update(update) => Payload::Update(stamp_update(update, actor)),
        };
        self.inner.save(payload).await
    }
}

fn stamp_update(update: PartialUpdate, actor: &str) -> PartialUpdate {
    let (id, mut fields) = update.into_parts();
    fields.remove(CREATED_BY_KEY);
    PartialUpdate::from_fields(id, fields).set(UPDATED_BY_KEY, actor)
}
