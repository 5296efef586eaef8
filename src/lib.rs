//! Polymorphic document repositories.
//!
//! One collection, many record types: every document carries an optional
//! discriminator tag, and a [`ConstructorRegistry`] turns each stored field
//! bag back into the right concrete type on read.

#[cfg(feature = "audit")]
mod audit;
mod entity;
mod repository;
mod store;

#[cfg(feature = "audit")]
pub use audit::{AuditFields, Auditable, AuditableRepository, CREATED_BY_KEY, UPDATED_BY_KEY};
pub use entity::{Entity, DEFAULT_DISCRIMINATOR, DISCRIMINATOR_KEY, ID_KEY};
pub use repository::{
    Constructor, ConstructorRegistry, PartialUpdate, Payload, Record, RegistryBuilder, Repository,
    RepositoryError, RepositoryResult,
};
pub use store::{Document, DocumentHandle, DocumentStore, Filter, StoreError};
#[cfg(feature = "in-memory")]
pub use store::{InMemoryDocument, InMemoryDocumentStore, InMemoryStoreError, StoreOptions};
