//! Document store boundary - the capability a repository consumes.
//!
//! The repository never talks to a driver directly. It needs a collection
//! that can list, look up, create and delete raw documents, and a mutable
//! handle over a loaded document that can be patched and saved back. Any
//! backend (MongoDB, a KV store, the in-memory store in this crate) plugs in
//! by implementing [`DocumentStore`] and [`DocumentHandle`].

mod filter;
#[cfg(feature = "in-memory")]
mod in_memory;

use async_trait::async_trait;
use serde_json::{Map, Value};

pub use filter::Filter;
#[cfg(feature = "in-memory")]
pub use in_memory::{InMemoryDocument, InMemoryDocumentStore, InMemoryStoreError, StoreOptions};

/// Raw, unstructured field bag as stored in a collection.
pub type Document = Map<String, Value>;

/// Structured classification of store failures.
///
/// Replaces matching on driver error messages: a store reports whether a
/// failure was a unique index conflict, and optionally which field caused it.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
    /// Whether this error is a unique index (duplicate key) conflict.
    fn is_uniqueness_conflict(&self) -> bool;

    /// The field whose unique index was violated, when the store knows it.
    fn conflicting_field(&self) -> Option<&str> {
        None
    }
}

/// A loaded document that can be patched in place and written back.
#[async_trait]
pub trait DocumentHandle: Send + Sync {
    type Error: StoreError;

    /// Store-assigned identifier.
    fn id(&self) -> &str;

    /// Read a top-level field.
    fn get(&self, field: &str) -> Option<&Value>;

    /// Merge top-level fields into the document. Fields not given keep
    /// their current value. The identifier cannot be changed.
    fn set(&mut self, fields: Document);

    /// Whether the next save is a first-time insert.
    fn is_new(&self) -> bool;

    /// Mark the next save as an insert (`true`) or an update (`false`).
    fn set_is_new(&mut self, is_new: bool);

    /// Plain field bag including the identifier.
    fn to_object(&self) -> Document;

    /// Persist the document and return the stored field bag.
    async fn save(&mut self) -> Result<Document, Self::Error>;
}

/// A single collection of raw documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    type Error: StoreError;
    type Handle: DocumentHandle<Error = Self::Error>;

    /// Collection name, used for diagnostics.
    fn collection(&self) -> &str;

    /// All documents, in store-defined order.
    async fn find(&self) -> Result<Vec<Self::Handle>, Self::Error>;

    /// First document matching the filter.
    async fn find_one(&self, filter: &Filter) -> Result<Option<Self::Handle>, Self::Error>;

    /// Document with the given identifier.
    async fn find_by_id(&self, id: &str) -> Result<Option<Self::Handle>, Self::Error>;

    /// Insert a new document. The store assigns the identifier.
    async fn create(&self, fields: Document) -> Result<Self::Handle, Self::Error>;

    /// Remove a document, returning it if it existed.
    async fn find_by_id_and_delete(&self, id: &str) -> Result<Option<Document>, Self::Error>;
}
