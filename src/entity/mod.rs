//! Entities - the shape contract every repository operation depends on.
//!
//! An entity is any serde-serializable record with an optional identifier.
//! The identifier is absent until the store assigns one on first insert.
//!
//! Polymorphic entities share one collection with their sibling types and
//! carry a discriminator tag naming the concrete type. The tag is an
//! associated constant, so it is fixed by the type itself and can never be
//! changed on an instance.
//!
//! ## Example
//!
//! ```ignore
//! use polydoc::Entity;
//!
//! #[derive(Serialize, Deserialize)]
//! struct PaperBook {
//!     #[serde(default, skip_serializing_if = "Option::is_none")]
//!     id: Option<String>,
//!     title: String,
//!     edition: u32,
//! }
//!
//! impl Entity for PaperBook {
//!     const DISCRIMINATOR: Option<&'static str> = Some("PaperBook");
//!     fn id(&self) -> Option<&str> { self.id.as_deref() }
//! }
//! ```

use serde::{de::DeserializeOwned, Serialize};

/// Field holding the entity identifier in a raw document.
pub const ID_KEY: &str = "id";

/// Field holding the discriminator tag in a raw document.
pub const DISCRIMINATOR_KEY: &str = "__t";

/// Tag used for documents written without a discriminator.
pub const DEFAULT_DISCRIMINATOR: &str = "Default";

/// Trait for types that can be persisted through a repository.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    /// Discriminator tag of the concrete type, or `None` for the
    /// collection's base type.
    const DISCRIMINATOR: Option<&'static str> = None;

    /// Returns the identifier, if the entity has been persisted.
    fn id(&self) -> Option<&str>;

    /// Tag under which a constructor for this type is registered.
    fn discriminator() -> &'static str {
        Self::DISCRIMINATOR.unwrap_or(DEFAULT_DISCRIMINATOR)
    }

    /// Whether the entity has been persisted.
    fn is_persisted(&self) -> bool {
        self.id().is_some_and(|id| !id.is_empty())
    }
}
