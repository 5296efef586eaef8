//! Constructor registry - discriminator tag to rehydration function.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::entity::Entity;
use crate::store::Document;

/// Rehydration function turning a raw field bag into a typed entity.
pub type Constructor<T> = Arc<dyn Fn(Document) -> Result<T, serde_json::Error> + Send + Sync>;

/// Immutable mapping from discriminator tag to constructor.
///
/// Built once with [`RegistryBuilder`] and shared by every clone. Documents
/// stored without a tag are looked up under
/// [`DEFAULT_DISCRIMINATOR`](crate::DEFAULT_DISCRIMINATOR); that entry is
/// required like any other.
pub struct ConstructorRegistry<T> {
    constructors: Arc<HashMap<String, Constructor<T>>>,
}

impl<T> ConstructorRegistry<T> {
    pub fn builder() -> RegistryBuilder<T> {
        RegistryBuilder::new()
    }

    pub fn contains(&self, discriminator: &str) -> bool {
        self.constructors.contains_key(discriminator)
    }

    /// Registered tags, in no particular order.
    pub fn discriminators(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Run the constructor registered for `discriminator`. Returns `None`
    /// when the tag is unknown.
    pub fn construct(
        &self,
        discriminator: &str,
        fields: Document,
    ) -> Option<Result<T, serde_json::Error>> {
        self.constructors
            .get(discriminator)
            .map(|constructor| constructor(fields))
    }
}

impl<T> Clone for ConstructorRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            constructors: Arc::clone(&self.constructors),
        }
    }
}

impl<T> fmt::Debug for ConstructorRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<_> = self.discriminators().collect();
        tags.sort_unstable();
        f.debug_struct("ConstructorRegistry")
            .field("discriminators", &tags)
            .finish()
    }
}

/// Builder for [`ConstructorRegistry`].
pub struct RegistryBuilder<T> {
    constructors: HashMap<String, Constructor<T>>,
}

impl<T> Default for RegistryBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RegistryBuilder<T> {
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    pub fn build(self) -> ConstructorRegistry<T> {
        ConstructorRegistry {
            constructors: Arc::new(self.constructors),
        }
    }
}

impl<T: 'static> RegistryBuilder<T> {
    /// Register `S` under its own discriminator tag. Stored documents are
    /// deserialized into `S` and converted into the family type.
    pub fn register<S>(self) -> Self
    where
        S: Entity + Into<T> + 'static,
    {
        self.register_with(S::discriminator(), |fields| {
            serde_json::from_value::<S>(Value::Object(fields)).map(Into::into)
        })
    }

    /// Register an arbitrary constructor under `discriminator`. A later
    /// registration for the same tag replaces the earlier one.
    pub fn register_with<F>(mut self, discriminator: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(Document) -> Result<T, serde_json::Error> + Send + Sync + 'static,
    {
        self.constructors
            .insert(discriminator.into(), Arc::new(constructor));
        self
    }
}
