use thiserror::Error;

/// Errors surfaced by [`Repository`](super::Repository) operations.
///
/// Generic over the store's own error type so that store failures other
/// than uniqueness conflicts reach the caller untouched.
#[derive(Debug, Error)]
pub enum RepositoryError<E> {
    /// A required argument (id, lookup key or payload) was empty or missing.
    #[error("illegal argument: {0}")]
    IllegalArgument(String),
    /// An update targeted an id with no stored document.
    #[error("there is no document matching the given ID {id}; new elements cannot specify an ID")]
    NotFound { id: String },
    /// A create conflicted with a unique index.
    #[error("the given element includes a field which value is expected to be unique{}", describe_field(.field))]
    UniquenessViolation { field: Option<String> },
    /// A stored discriminator tag has no registered constructor.
    #[error("there is no registered constructor for discriminator {discriminator} of document {id}")]
    UndefinedConstructor { id: String, discriminator: String },
    /// A registered constructor rejected the stored field bag.
    #[error("constructor for discriminator {discriminator} rejected document {id}: {source}")]
    Reconstruction {
        id: String,
        discriminator: String,
        #[source]
        source: serde_json::Error,
    },
    /// A payload could not be converted into a field bag.
    #[error("element serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),
    #[error(transparent)]
    Store(E),
}

pub type RepositoryResult<T, E> = Result<T, RepositoryError<E>>;

fn describe_field(field: &Option<String>) -> String {
    match field {
        Some(field) => format!(" ({})", field),
        None => String::new(),
    }
}
