mod error;
mod payload;
mod registry;
mod repository;

pub use error::{RepositoryError, RepositoryResult};
pub use payload::{PartialUpdate, Payload, Record};
pub use registry::{Constructor, ConstructorRegistry, RegistryBuilder};
pub use repository::Repository;
