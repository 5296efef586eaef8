use polydoc::{
    AuditFields, Auditable, AuditableRepository, ConstructorRegistry, Entity,
    InMemoryDocumentStore, StoreOptions,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditableBook {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub isbn: String,
    #[serde(flatten)]
    pub audit: AuditFields,
}

impl AuditableBook {
    pub fn new(title: &str, description: &str, isbn: &str) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: description.into(),
            isbn: isbn.into(),
            audit: AuditFields::default(),
        }
    }
}

impl Entity for AuditableBook {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditablePaperBook {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub isbn: String,
    pub edition: u32,
    #[serde(flatten)]
    pub audit: AuditFields,
}

impl AuditablePaperBook {
    pub fn new(title: &str, description: &str, isbn: &str, edition: u32) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: description.into(),
            isbn: isbn.into(),
            edition,
            audit: AuditFields::default(),
        }
    }
}

impl Entity for AuditablePaperBook {
    const DISCRIMINATOR: Option<&'static str> = Some("AuditablePaperBook");

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuditedBook {
    Book(AuditableBook),
    Paper(AuditablePaperBook),
}

impl AuditedBook {
    pub fn id(&self) -> &str {
        let id = match self {
            AuditedBook::Book(book) => book.id(),
            AuditedBook::Paper(book) => book.id(),
        };
        id.unwrap_or_default()
    }
}

impl Auditable for AuditedBook {
    fn audit(&self) -> &AuditFields {
        match self {
            AuditedBook::Book(book) => &book.audit,
            AuditedBook::Paper(book) => &book.audit,
        }
    }
}

impl From<AuditableBook> for AuditedBook {
    fn from(book: AuditableBook) -> Self {
        AuditedBook::Book(book)
    }
}

impl From<AuditablePaperBook> for AuditedBook {
    fn from(book: AuditablePaperBook) -> Self {
        AuditedBook::Paper(book)
    }
}

pub fn auditable_book_repository() -> AuditableRepository<AuditedBook, InMemoryDocumentStore> {
    let store = InMemoryDocumentStore::with_options(
        StoreOptions::new("auditablebooks")
            .unique("isbn")
            .with_timestamps(),
    );
    AuditableRepository::new(
        store,
        ConstructorRegistry::builder()
            .register::<AuditableBook>()
            .register::<AuditablePaperBook>()
            .build(),
    )
}
