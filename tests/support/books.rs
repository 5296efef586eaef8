use std::ops::Deref;

use polydoc::{
    ConstructorRegistry, Entity, InMemoryDocumentStore, InMemoryStoreError, Repository,
    RepositoryError, RepositoryResult, StoreOptions,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub isbn: String,
}

impl Book {
    pub fn new(title: &str, description: &str, isbn: &str) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: description.into(),
            isbn: isbn.into(),
        }
    }
}

impl Entity for Book {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperBook {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub isbn: String,
    pub edition: u32,
}

impl PaperBook {
    pub fn new(title: &str, description: &str, isbn: &str, edition: u32) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: description.into(),
            isbn: isbn.into(),
            edition,
        }
    }
}

impl Entity for PaperBook {
    const DISCRIMINATOR: Option<&'static str> = Some("PaperBook");

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioBook {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub isbn: String,
    pub hosting_platforms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl AudioBook {
    pub fn new(title: &str, description: &str, isbn: &str, hosting_platforms: &[&str]) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: description.into(),
            isbn: isbn.into(),
            hosting_platforms: hosting_platforms.iter().map(|p| p.to_string()).collect(),
            format: None,
        }
    }
}

impl Entity for AudioBook {
    const DISCRIMINATOR: Option<&'static str> = Some("AudioBook");

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// Stored alongside the other books but never registered with
/// [`BookRepository`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectronicBook {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub isbn: String,
    pub extension: String,
}

impl Entity for ElectronicBook {
    const DISCRIMINATOR: Option<&'static str> = Some("ElectronicBook");

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// Every book type the collection can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredBook {
    Book(Book),
    Paper(PaperBook),
    Audio(AudioBook),
    Electronic(ElectronicBook),
}

impl StoredBook {
    pub fn id(&self) -> &str {
        let id = match self {
            StoredBook::Book(book) => book.id(),
            StoredBook::Paper(book) => book.id(),
            StoredBook::Audio(book) => book.id(),
            StoredBook::Electronic(book) => book.id(),
        };
        id.unwrap_or_default()
    }

    pub fn title(&self) -> &str {
        match self {
            StoredBook::Book(book) => &book.title,
            StoredBook::Paper(book) => &book.title,
            StoredBook::Audio(book) => &book.title,
            StoredBook::Electronic(book) => &book.title,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            StoredBook::Book(book) => &book.description,
            StoredBook::Paper(book) => &book.description,
            StoredBook::Audio(book) => &book.description,
            StoredBook::Electronic(book) => &book.description,
        }
    }

    pub fn isbn(&self) -> &str {
        match self {
            StoredBook::Book(book) => &book.isbn,
            StoredBook::Paper(book) => &book.isbn,
            StoredBook::Audio(book) => &book.isbn,
            StoredBook::Electronic(book) => &book.isbn,
        }
    }
}

impl From<Book> for StoredBook {
    fn from(book: Book) -> Self {
        StoredBook::Book(book)
    }
}

impl From<PaperBook> for StoredBook {
    fn from(book: PaperBook) -> Self {
        StoredBook::Paper(book)
    }
}

impl From<AudioBook> for StoredBook {
    fn from(book: AudioBook) -> Self {
        StoredBook::Audio(book)
    }
}

impl From<ElectronicBook> for StoredBook {
    fn from(book: ElectronicBook) -> Self {
        StoredBook::Electronic(book)
    }
}

type Inner = Repository<StoredBook, InMemoryDocumentStore>;

/// Book repository with an ISBN lookup on top of the generic operations.
pub struct BookRepository {
    inner: Inner,
}

impl BookRepository {
    pub fn new() -> Self {
        Self::with_registry(
            ConstructorRegistry::builder()
                .register::<Book>()
                .register::<PaperBook>()
                .register::<AudioBook>()
                .build(),
        )
    }

    /// Registry without a constructor for untagged documents.
    pub fn without_base_type() -> Self {
        Self::with_registry(
            ConstructorRegistry::builder()
                .register::<PaperBook>()
                .register::<AudioBook>()
                .build(),
        )
    }

    fn with_registry(registry: ConstructorRegistry<StoredBook>) -> Self {
        let store = InMemoryDocumentStore::with_options(StoreOptions::new("books").unique("isbn"));
        Self {
            inner: Repository::new(store, registry),
        }
    }

    pub async fn find_by_isbn(
        &self,
        isbn: &str,
    ) -> RepositoryResult<Option<StoredBook>, InMemoryStoreError> {
        if isbn.is_empty() {
            return Err(RepositoryError::IllegalArgument(
                "the given ISBN must be valid".into(),
            ));
        }
        self.inner.find_one_by("isbn", isbn).await
    }
}

impl Deref for BookRepository {
    type Target = Inner;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
