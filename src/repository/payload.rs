use serde::Serialize;
use serde_json::Value;

use crate::entity::{Entity, ID_KEY};
use crate::store::Document;

/// Object-safe view of a record waiting for its first insert.
pub trait Record: Send + Sync {
    fn record_id(&self) -> Option<&str>;

    /// Discriminator tag of the concrete type, if any.
    fn tag(&self) -> Option<&'static str>;

    fn to_value(&self) -> Result<Value, serde_json::Error>;
}

struct EntityRecord<E>(E);

impl<E: Entity> Record for EntityRecord<E> {
    fn record_id(&self) -> Option<&str> {
        self.0.id()
    }

    fn tag(&self) -> Option<&'static str> {
        E::DISCRIMINATOR
    }

    fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(&self.0)
    }
}

/// Update-in-place request: a required id plus the fields to change.
///
/// Fields left out keep their stored value.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialUpdate {
    id: String,
    fields: Document,
}

impl PartialUpdate {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Document::new(),
        }
    }

    /// Build an update from an existing field bag. An `id` key inside
    /// `fields` is ignored.
    pub fn from_fields(id: impl Into<String>, mut fields: Document) -> Self {
        fields.remove(ID_KEY);
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Build an update from any value serializing to a JSON object, such as
    /// a patch struct with `skip_serializing_if = "Option::is_none"` fields.
    pub fn from_patch<P: Serialize>(id: impl Into<String>, patch: &P) -> Result<Self, serde_json::Error> {
        match serde_json::to_value(patch)? {
            Value::Object(fields) => Ok(Self::from_fields(id, fields)),
            other => Err(serde::ser::Error::custom(format!(
                "patch must serialize to an object, got {}",
                other
            ))),
        }
    }

    /// Set one field.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let field = field.into();
        if field != ID_KEY {
            self.fields.insert(field, value.into());
        }
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn fields(&self) -> &Document {
        &self.fields
    }

    pub fn into_parts(self) -> (String, Document) {
        (self.id, self.fields)
    }
}

/// Input to [`Repository::save`](super::Repository::save).
///
/// Creating and updating are separate variants, so a record that has never
/// been stored cannot be confused with an update to an existing one.
pub enum Payload {
    /// A record that has never been persisted.
    New(Box<dyn Record>),
    /// An update to an existing document.
    Update(PartialUpdate),
}

impl Payload {
    /// Payload inserting `entity` as a new document.
    pub fn new<E: Entity + 'static>(entity: E) -> Self {
        Payload::New(Box::new(EntityRecord(entity)))
    }

    /// Branch on the entity's id: persisted entities become a full update of
    /// every serialized field, transient ones become a create.
    pub fn from_entity<E: Entity + 'static>(entity: E) -> Result<Self, serde_json::Error> {
        let id = entity.id().filter(|id| !id.is_empty()).map(str::to_string);
        match id {
            Some(id) => Ok(Payload::Update(PartialUpdate::from_patch(id, &entity)?)),
            None => Ok(Payload::new(entity)),
        }
    }

    pub fn is_update(&self) -> bool {
        matches!(self, Payload::Update(_))
    }
}

impl From<PartialUpdate> for Payload {
    fn from(update: PartialUpdate) -> Self {
        Payload::Update(update)
    }
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Payload::New(record) => f
                .debug_tuple("New")
                .field(&record.tag())
                .finish(),
            Payload::Update(update) => f.debug_tuple("Update").field(update).finish(),
        }
    }
}
