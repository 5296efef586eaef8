use serde_json::Value;

use super::Document;
use crate::entity::ID_KEY;

/// Conjunction of field equality conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// Filter matching every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter matching documents whose `field` equals `value`.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new().and(field, value)
    }

    /// Add another equality condition.
    pub fn and(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Whether a document with the given id and fields satisfies every condition.
    pub fn matches(&self, id: &str, fields: &Document) -> bool {
        self.conditions.iter().all(|(field, expected)| {
            if field == ID_KEY {
                return expected.as_str() == Some(id);
            }
            fields.get(field) == Some(expected)
        })
    }
}
