use crate::{MappingError, StorageKey};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved field holding the document identifier.
pub const ID_FIELD: &str = "id";
/// Reserved field holding the resource type from the URL.
pub const DOC_TYPE_FIELD: &str = "doc_type";
/// Reserved field holding the derived storage key.
pub const KEY_FIELD: &str = "key";

/// A stored resource: field names mapped to arbitrary JSON values, in the
/// order they were first inserted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Parse a request body. Anything other than a JSON object is rejected.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, MappingError> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| MappingError::MalformedJson(e.to_string()))?;
        Self::try_from(value)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Set `field`, returning the previous value if there was one.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn id(&self) -> Option<&str> {
        self.str_field(ID_FIELD)
    }

    pub fn doc_type(&self) -> Option<&str> {
        self.str_field(DOC_TYPE_FIELD)
    }

    pub fn key(&self) -> Option<&str> {
        self.str_field(KEY_FIELD)
    }

    /// Write the three reserved fields from `key`.
    pub fn stamp(&mut self, key: &StorageKey) {
        self.insert(ID_FIELD, key.id());
        self.insert(DOC_TYPE_FIELD, key.doc_type());
        self.insert(KEY_FIELD, key.as_str());
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    fn str_field(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }
}

impl TryFrom<Value> for Document {
    type Error = MappingError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Err(MappingError::NotAnObject("null")),
            Value::Bool(_) => Err(MappingError::NotAnObject("boolean")),
            Value::Number(_) => Err(MappingError::NotAnObject("number")),
            Value::String(_) => Err(MappingError::NotAnObject("string")),
            Value::Array(_) => Err(MappingError::NotAnObject("array")),
        }
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Object(doc.0)
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
