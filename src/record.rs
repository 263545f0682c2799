//! Record types and identity management.
//!
//! The store is shape-agnostic: it only ever touches a record's `id`.
//! Everything else is reached through the record's JSON form, which is how
//! filters, sort directives and shallow merges address fields by name.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

/// A storable item in a collection.
///
/// Implementors are plain serde structs; the only contract is access to the
/// string `id` the store assigns on creation.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The record id, or `None` if it has not been assigned yet.
    fn id(&self) -> Option<&str>;

    /// Assign the record id. Called by the store on creation only.
    fn set_id(&mut self, id: String);

    /// Apply store-assigned defaults before the record is first stored.
    ///
    /// The default does nothing. Domains with a creation timestamp stamp it
    /// here.
    fn on_create(&mut self, _now: DateTime<Utc>) {}
}

/// Generate a fresh record id.
#[must_use]
pub fn new_record_id() -> String {
    Uuid::new_v4().to_string()
}

/// Schemaless record: any JSON object with an optional string `id`.
///
/// # Examples
///
/// ```
/// use portal_store::{Document, Record};
/// use serde_json::json;
///
/// let doc = Document::new().with("title", json!("Boas-vindas"));
/// assert!(doc.id().is_none());
/// assert_eq!(doc.get("title"), Some(&json!("Boas-vindas")));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field insert.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: Value) -> Self {
        self.0.insert(field.into(), value);
        self
    }

    /// Field value, if present.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Insert or replace a field, returning the previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(field.into(), value)
    }

    /// Borrow the underlying field map.
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume into the underlying field map.
    #[must_use]
    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Document {
    type Error = StoreError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(StoreError::InvalidPatch {
                kind: json_kind(&other),
            }),
        }
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Object(doc.0)
    }
}

impl Record for Document {
    fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    fn set_id(&mut self, id: String) {
        self.0.insert("id".to_string(), Value::String(id));
    }
}

/// Name of a JSON value's kind, for error messages.
#[must_use]
pub const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Serialize a record into its field map.
pub fn to_fields<T: Record>(record: &T) -> StoreResult<Map<String, Value>> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Serialization {
            message: format!("record serialized to {} instead of an object", json_kind(&other)),
        }),
    }
}

/// Shallow merge of `updates` into `base`.
///
/// Every top-level field in `updates` overwrites the same field in `base`;
/// fields not mentioned are kept. Nested objects are replaced, not merged.
/// The `id` field is never overwritten.
///
/// # Errors
/// `Serialization` if the merged fields no longer deserialize into `T`.
pub fn shallow_merge<T: Record>(base: &T, updates: &Map<String, Value>) -> StoreResult<T> {
    let mut fields = to_fields(base)?;
    for (field, value) in updates {
        if field == "id" {
            continue;
        }
        fields.insert(field.clone(), value.clone());
    }
    Ok(serde_json::from_value(Value::Object(fields))?)
}
