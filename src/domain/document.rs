//! Raw store records and the snapshot/transform vocabulary of the
//! document store.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single record in a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub data: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// Non-negative integer field. Floats are truncated, negatives rejected.
    pub fn u64_field(&self, key: &str) -> Option<u64> {
        let value = self.data.get(key)?;
        value.as_u64().or_else(|| {
            value
                .as_f64()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(|v| v as u64)
        })
    }

    pub fn i64_field(&self, key: &str) -> Option<i64> {
        let value = self.data.get(key)?;
        value
            .as_i64()
            .or_else(|| value.as_f64().filter(|v| v.is_finite()).map(|v| v as i64))
    }

    pub fn f64_field(&self, key: &str) -> Option<f64> {
        self.data.get(key).and_then(Value::as_f64)
    }

    /// Timestamp stored either as an RFC 3339 string or as epoch milliseconds.
    pub fn timestamp_field(&self, key: &str) -> Option<DateTime<Utc>> {
        match self.data.get(key)? {
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            Value::Number(n) => n
                .as_i64()
                .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
            _ => None,
        }
    }
}

/// Conversion from a raw document into a typed record.
///
/// Implementations never fail: missing or malformed fields are replaced by
/// placeholder values so that one bad record cannot break a whole view.
pub trait FromDocument: Sized {
    fn from_document(doc: &Document) -> Self;
}

impl FromDocument for Document {
    fn from_document(doc: &Document) -> Self {
        doc.clone()
    }
}

/// Kind of change carried by a snapshot notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// One delta inside a [`CollectionSnapshot`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChange {
    pub kind: ChangeKind,
    pub id: String,
}

/// Full state of a collection after a change, plus the change set that
/// produced it. The initial snapshot of a subscription has no changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSnapshot {
    pub collection: String,
    /// Monotonic per collection; bumped on every write.
    pub version: u64,
    pub documents: Vec<Document>,
    pub changes: Vec<DocumentChange>,
}

/// Atomic field update applied by [`DocumentStore::transform`](super::ports::DocumentStore::transform).
#[derive(Debug, Clone, PartialEq)]
pub enum FieldTransform {
    /// Add `by` to a numeric field, treating a missing field as zero.
    Increment { field: String, by: i64 },
    /// Push a value onto an array field, creating the array when missing.
    /// Duplicates are kept.
    Append { field: String, value: Value },
    /// Write the value only if the field does not exist yet.
    SetIfAbsent { field: String, value: Value },
}

impl FieldTransform {
    pub fn increment(field: impl Into<String>, by: i64) -> Self {
        Self::Increment {
            field: field.into(),
            by,
        }
    }

    pub fn append(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Append {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn set_if_absent(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::SetIfAbsent {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Apply transforms in order to a document body.
pub fn apply_transforms(data: &mut Map<String, Value>, transforms: &[FieldTransform]) {
    for transform in transforms {
        match transform {
            FieldTransform::Increment { field, by } => {
                let current = data.get(field).and_then(Value::as_i64).unwrap_or(0);
                data.insert(field.clone(), Value::from(current.saturating_add(*by)));
            }
            FieldTransform::Append { field, value } => match data.get_mut(field) {
                Some(Value::Array(items)) => items.push(value.clone()),
                _ => {
                    data.insert(field.clone(), Value::Array(vec![value.clone()]));
                }
            },
            FieldTransform::SetIfAbsent { field, value } => {
                data.entry(field.clone()).or_insert_with(|| value.clone());
            }
        }
    }
}
