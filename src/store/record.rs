//! Opaque business records.
//!
//! The backend owns the record shape; the client only relies on an `id`
//! plus a few conventional boolean-like flags (`deleted`, `favorite`,
//! `status`). Cross-module `*_details` snapshots ride along untouched.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BackofficeError, Result};

/// Soft-delete flag
pub const DELETED_FIELD: &str = "deleted";
/// Favorite flag
pub const FAVORITE_FIELD: &str = "favorite";

/// Record identity; backends use numeric and string ids.
///
/// A string holding a plain integer (`"17"`, not `"017"`) is the numeric id,
/// so the same record matches whether its id arrives quoted or not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl RecordId {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(RecordId::Int),
            Value::String(s) if !s.is_empty() => Some(Self::from_text(s)),
            _ => None,
        }
    }

    fn from_text(s: &str) -> Self {
        match s.parse::<i64>() {
            Ok(n) if n.to_string() == s => RecordId::Int(n),
            _ => RecordId::Text(s.to_string()),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{n}"),
            RecordId::Text(s) => write!(f, "{s}"),
        }
    }
}

impl FromStr for RecordId {
    type Err = BackofficeError;

    /// A plain integer becomes a numeric id, anything else a string id
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(BackofficeError::InvalidRecordId(s.to_string()));
        }
        Ok(Self::from_text(s))
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Int(n)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self::from_text(s)
    }
}

/// Truthiness of a boolean-like backend flag (`true`, `1`, `"1"`, `"true"`)
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => matches!(s.as_str(), "1" | "true" | "yes"),
        _ => false,
    }
}

/// Flip a boolean-like flag, keeping the representation the backend used
fn toggled(value: Option<&Value>) -> Value {
    let on = is_truthy(value);
    match value {
        Some(Value::Bool(_)) => Value::Bool(!on),
        Some(Value::Number(_)) => Value::from(if on { 0 } else { 1 }),
        Some(Value::String(s)) if s == "true" || s == "false" => {
            Value::String((!on).to_string())
        }
        Some(Value::String(_)) => Value::String(if on { "0" } else { "1" }.to_string()),
        _ => Value::Bool(true),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Accepts JSON objects only
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    pub fn id(&self) -> Option<RecordId> {
        self.0.get("id").and_then(RecordId::from_value)
    }

    pub fn has_id(&self, id: &RecordId) -> bool {
        self.id().as_ref() == Some(id)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn set(&mut self, field: &str, value: Value) {
        self.0.insert(field.to_string(), value);
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Shallow merge: every top-level field of `patch` replaces ours
    pub fn merge(&mut self, patch: &Record) {
        for (field, value) in &patch.0 {
            self.0.insert(field.clone(), value.clone());
        }
    }

    pub fn flag(&self, field: &str) -> bool {
        is_truthy(self.0.get(field))
    }

    pub fn toggle_flag(&mut self, field: &str) {
        let next = toggled(self.0.get(field));
        self.0.insert(field.to_string(), next);
    }

    pub fn is_deleted(&self) -> bool {
        self.flag(DELETED_FIELD)
    }

    pub fn is_favorite(&self) -> bool {
        self.flag(FAVORITE_FIELD)
    }

    /// Text of a field for display; strings unquoted, null as empty
    pub fn display_field(&self, field: &str) -> String {
        match self.0.get(field) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}
