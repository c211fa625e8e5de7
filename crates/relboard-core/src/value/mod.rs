//! Module: value
//! Responsibility: the runtime value carried by items and written back to tables.
//! Does not own: column typing or schema-driven coercion policy.
//! Boundary: all conversions between backend JSON and item values go through here.


use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use thiserror::Error as ThisError;

///
/// DocumentError
///
/// Structured-document text that could not be parsed back into JSON.
///

#[derive(Debug, ThisError)]
#[error("'{attribute}' is not valid JSON: {message}")]
pub struct DocumentError {
    pub attribute: String,
    pub message: String,
}

///
/// Value
///
/// `List` covers both to-many projections and arrays of arrays.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Self>),
}

impl Value {
    /// Convert a backend JSON value.
    ///
    /// Objects are not item values; they are kept as canonical JSON text.
    #[must_use]
    pub fn from_json(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(v) => Self::Bool(*v),
            JsonValue::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or_default()), Self::Int),
            JsonValue::String(s) => Self::Text(s.clone()),
            JsonValue::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            JsonValue::Object(_) => Self::Text(json.to_string()),
        }
    }

    /// Render a structured-document column as its canonical text form.
    #[must_use]
    pub fn document_text(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => Self::Null,
            other => Self::Text(other.to_string()),
        }
    }

    /// Convert back into backend JSON.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Bool(v) => JsonValue::Bool(*v),
            Self::Int(v) => JsonValue::from(*v),
            Self::Float(v) => {
                serde_json::Number::from_f64(*v).map_or(JsonValue::Null, JsonValue::Number)
            }
            Self::Text(v) => JsonValue::String(v.clone()),
            Self::List(items) => JsonValue::Array(items.iter().map(Self::to_json).collect()),
        }
    }

    /// Parse a structured-document value from its edited text form.
    pub fn parse_document(&self, attribute: &str) -> Result<JsonValue, DocumentError> {
        match self {
            Self::Text(text) if text.trim().is_empty() => Ok(JsonValue::Null),
            Self::Text(text) => serde_json::from_str(text).map_err(|err| DocumentError {
                attribute: attribute.to_string(),
                message: err.to_string(),
            }),
            other => Ok(other.to_json()),
        }
    }

    /// True when a required attribute would count as unfilled.
    ///
    /// `false` and `0` are values, not gaps.
    #[must_use]
    pub fn is_unset(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => text.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Bool(_) | Self::Int(_) | Self::Float(_) => false,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Flatten into the non-null scalars it holds.
    ///
    /// A scalar yields itself, a list yields its scalar members.
    #[must_use]
    pub fn scalars(&self) -> Vec<Self> {
        match self {
            Self::Null => Vec::new(),
            Self::List(items) => items.iter().flat_map(Self::scalars).collect(),
            scalar => vec![scalar.clone()],
        }
    }

    /// Plain text form, as the backend compares cells.
    #[must_use]
    pub fn to_text(&self) -> String {
        self.render(str::to_string)
    }

    /// Wire literal used inside match predicates (`column.eq.<literal>`).
    ///
    /// Text holding a predicate delimiter is double-quoted with `"` and `\`
    /// escaped, so it survives inside `or=(...)`.
    #[must_use]
    pub fn to_literal(&self) -> String {
        self.render(quote_reserved)
    }

    fn render(&self, text: fn(&str) -> String) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Bool(v) => v.to_string(),
            Self::Int(v) => v.to_string(),
            Self::Float(v) => v.to_string(),
            Self::Text(v) => text(v),
            Self::List(items) => {
                let inner: Vec<String> = items.iter().map(|item| item.render(text)).collect();
                format!("({})", inner.join(","))
            }
        }
    }
}

const RESERVED: &[char] = &[',', '.', ':', '(', ')', '"', '\\'];

fn quote_reserved(text: &str) -> String {
    if !text.contains(RESERVED) {
        return text.to_string();
    }

    let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&JsonValue> for Value {
    fn from(value: &JsonValue) -> Self {
        Self::from_json(value)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}
