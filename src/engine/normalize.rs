//! Payload normalization.
//!
//! Restricts a JSON payload to the attributes a schema declares and reduces
//! each to a comparable string:
//! - a key absent from the payload, or explicitly `null`, is missing,
//! - a string value is taken verbatim,
//! - a nested object is flattened to its `Answer` member, with an optional
//!   `Title` member kept for display only,
//! - any other value is rendered as compact JSON text.
//!
//! Payload keys the schema does not declare are never read. A payload that
//! is not a JSON object yields only missing values.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Member holding the comparable value inside a nested attribute object.
const ANSWER_KEY: &str = "Answer";
/// Member holding the display title inside a nested attribute object.
const TITLE_KEY: &str = "Title";

/// A payload value reduced to comparable form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalizedValue {
    /// Key absent from the payload or explicitly null.
    Missing,
    /// Comparable string value.
    Present(String),
}

impl NormalizedValue {
    /// Whether a value was found.
    pub fn is_present(&self) -> bool {
        matches!(self, NormalizedValue::Present(_))
    }

    /// Convert into an optional string, discarding the marker.
    pub fn into_option(self) -> Option<String> {
        match self {
            NormalizedValue::Missing => None,
            NormalizedValue::Present(s) => Some(s),
        }
    }
}

/// One attribute extracted from a payload.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedAttribute {
    /// The comparable value.
    pub value: NormalizedValue,
    /// Display title carried by the payload, when present.
    pub title: Option<String>,
}

/// Extract one declared attribute from a payload.
pub fn normalize_attribute(payload: &Value, key: &str) -> NormalizedAttribute {
    let member = match payload {
        Value::Object(map) => map.get(key),
        _ => None,
    };
    match member {
        None | Some(Value::Null) => NormalizedAttribute {
            value: NormalizedValue::Missing,
            title: None,
        },
        Some(Value::Object(map)) => {
            let title = match map.get(TITLE_KEY) {
                Some(Value::String(s)) => Some(s.clone()),
                None | Some(Value::Null) => None,
                Some(other) => Some(other.to_string()),
            };
            let value = match map.get(ANSWER_KEY) {
                None | Some(Value::Null) => NormalizedValue::Missing,
                Some(v) => NormalizedValue::Present(scalar_text(v)),
            };
            NormalizedAttribute { value, title }
        }
        Some(v) => NormalizedAttribute {
            value: NormalizedValue::Present(scalar_text(v)),
            title: None,
        },
    }
}

/// Render a JSON value as comparable text.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
