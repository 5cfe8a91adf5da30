//! Free-form diagnostic context attached to errors
//!
//! Every field is optional. Renderers pass a fixed vocabulary of operation
//! names (`"json_marshal"`, `"table_content_validation"`, ...) through
//! unchanged so aggregated reporting stays meaningful.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Well-known metadata key carrying the output format currently being
/// rendered. The format-fallback recovery strategy advances it.
pub const OUTPUT_FORMAT_KEY: &str = "output_format";

/// Diagnostic attachment for an error: which operation failed, on which
/// field/value/row, plus arbitrary metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ErrorContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Convenience for the well-known output-format metadata entry.
    pub fn with_output_format(self, format: impl Into<String>) -> Self {
        self.with_metadata(OUTPUT_FORMAT_KEY, Value::String(format.into()))
    }

    pub fn output_format(&self) -> Option<&str> {
        self.metadata.get(OUTPUT_FORMAT_KEY).and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.operation.is_none()
            && self.field.is_none()
            && self.value.is_none()
            && self.index.is_none()
            && self.metadata.is_empty()
    }
}

/// Render a JSON value the way it appears in user-facing error text:
/// strings bare, everything else as compact JSON.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
