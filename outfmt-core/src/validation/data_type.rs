//! Semantic data-type validation
//!
//! Columns are checked structurally against a small closed set of semantic
//! type tags, with no runtime reflection. All numeric kinds are mutually
//! compatible (an int column accepts a float cell and vice versa) and
//! `Any` accepts everything. A present nil value is always a violation,
//! whatever the declared kind; absent columns are the malformed-data
//! validator's concern.

use super::{PerformanceProfile, Subject, Validator};
use crate::error::codes::ERR_INVALID_DATA_TYPE;
use crate::error::{OutputError, ValidationErrorBuilder, Violation};
use serde_json::Value;
use std::collections::BTreeMap;

/// Closed set of semantic column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Str,
    Int,
    Float,
    Bool,
    Any,
}

impl DataKind {
    pub fn name(&self) -> &'static str {
        match self {
            DataKind::Str => "string",
            DataKind::Int => "int",
            DataKind::Float => "float",
            DataKind::Bool => "bool",
            DataKind::Any => "any",
        }
    }

    /// Structural compatibility check. `Null` is handled by the caller.
    fn matches(&self, value: &Value) -> bool {
        match self {
            DataKind::Str => value.is_string(),
            DataKind::Int | DataKind::Float => value.is_number(),
            DataKind::Bool => value.is_boolean(),
            DataKind::Any => true,
        }
    }
}

pub struct DataTypeValidator {
    expected: BTreeMap<String, DataKind>,
}

impl DataTypeValidator {
    pub fn new<I, S>(expected: I) -> Self
    where
        I: IntoIterator<Item = (S, DataKind)>,
        S: Into<String>,
    {
        Self {
            expected: expected.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl Validator for DataTypeValidator {
    fn name(&self) -> &str {
        "data_type"
    }

    fn validate(&self, subject: &Subject) -> Result<(), OutputError> {
        let dataset = match subject.as_dataset() {
            Some(d) => d,
            None => return Ok(()),
        };
        let mut violations = Vec::new();
        for (index, row) in dataset.rows().iter().enumerate() {
            let row = match row {
                Some(r) => r,
                None => continue,
            };
            for (column, kind) in &self.expected {
                let value = match row.get(column) {
                    Some(v) => v,
                    None => continue,
                };
                if value.is_null() {
                    violations.push(Violation::new(
                        column.clone(),
                        Value::Null,
                        "non_nil",
                        format!("nil value in row {index}"),
                    ));
                } else if !kind.matches(value) {
                    violations.push(Violation::new(
                        column.clone(),
                        value.clone(),
                        kind.name(),
                        format!("expected {} in row {index}", kind.name()),
                    ));
                }
            }
        }
        if violations.is_empty() {
            return Ok(());
        }
        Err(ValidationErrorBuilder::new(ERR_INVALID_DATA_TYPE)
            .message("data type validation failed")
            .with_violations(violations)
            .build())
    }

    fn performance(&self) -> Option<PerformanceProfile> {
        Some(PerformanceProfile::new(10, false))
    }
}
