//! Dataset-shape validation: empty datasets and malformed rows
//!
//! `MalformedDataValidator` flags nil row maps, string cells containing
//! control characters (tab, newline, and carriage return excepted), NUL,
//! or the Unicode replacement character; in strict mode it also flags rows
//! missing any declared key.

use super::{PerformanceProfile, Subject, Validator};
use crate::error::codes::{ERR_EMPTY_DATASET, ERR_MALFORMED_DATA};
use crate::error::{ErrorSeverity, OutputError, ValidationErrorBuilder, Violation};
use serde_json::Value;

pub struct EmptyDatasetValidator {
    allow_empty: bool,
}

impl EmptyDatasetValidator {
    pub fn new(allow_empty: bool) -> Self {
        Self { allow_empty }
    }
}

impl Validator for EmptyDatasetValidator {
    fn name(&self) -> &str {
        "empty_dataset"
    }

    fn validate(&self, subject: &Subject) -> Result<(), OutputError> {
        let dataset = match subject.as_dataset() {
            Some(d) => d,
            None => return Ok(()),
        };
        if dataset.is_empty() && !self.allow_empty {
            return Err(ValidationErrorBuilder::new(ERR_EMPTY_DATASET)
                .severity(ErrorSeverity::Warning)
                .message("dataset contains no rows")
                .with_suggestion("enable allow_empty if an empty output is intended")
                .with_violation(Violation::new(
                    "rows",
                    Value::from(0),
                    "non_empty",
                    "dataset has zero rows",
                ))
                .build());
        }
        Ok(())
    }

    fn performance(&self) -> Option<PerformanceProfile> {
        Some(PerformanceProfile::fail_fast(1))
    }
}

pub struct MalformedDataValidator {
    strict: bool,
}

impl MalformedDataValidator {
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }
}

/// True for characters that must never appear in a rendered string cell.
fn is_forbidden_char(c: char) -> bool {
    (c.is_control() && !matches!(c, '\t' | '\n' | '\r')) || c == '\u{FFFD}'
}

impl Validator for MalformedDataValidator {
    fn name(&self) -> &str {
        "malformed_data"
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
                None => {
                    violations.push(Violation::new(
                        format!("row[{index}]"),
                        Value::Null,
                        "non_nil_row",
                        "row map is nil",
                    ));
                    continue;
                }
            };
            if self.strict {
                for key in dataset.keys() {
                    if !row.contains_key(key) {
                        violations.push(Violation::new(
                            key.clone(),
                            Value::Null,
                            "declared_key_present",
                            format!("row {index} is missing declared key"),
                        ));
                    }
                }
            }
            for (column, value) in row {
                if let Some(s) = value.as_str() {
                    if s.chars().any(is_forbidden_char) {
                        violations.push(Violation::new(
                            column.clone(),
                            value.clone(),
                            "printable_string",
                            format!("row {index} contains control or replacement characters"),
                        ));
                    }
                }
            }
        }
        if violations.is_empty() {
            return Ok(());
        }
        Err(ValidationErrorBuilder::new(ERR_MALFORMED_DATA)
            .message("malformed data detected")
            .with_violations(violations)
            .build())
    }

    fn performance(&self) -> Option<PerformanceProfile> {
        Some(PerformanceProfile::new(20, false))
    }
}
