//! Per-row business-rule constraints
//!
//! A [`Constraint`] is a caller-supplied rule checked against every row.
//! The validator emits one violation per failing (row, constraint) pair.
//! Three factories cover the common cases: positive numbers, non-empty
//! strings, and numeric ranges. A constraint only judges values that are
//! present; column presence is the required-columns validator's job.

use super::{PerformanceProfile, Record, Subject, Validator};
use crate::error::codes::ERR_CONSTRAINT_VIOLATION;
use crate::error::{OutputError, ValidationErrorBuilder, Violation};
use std::sync::Arc;

pub trait Constraint: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(())` when the row satisfies the rule, the violation otherwise.
    fn check(&self, row: &Record) -> Result<(), Violation>;
}

/// Closure-backed constraint, the form all factories return.
#[derive(Clone)]
pub struct FnConstraint {
    name: String,
    check: Arc<dyn Fn(&Record) -> Result<(), Violation> + Send + Sync>,
}

impl FnConstraint {
    pub fn new<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Record) -> Result<(), Violation> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            check: Arc::new(check),
        }
    }
}

impl Constraint for FnConstraint {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, row: &Record) -> Result<(), Violation> {
        (self.check)(row)
    }
}

/// The named field, when present, must be a number greater than zero.
pub fn positive_number(field: impl Into<String>) -> FnConstraint {
    let field = field.into();
    let name = format!("positive_number({field})");
    FnConstraint::new(name.clone(), move |row| {
        let value = match row.get(&field) {
            Some(v) => v,
            None => return Ok(()),
        };
        match value.as_f64() {
            Some(n) if n > 0.0 => Ok(()),
            _ => Err(Violation::new(
                field.clone(),
                value.clone(),
                name.clone(),
                "must be a positive number",
            )),
        }
    })
}

/// The named field, when present, must be a string with content.
pub fn non_empty_string(field: impl Into<String>) -> FnConstraint {
    let field = field.into();
    let name = format!("non_empty_string({field})");
    FnConstraint::new(name.clone(), move |row| {
        let value = match row.get(&field) {
            Some(v) => v,
            None => return Ok(()),
        };
        match value.as_str() {
            Some(s) if !s.is_empty() => Ok(()),
            _ => Err(Violation::new(
                field.clone(),
                value.clone(),
                name.clone(),
                "must be a non-empty string",
            )),
        }
    })
}

/// The named field, when present, must be a number within `[min, max]`.
pub fn numeric_range(field: impl Into<String>, min: f64, max: f64) -> FnConstraint {
    let field = field.into();
    let name = format!("numeric_range({field},{min},{max})");
    FnConstraint::new(name.clone(), move |row| {
        let value = match row.get(&field) {
            Some(v) => v,
            None => return Ok(()),
        };
        match value.as_f64() {
            Some(n) if n >= min && n <= max => Ok(()),
            _ => Err(Violation::new(
                field.clone(),
                value.clone(),
                name.clone(),
                format!("must be a number between {min} and {max}"),
            )),
        }
    })
}

pub struct ConstraintValidator {
    constraints: Vec<Arc<dyn Constraint>>,
}

impl ConstraintValidator {
    pub fn new() -> Self {
        Self {
            constraints: Vec::new(),
        }
    }

    pub fn with_constraint(mut self, constraint: impl Constraint + 'static) -> Self {
        self.constraints.push(Arc::new(constraint));
        self
    }
}

impl Default for ConstraintValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for ConstraintValidator {
    fn name(&self) -> &str {
        "constraint"
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
            for constraint in &self.constraints {
                if let Err(mut violation) = constraint.check(row) {
                    violation.message = format!("{} (row {index})", violation.message);
                    violations.push(violation);
                }
            }
        }
        if violations.is_empty() {
            return Ok(());
        }
        Err(ValidationErrorBuilder::new(ERR_CONSTRAINT_VIOLATION)
            .message("constraint validation failed")
            .with_violations(violations)
            .build())
    }

    fn performance(&self) -> Option<PerformanceProfile> {
        Some(PerformanceProfile::new(50, false))
    }
}
