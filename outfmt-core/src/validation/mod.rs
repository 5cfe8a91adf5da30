//! Pluggable validation engine
//!
//! Validators are small, reusable checks that produce error-model values.
//! A runner executes them fail-fast or collect-all; the optimized runner
//! additionally consults each validator's optional performance profile to
//! reduce latency to first failure.
//!
//! Built-ins cover the checks every renderer needs: required columns,
//! semantic data types, per-row business constraints, empty datasets, and
//! malformed data.

pub mod constraint;
pub mod data_type;
pub mod dataset;
pub mod required_columns;
pub mod runner;
pub mod subject;

pub use constraint::{
    non_empty_string, numeric_range, positive_number, Constraint, ConstraintValidator,
    FnConstraint,
};
pub use data_type::{DataKind, DataTypeValidator};
pub use dataset::{EmptyDatasetValidator, MalformedDataValidator};
pub use required_columns::RequiredColumnsValidator;
pub use runner::{OptimizedValidationRunner, ValidationMode, ValidationRunner};
pub use subject::{record, Dataset, Record, Subject};

use crate::error::OutputError;

/// A single pluggable check.
///
/// `validate` returns `Ok(())` for a clean subject and an error-model value
/// describing every problem it found otherwise. Validators must be cheap to
/// reuse across runner invocations and safe to share between threads.
pub trait Validator: Send + Sync {
    fn name(&self) -> &str;

    fn validate(&self, subject: &Subject) -> Result<(), OutputError>;

    /// Optional cost/ordering hints consumed only by the optimized runner.
    /// `None` means the validator has no opinion and runs in insertion
    /// order after profiled ones.
    fn performance(&self) -> Option<PerformanceProfile> {
        None
    }
}

/// Execution hints for the optimizer: a relative cost estimate and whether
/// a failure here should short-circuit ahead of everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerformanceProfile {
    pub estimated_cost: u32,
    pub fail_fast: bool,
}

impl PerformanceProfile {
    pub fn new(estimated_cost: u32, fail_fast: bool) -> Self {
        Self {
            estimated_cost,
            fail_fast,
        }
    }

    pub fn fail_fast(estimated_cost: u32) -> Self {
        Self::new(estimated_cost, true)
    }
}
