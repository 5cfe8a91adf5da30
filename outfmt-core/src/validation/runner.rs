//! Validator execution
//!
//! Two runners share one contract: run every registered validator against a
//! subject and report failures. [`ValidationRunner`] executes in insertion
//! order. [`OptimizedValidationRunner`] reorders execution for latency
//! (fail-fast validators first, then cheap ones) without ever changing the
//! pass/fail verdict, only which failure surfaces first.

use super::{Subject, Validator};
use crate::error::{CompositeError, OutputError};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// How failures are accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Return the first failing validator's error.
    FailFast,
    /// Run everything and aggregate failures into a composite.
    CollectAll,
}

pub struct ValidationRunner {
    mode: ValidationMode,
    validators: Vec<Arc<dyn Validator>>,
}

impl ValidationRunner {
    pub fn new(mode: ValidationMode) -> Self {
        Self {
            mode,
            validators: Vec::new(),
        }
    }

    pub fn add_validator(&mut self, validator: impl Validator + 'static) {
        self.validators.push(Arc::new(validator));
    }

    pub fn add_shared(&mut self, validator: Arc<dyn Validator>) {
        self.validators.push(validator);
    }

    pub fn validator_count(&self) -> usize {
        self.validators.len()
    }

    pub fn run(&self, subject: &Subject) -> Result<(), OutputError> {
        run_in_order(&self.validators, (0..self.validators.len()).collect(), self.mode, subject)
    }
}

/// Runner that lazily recomputes a stable execution order whenever the
/// validator set changes.
///
/// Order: validators with a fail-fast performance profile first (original
/// relative order preserved), then profiled validators by ascending
/// estimated cost, then everything unprofiled in original order.
pub struct OptimizedValidationRunner {
    mode: ValidationMode,
    validators: Vec<Arc<dyn Validator>>,
    order: RwLock<Option<Vec<usize>>>,
}

impl OptimizedValidationRunner {
    pub fn new(mode: ValidationMode) -> Self {
        Self {
            mode,
            validators: Vec::new(),
            order: RwLock::new(None),
        }
    }

    pub fn add_validator(&mut self, validator: impl Validator + 'static) {
        self.validators.push(Arc::new(validator));
        *self.order.write() = None;
    }

    pub fn add_shared(&mut self, validator: Arc<dyn Validator>) {
        self.validators.push(validator);
        *self.order.write() = None;
    }

    pub fn run(&self, subject: &Subject) -> Result<(), OutputError> {
        run_in_order(&self.validators, self.execution_order(), self.mode, subject)
    }

    /// Current execution order as validator indices. Exposed for tests and
    /// diagnostics.
    pub fn execution_order(&self) -> Vec<usize> {
        if let Some(order) = self.order.read().as_ref() {
            return order.clone();
        }
        let order = compute_order(&self.validators);
        *self.order.write() = Some(order.clone());
        order
    }
}

fn compute_order(validators: &[Arc<dyn Validator>]) -> Vec<usize> {
    let mut fail_fast = Vec::new();
    let mut costed: Vec<(u32, usize)> = Vec::new();
    let mut rest = Vec::new();
    for (i, v) in validators.iter().enumerate() {
        match v.performance() {
            Some(profile) if profile.fail_fast => fail_fast.push(i),
            Some(profile) => costed.push((profile.estimated_cost, i)),
            None => rest.push(i),
        }
    }
    // Stable sort keeps original order among equal costs.
    costed.sort_by_key(|(cost, _)| *cost);
    fail_fast
        .into_iter()
        .chain(costed.into_iter().map(|(_, i)| i))
        .chain(rest)
        .collect()
}

fn run_in_order(
    validators: &[Arc<dyn Validator>],
    order: Vec<usize>,
    mode: ValidationMode,
    subject: &Subject,
) -> Result<(), OutputError> {
    match mode {
        ValidationMode::FailFast => {
            for i in order {
                let validator = &validators[i];
                if let Err(err) = validator.validate(subject) {
                    debug!(validator = validator.name(), code = %err.code(), "validation failed");
                    return Err(err);
                }
            }
            Ok(())
        }
        ValidationMode::CollectAll => {
            let mut composite = CompositeError::new();
            for i in order {
                let validator = &validators[i];
                if let Err(err) = validator.validate(subject) {
                    debug!(validator = validator.name(), code = %err.code(), "validation failed");
                    composite.add(err);
                }
            }
            match composite.error_or_nil() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::codes::ERR_CONSTRAINT_VIOLATION;
    use crate::error::ErrorBuilder;
    use crate::validation::{Dataset, PerformanceProfile};

    struct FixedValidator {
        name: &'static str,
        fails: bool,
        profile: Option<PerformanceProfile>,
    }

    impl Validator for FixedValidator {
        fn name(&self) -> &str {
            self.name
        }

        fn validate(&self, _subject: &Subject) -> Result<(), OutputError> {
            if self.fails {
                Err(ErrorBuilder::new(ERR_CONSTRAINT_VIOLATION)
                    .message(format!("{} failed", self.name))
                    .build())
            } else {
                Ok(())
            }
        }

        fn performance(&self) -> Option<PerformanceProfile> {
            self.profile
        }
    }

    fn v(name: &'static str, fails: bool, profile: Option<PerformanceProfile>) -> FixedValidator {
        FixedValidator { name, fails, profile }
    }

    fn subject() -> Subject {
        Subject::Dataset(Dataset::new(["a"]))
    }

    #[test]
    fn fail_fast_returns_first_failure() {
        let mut runner = ValidationRunner::new(ValidationMode::FailFast);
        runner.add_validator(v("ok", false, None));
        runner.add_validator(v("boom", true, None));
        runner.add_validator(v("later", true, None));
        let err = runner.run(&subject()).unwrap_err();
        assert!(err.to_string().contains("boom failed"));
    }

    #[test]
    fn collect_all_aggregates_into_composite() {
        let mut runner = ValidationRunner::new(ValidationMode::CollectAll);
        runner.add_validator(v("one", true, None));
        runner.add_validator(v("two", true, None));
        runner.add_validator(v("fine", false, None));
        let err = runner.run(&subject()).unwrap_err();
        let composite = err.as_composite().expect("composite");
        assert_eq!(composite.count(), 2);
    }

    #[test]
    fn collect_all_passes_when_nothing_fails() {
        let mut runner = ValidationRunner::new(ValidationMode::CollectAll);
        runner.add_validator(v("fine", false, None));
        assert!(runner.run(&subject()).is_ok());
    }

    #[test]
    fn optimizer_orders_fail_fast_then_cost_then_rest() {
        let mut runner = OptimizedValidationRunner::new(ValidationMode::CollectAll);
        runner.add_validator(v("costly", false, Some(PerformanceProfile::new(90, false))));
        runner.add_validator(v("plain_a", false, None));
        runner.add_validator(v("gate", false, Some(PerformanceProfile::fail_fast(1))));
        runner.add_validator(v("cheap", false, Some(PerformanceProfile::new(5, false))));
        runner.add_validator(v("plain_b", false, None));
        assert_eq!(runner.execution_order(), vec![2, 3, 0, 1, 4]);
    }

    #[test]
    fn order_recomputes_after_add() {
        let mut runner = OptimizedValidationRunner::new(ValidationMode::FailFast);
        runner.add_validator(v("plain", false, None));
        assert_eq!(runner.execution_order(), vec![0]);
        runner.add_validator(v("gate", false, Some(PerformanceProfile::fail_fast(1))));
        assert_eq!(runner.execution_order(), vec![1, 0]);
    }

    #[test]
    fn reordering_never_changes_the_verdict() {
        for failing in 0..3 {
            let mut plain = ValidationRunner::new(ValidationMode::CollectAll);
            let mut optimized = OptimizedValidationRunner::new(ValidationMode::CollectAll);
            for i in 0..3 {
                let profile = match i {
                    0 => Some(PerformanceProfile::new(80, false)),
                    1 => Some(PerformanceProfile::fail_fast(1)),
                    _ => None,
                };
                plain.add_validator(v("x", i == failing, profile));
                optimized.add_validator(v("x", i == failing, profile));
            }
            let subject = subject();
            assert_eq!(
                plain.run(&subject).is_err(),
                optimized.run(&subject).is_err()
            );
        }
    }
}
