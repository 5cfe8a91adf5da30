//! Priority-ordered error recovery
//!
//! A [`RecoveryStrategy`] attempts to transform or repair a failure:
//! falling back to another output format, substituting a default value, or
//! proposing a retry plan. The [`RecoveryHandler`] tries applicable
//! strategies in ascending priority order and stops at the first success.
//!
//! Recovery is opt-in: nothing invokes it unless a handler is explicitly
//! attached. Strategies are synchronous and never sleep; the retry strategy
//! in particular only reports a plan for the caller to execute.

pub mod backoff;
pub mod strategies;

pub use backoff::ExponentialBackoff;
pub use strategies::{
    default_retry_predicate, CompositeStrategy, DefaultValueStrategy, FormatFallbackStrategy,
    RetryStrategy,
};

use crate::error::{OutputError, OUTPUT_FORMAT_KEY};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// What a successful strategy produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Recovered {
    /// Rendering should move to this output format.
    Format(String),
    /// The named field should use this substitute value.
    Value { field: String, value: Value },
    /// The caller should re-run the operation per this plan. No retry is
    /// executed internally.
    RetryPlan {
        max_attempts: u32,
        next_delay: Duration,
    },
}

/// Mutable state threaded through recovery attempts: the current output
/// format, per-strategy bookkeeping (retry attempt counts), and the last
/// successful outcome.
#[derive(Debug, Clone, Default)]
pub struct RecoveryContext {
    values: BTreeMap<String, Value>,
    last_outcome: Option<Recovered>,
}

impl RecoveryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_format(mut self, format: impl Into<String>) -> Self {
        self.set_output_format(format);
        self
    }

    pub fn set_output_format(&mut self, format: impl Into<String>) {
        self.values
            .insert(OUTPUT_FORMAT_KEY.to_string(), Value::String(format.into()));
    }

    pub fn output_format(&self) -> Option<&str> {
        self.values.get(OUTPUT_FORMAT_KEY).and_then(Value::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn last_outcome(&self) -> Option<&Recovered> {
        self.last_outcome.as_ref()
    }

    fn record(&mut self, outcome: Recovered) {
        if let Recovered::Format(format) = &outcome {
            self.set_output_format(format.clone());
        }
        self.last_outcome = Some(outcome);
    }
}

/// A single repair attempt. Lower priority numbers are tried first.
pub trait RecoveryStrategy: Send + Sync {
    fn name(&self) -> &str;

    fn priority(&self) -> i32;

    fn applicable_for(&self, err: &OutputError) -> bool;

    fn apply(
        &self,
        err: &OutputError,
        ctx: &mut RecoveryContext,
    ) -> Result<Recovered, OutputError>;
}

/// Runs strategies in ascending priority order.
#[derive(Default)]
pub struct RecoveryHandler {
    strategies: Vec<Arc<dyn RecoveryStrategy>>,
}

impl RecoveryHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(mut self, strategy: impl RecoveryStrategy + 'static) -> Self {
        self.add_strategy(Arc::new(strategy));
        self
    }

    pub fn add_strategy(&mut self, strategy: Arc<dyn RecoveryStrategy>) {
        self.strategies.push(strategy);
        self.strategies.sort_by_key(|s| s.priority());
    }

    /// Attempt recovery. If no strategy is applicable the error comes back
    /// unchanged; otherwise strategies run in priority order and the first
    /// success wins, its outcome recorded in `ctx`.
    pub fn recover(
        &self,
        err: OutputError,
        ctx: &mut RecoveryContext,
    ) -> Result<(), OutputError> {
        let applicable: Vec<&Arc<dyn RecoveryStrategy>> = self
            .strategies
            .iter()
            .filter(|s| s.applicable_for(&err))
            .collect();
        if applicable.is_empty() {
            return Err(err);
        }
        for strategy in applicable {
            match strategy.apply(&err, ctx) {
                Ok(outcome) => {
                    info!(
                        strategy = strategy.name(),
                        code = %err.code(),
                        "error recovered"
                    );
                    ctx.record(outcome);
                    return Ok(());
                }
                Err(strategy_err) => {
                    debug!(
                        strategy = strategy.name(),
                        error = %strategy_err,
                        "recovery strategy failed"
                    );
                }
            }
        }
        Err(err)
    }
}
