//! Built-in recovery strategies
//!
//! Priorities: format fallback (10) before default values (20), retry last
//! (100) so cheaper repairs are always preferred over re-running work.

use super::backoff::ExponentialBackoff;
use super::{Recovered, RecoveryContext, RecoveryStrategy};
use crate::error::codes::{
    ERR_FILE_WRITE, ERR_INVALID_FORMAT, ERR_NETWORK_TIMEOUT, ERR_PROCESSING_FAILURE,
    ERR_RENDER_FAILURE, ERR_S3_UPLOAD, ERR_SERVICE_UNAVAILABLE,
};
use crate::error::{ErrorBuilder, ErrorSeverity, OutputError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

const RETRY_ATTEMPT_KEY: &str = "retry_attempt";

/// Advances the output format to the next entry of a configured chain.
pub struct FormatFallbackStrategy {
    chain: Vec<String>,
}

impl FormatFallbackStrategy {
    pub fn new<I, S>(chain: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            chain: chain.into_iter().map(Into::into).collect(),
        }
    }

    fn no_fallback(&self) -> OutputError {
        ErrorBuilder::new(ERR_INVALID_FORMAT)
            .message("no fallback format available")
            .build()
    }
}

impl RecoveryStrategy for FormatFallbackStrategy {
    fn name(&self) -> &str {
        "format_fallback"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn applicable_for(&self, err: &OutputError) -> bool {
        err.context().output_format().is_some()
            || matches!(err.code(), c if c == ERR_INVALID_FORMAT || c == ERR_RENDER_FAILURE)
    }

    fn apply(
        &self,
        err: &OutputError,
        ctx: &mut RecoveryContext,
    ) -> Result<Recovered, OutputError> {
        let current = err
            .context()
            .output_format()
            .map(str::to_owned)
            .or_else(|| ctx.output_format().map(str::to_owned))
            .ok_or_else(|| self.no_fallback())?;
        let position = self
            .chain
            .iter()
            .position(|f| *f == current)
            .ok_or_else(|| self.no_fallback())?;
        match self.chain.get(position + 1) {
            Some(next) => Ok(Recovered::Format(next.clone())),
            None => Err(self.no_fallback()),
        }
    }
}

/// Substitutes a configured default for the field named in the error's
/// context.
pub struct DefaultValueStrategy {
    defaults: BTreeMap<String, Value>,
}

impl DefaultValueStrategy {
    pub fn new<I, K, V>(defaults: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            defaults: defaults
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl RecoveryStrategy for DefaultValueStrategy {
    fn name(&self) -> &str {
        "default_value"
    }

    fn priority(&self) -> i32 {
        20
    }

    fn applicable_for(&self, err: &OutputError) -> bool {
        err.context()
            .field
            .as_ref()
            .is_some_and(|field| self.defaults.contains_key(field))
    }

    fn apply(
        &self,
        err: &OutputError,
        _ctx: &mut RecoveryContext,
    ) -> Result<Recovered, OutputError> {
        let field = err.context().field.clone().ok_or_else(|| {
            ErrorBuilder::new(err.code())
                .message("no field set in error context")
                .build()
        })?;
        match self.defaults.get(&field) {
            Some(value) => Ok(Recovered::Value {
                field,
                value: value.clone(),
            }),
            None => Err(ErrorBuilder::new(err.code())
                .message(format!("no default value configured for field {field}"))
                .build()),
        }
    }
}

/// Default transient-failure predicate: a fixed set of transient codes, or
/// any processing error marked retryable.
pub fn default_retry_predicate(err: &OutputError) -> bool {
    let transient = [
        ERR_NETWORK_TIMEOUT,
        ERR_SERVICE_UNAVAILABLE,
        ERR_S3_UPLOAD,
        ERR_FILE_WRITE,
    ];
    transient.contains(&err.code())
        || err.as_processing().is_some_and(|p| p.retryable())
}

/// Reports a retry plan for the caller to execute. Never sleeps or loops
/// itself; lowest priority of the built-ins.
pub struct RetryStrategy {
    backoff: ExponentialBackoff,
    predicate: Arc<dyn Fn(&OutputError) -> bool + Send + Sync>,
}

impl RetryStrategy {
    pub fn new(backoff: ExponentialBackoff) -> Self {
        Self {
            backoff,
            predicate: Arc::new(default_retry_predicate),
        }
    }

    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&OutputError) -> bool + Send + Sync + 'static,
    {
        self.predicate = Arc::new(predicate);
        self
    }
}

impl RecoveryStrategy for RetryStrategy {
    fn name(&self) -> &str {
        "retry"
    }

    fn priority(&self) -> i32 {
        100
    }

    fn applicable_for(&self, err: &OutputError) -> bool {
        (self.predicate)(err)
    }

    fn apply(
        &self,
        _err: &OutputError,
        ctx: &mut RecoveryContext,
    ) -> Result<Recovered, OutputError> {
        let attempt = ctx
            .get(RETRY_ATTEMPT_KEY)
            .and_then(Value::as_u64)
            .unwrap_or(0) as u32;
        if attempt >= self.backoff.max_attempts() {
            return Err(ErrorBuilder::new(ERR_PROCESSING_FAILURE)
                .severity(ErrorSeverity::Error)
                .message(format!(
                    "retry attempts exhausted after {attempt} tries"
                ))
                .build());
        }
        ctx.set(RETRY_ATTEMPT_KEY, u64::from(attempt) + 1);
        Ok(Recovered::RetryPlan {
            max_attempts: self.backoff.max_attempts(),
            next_delay: self.backoff.next_delay(attempt),
        })
    }
}

/// Tries each applicable sub-strategy in listed order, first success wins.
pub struct CompositeStrategy {
    name: String,
    priority: i32,
    strategies: Vec<Arc<dyn RecoveryStrategy>>,
}

impl CompositeStrategy {
    pub fn new(name: impl Into<String>, priority: i32) -> Self {
        Self {
            name: name.into(),
            priority,
            strategies: Vec::new(),
        }
    }

    pub fn with_strategy(mut self, strategy: impl RecoveryStrategy + 'static) -> Self {
        self.strategies.push(Arc::new(strategy));
        self
    }
}

impl RecoveryStrategy for CompositeStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn applicable_for(&self, err: &OutputError) -> bool {
        self.strategies.iter().any(|s| s.applicable_for(err))
    }

    fn apply(
        &self,
        err: &OutputError,
        ctx: &mut RecoveryContext,
    ) -> Result<Recovered, OutputError> {
        let mut last_err = None;
        for strategy in &self.strategies {
            if !strategy.applicable_for(err) {
                continue;
            }
            match strategy.apply(err, ctx) {
                Ok(outcome) => return Ok(outcome),
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| err.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::codes::{ERR_EMPTY_DATASET, ERR_MISSING_PARAMETER};
    use crate::error::ErrorContext;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;

    fn format_err(format: &str) -> OutputError {
        ErrorBuilder::new(ERR_RENDER_FAILURE)
            .message("render failed")
            .with_context(ErrorContext::new().with_output_format(format))
            .build()
    }

    #[test]
    fn format_fallback_advances_along_the_chain() {
        let strategy = FormatFallbackStrategy::new(["table", "csv", "json"]);
        let mut ctx = RecoveryContext::new();
        let outcome = strategy.apply(&format_err("table"), &mut ctx).unwrap();
        assert_eq!(outcome, Recovered::Format("csv".to_string()));
    }

    #[test]
    fn format_fallback_fails_at_end_of_chain() {
        let strategy = FormatFallbackStrategy::new(["table", "csv", "json"]);
        let mut ctx = RecoveryContext::new();
        let err = strategy.apply(&format_err("json"), &mut ctx).unwrap_err();
        assert!(err.to_string().contains("no fallback format available"));
    }

    #[test]
    fn format_fallback_fails_for_unknown_format() {
        let strategy = FormatFallbackStrategy::new(["table", "csv"]);
        let mut ctx = RecoveryContext::new();
        assert!(strategy.apply(&format_err("xml"), &mut ctx).is_err());
    }

    #[test]
    fn default_value_requires_mapped_field() {
        let strategy = DefaultValueStrategy::new([("name", json!("unknown"))]);
        let mapped = ErrorBuilder::new(ERR_MISSING_PARAMETER)
            .message("missing")
            .with_field("name")
            .build();
        let unmapped = ErrorBuilder::new(ERR_MISSING_PARAMETER)
            .message("missing")
            .with_field("other")
            .build();
        assert!(strategy.applicable_for(&mapped));
        assert!(!strategy.applicable_for(&unmapped));
        let mut ctx = RecoveryContext::new();
        let outcome = strategy.apply(&mapped, &mut ctx).unwrap();
        assert_eq!(
            outcome,
            Recovered::Value {
                field: "name".to_string(),
                value: json!("unknown")
            }
        );
    }

    #[test]
    fn default_retry_predicate_matches_transient_codes_and_retryable() {
        for code in [
            ERR_NETWORK_TIMEOUT,
            ERR_SERVICE_UNAVAILABLE,
            ERR_S3_UPLOAD,
            ERR_FILE_WRITE,
        ] {
            let err = ErrorBuilder::new(code).message("x").build();
            assert!(default_retry_predicate(&err), "{code} should be retryable");
        }
        let retryable = ErrorBuilder::new(ERR_EMPTY_DATASET)
            .message("x")
            .build_processing(true);
        assert!(default_retry_predicate(&retryable));
        let not_retryable = ErrorBuilder::new(ERR_EMPTY_DATASET)
            .message("x")
            .build_processing(false);
        assert!(!default_retry_predicate(&not_retryable));
        let plain = ErrorBuilder::new(ERR_EMPTY_DATASET).message("x").build();
        assert!(!default_retry_predicate(&plain));
    }

    #[test]
    fn retry_strategy_reports_a_plan_and_counts_attempts() {
        let backoff =
            ExponentialBackoff::new(Duration::from_millis(100), Duration::from_secs(1), 2);
        let strategy = RetryStrategy::new(backoff);
        let err = ErrorBuilder::new(ERR_NETWORK_TIMEOUT).message("x").build();
        let mut ctx = RecoveryContext::new();
        assert_eq!(
            strategy.apply(&err, &mut ctx).unwrap(),
            Recovered::RetryPlan {
                max_attempts: 2,
                next_delay: Duration::from_millis(100)
            }
        );
        assert_eq!(
            strategy.apply(&err, &mut ctx).unwrap(),
            Recovered::RetryPlan {
                max_attempts: 2,
                next_delay: Duration::from_millis(200)
            }
        );
        // Third attempt exceeds max_attempts; exhaustion is a framework
        // fault, not a transient condition.
        let exhausted = strategy.apply(&err, &mut ctx).unwrap_err();
        assert_eq!(exhausted.code(), ERR_PROCESSING_FAILURE);
        assert!(exhausted.to_string().contains("retry attempts exhausted"));
    }

    #[test]
    fn composite_takes_first_applicable_success() {
        let strategy = CompositeStrategy::new("fallbacks", 5)
            .with_strategy(DefaultValueStrategy::new([("never", json!(0))]))
            .with_strategy(FormatFallbackStrategy::new(["table", "csv"]));
        let mut ctx = RecoveryContext::new();
        let outcome = strategy.apply(&format_err("table"), &mut ctx).unwrap();
        assert_eq!(outcome, Recovered::Format("csv".to_string()));
    }
}
