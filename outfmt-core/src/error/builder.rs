//! Fluent builders for error values
//!
//! Builders are value builders: every `with_*` takes the builder by value
//! and returns it, so a builder that has been cloned or an error that has
//! been built can never be mutated through a later call. Suggestions
//! append, they never replace.

use super::codes::ErrorCode;
use super::context::ErrorContext;
use super::severity::ErrorSeverity;
use super::types::{
    ErrorDetails, LazyContext, LazyMessage, OutputError, ProcessingError, ValidationError,
    Violation,
};
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::sync::Arc;

/// Builder for plain and processing errors.
#[derive(Clone)]
pub struct ErrorBuilder {
    code: ErrorCode,
    severity: ErrorSeverity,
    message: Option<String>,
    lazy_message: Option<LazyMessage>,
    context: ErrorContext,
    lazy_context: Option<LazyContext>,
    suggestions: Vec<String>,
    cause: Option<super::types::Cause>,
}

impl ErrorBuilder {
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code,
            severity: ErrorSeverity::Error,
            message: None,
            lazy_message: None,
            context: ErrorContext::default(),
            lazy_context: None,
            suggestions: Vec::new(),
            cause: None,
        }
    }

    pub fn severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self.lazy_message = None;
        self
    }

    /// Supply the message lazily. The closure runs at most once, on first
    /// access, so errors that are discarded never pay for formatting.
    pub fn message_with<F>(mut self, f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.lazy_message = Some(Arc::new(f));
        self.message = None;
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.context.field = Some(field.into());
        self
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context.operation = Some(operation.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.context.value = Some(value.into());
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.context.index = Some(index);
        self
    }

    /// Replace the accumulated context wholesale.
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = context;
        self.lazy_context = None;
        self
    }

    /// Supply the full context lazily. Ignored if any eager context part
    /// (field, operation, value, index, metadata) has been set.
    pub fn context_with<F>(mut self, f: F) -> Self
    where
        F: Fn() -> ErrorContext + Send + Sync + 'static,
    {
        self.lazy_context = Some(Arc::new(f));
        self
    }

    /// Append one suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Append several suggestions.
    pub fn with_suggestions<I, S>(mut self, suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suggestions.extend(suggestions.into_iter().map(Into::into));
        self
    }

    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.cause = Some(Arc::new(cause));
        self
    }

    pub fn build(self) -> OutputError {
        OutputError::Plain(self.into_details())
    }

    /// Build a processing error instead of a plain one.
    pub fn build_processing(self, retryable: bool) -> OutputError {
        OutputError::Processing(ProcessingError {
            details: self.into_details(),
            retryable,
            partial_result: None,
        })
    }

    fn into_details(self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code, self.severity);
        if let Some(message) = self.message {
            details.message = OnceCell::from(message);
        } else {
            details.lazy_message = self.lazy_message;
        }
        if self.context.is_empty() {
            details.lazy_context = self.lazy_context;
        } else {
            details.context = OnceCell::from(self.context);
        }
        details.suggestions = dedup_preserving_order(self.suggestions);
        details.cause = self.cause;
        details
    }
}

/// Builder for validation errors, adding violation accumulation.
#[derive(Clone)]
pub struct ValidationErrorBuilder {
    inner: ErrorBuilder,
    violations: Vec<Violation>,
}

impl ValidationErrorBuilder {
    pub fn new(code: ErrorCode) -> Self {
        Self {
            inner: ErrorBuilder::new(code),
            violations: Vec::new(),
        }
    }

    pub fn severity(mut self, severity: ErrorSeverity) -> Self {
        self.inner = self.inner.severity(severity);
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.inner = self.inner.message(message);
        self
    }

    pub fn message_with<F>(mut self, f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.inner = self.inner.message_with(f);
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.inner = self.inner.with_field(field);
        self
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.inner = self.inner.with_operation(operation);
        self
    }

    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.inner = self.inner.with_context(context);
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.inner = self.inner.with_suggestion(suggestion);
        self
    }

    pub fn with_violation(mut self, violation: Violation) -> Self {
        self.violations.push(violation);
        self
    }

    pub fn with_violations<I>(mut self, violations: I) -> Self
    where
        I: IntoIterator<Item = Violation>,
    {
        self.violations.extend(violations);
        self
    }

    pub fn build(self) -> OutputError {
        OutputError::Validation(ValidationError {
            details: self.inner.into_details(),
            violations: self.violations,
        })
    }
}

/// Drop duplicate suggestions while keeping first-occurrence order.
fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::BTreeSet::new();
    items.into_iter().filter(|s| seen.insert(s.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::codes::{ERR_EMPTY_DATASET, ERR_NETWORK_TIMEOUT};
    use pretty_assertions::assert_eq;

    #[test]
    fn suggestions_append_and_dedupe() {
        let err = ErrorBuilder::new(ERR_EMPTY_DATASET)
            .message("no rows")
            .with_suggestion("pass allow_empty")
            .with_suggestions(["pass allow_empty", "add data"])
            .build();
        assert_eq!(
            err.suggestions(),
            vec!["pass allow_empty".to_string(), "add data".to_string()]
        );
    }

    #[test]
    fn build_processing_carries_retryable_flag() {
        let err = ErrorBuilder::new(ERR_NETWORK_TIMEOUT)
            .message("request timed out")
            .build_processing(true);
        assert!(err.as_processing().unwrap().retryable());
    }

    #[test]
    fn cloned_builder_does_not_affect_built_error() {
        let base = ErrorBuilder::new(ERR_EMPTY_DATASET).message("base");
        let first = base.clone().with_suggestion("only mine").build();
        let second = base.build();
        assert_eq!(first.suggestions().len(), 1);
        assert!(second.suggestions().is_empty());
    }

    #[test]
    fn eager_context_wins_over_lazy() {
        let err = ErrorBuilder::new(ERR_EMPTY_DATASET)
            .context_with(|| ErrorContext::new().with_operation("lazy"))
            .with_field("rows")
            .build();
        assert_eq!(err.context().field.as_deref(), Some("rows"));
        assert_eq!(err.context().operation, None);
    }
}
