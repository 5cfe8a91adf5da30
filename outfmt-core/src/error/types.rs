//! Core error values for the outfmt framework
//!
//! [`OutputError`] is a closed set of tagged variants rather than an open
//! trait hierarchy: every consumer (handler, resolver, reporter) matches on
//! it at compile time. Messages and contexts may be supplied lazily; the
//! closure runs at most once, on first access, and the result is cached so
//! discarded errors never pay formatting cost.
//!
//! The `Display` output layout is load-bearing. Logging and CLI surfaces
//! depend on it literally, and the integration tests assert the exact text.

use super::codes::{ErrorCode, ERR_PROCESSING_FAILURE};
use super::composite::CompositeError;
use super::context::{display_value, ErrorContext};
use super::severity::ErrorSeverity;
use once_cell::sync::{Lazy, OnceCell};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Result alias used throughout the framework.
pub type OutputResult<T> = std::result::Result<T, OutputError>;

pub(crate) type LazyMessage = Arc<dyn Fn() -> String + Send + Sync>;
pub(crate) type LazyContext = Arc<dyn Fn() -> ErrorContext + Send + Sync>;

/// Shared cause type. `Arc` rather than `Box` so error values stay `Clone`.
pub type Cause = Arc<dyn std::error::Error + Send + Sync + 'static>;

static EMPTY_CONTEXT: Lazy<ErrorContext> = Lazy::new(ErrorContext::default);

/// One failed rule inside a [`ValidationError`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub field: String,
    pub value: Value,
    pub constraint: String,
    pub message: String,
}

impl Violation {
    pub fn new(
        field: impl Into<String>,
        value: impl Into<Value>,
        constraint: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            constraint: constraint.into(),
            message: message.into(),
        }
    }
}

/// Common state shared by all non-composite error variants.
#[derive(Clone)]
pub struct ErrorDetails {
    pub(crate) code: ErrorCode,
    pub(crate) severity: ErrorSeverity,
    pub(crate) message: OnceCell<String>,
    pub(crate) lazy_message: Option<LazyMessage>,
    pub(crate) context: OnceCell<ErrorContext>,
    pub(crate) lazy_context: Option<LazyContext>,
    pub(crate) suggestions: Vec<String>,
    pub(crate) cause: Option<Cause>,
}

impl ErrorDetails {
    pub(crate) fn new(code: ErrorCode, severity: ErrorSeverity) -> Self {
        Self {
            code,
            severity,
            message: OnceCell::new(),
            lazy_message: None,
            context: OnceCell::new(),
            lazy_context: None,
            suggestions: Vec::new(),
            cause: None,
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn severity(&self) -> ErrorSeverity {
        self.severity
    }

    /// Resolve the message, running the lazy closure at most once.
    pub fn message(&self) -> &str {
        self.message.get_or_init(|| match &self.lazy_message {
            Some(f) => f(),
            None => String::new(),
        })
    }

    /// Resolve the context, running the lazy closure at most once.
    pub fn context(&self) -> &ErrorContext {
        self.context.get_or_init(|| match &self.lazy_context {
            Some(f) => f(),
            None => ErrorContext::default(),
        })
    }

    /// Suggestions, deduplicated at construction time.
    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn cause(&self) -> Option<&Cause> {
        self.cause.as_ref()
    }
}

impl fmt::Debug for ErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Deliberately avoids forcing lazy fields.
        f.debug_struct("ErrorDetails")
            .field("code", &self.code)
            .field("severity", &self.severity)
            .field("message", &self.message.get())
            .field("context", &self.context.get())
            .field("suggestions", &self.suggestions)
            .field("has_cause", &self.cause.is_some())
            .finish()
    }
}

/// Validation failure carrying zero or more [`Violation`]s.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub(crate) details: ErrorDetails,
    pub(crate) violations: Vec<Violation>,
}

impl ValidationError {
    pub fn details(&self) -> &ErrorDetails {
        &self.details
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// True iff this error aggregates more than one violation.
    pub fn is_composite(&self) -> bool {
        self.violations.len() > 1
    }

    /// Copy-on-write: returns a new error with the extra violations
    /// appended. The original is untouched.
    #[must_use]
    pub fn with_violations(&self, extra: impl IntoIterator<Item = Violation>) -> Self {
        let mut next = self.clone();
        next.violations.extend(extra);
        next
    }
}

/// Processing failure. Carries whether a retry may succeed and any partial
/// result produced before the fault.
#[derive(Debug, Clone)]
pub struct ProcessingError {
    pub(crate) details: ErrorDetails,
    pub(crate) retryable: bool,
    pub(crate) partial_result: Option<Value>,
}

impl ProcessingError {
    pub fn details(&self) -> &ErrorDetails {
        &self.details
    }

    pub fn retryable(&self) -> bool {
        self.retryable
    }

    pub fn partial_result(&self) -> Option<&Value> {
        self.partial_result.as_ref()
    }

    /// Copy-on-write: returns a new error carrying the partial result.
    #[must_use]
    pub fn with_partial_result(&self, value: impl Into<Value>) -> Self {
        let mut next = self.clone();
        next.partial_result = Some(value.into());
        next
    }
}

/// The closed error model. Everything the framework validates, handles,
/// recovers, resolves, or reports is one of these variants.
#[derive(Debug, Clone)]
pub enum OutputError {
    Plain(ErrorDetails),
    Validation(ValidationError),
    Processing(ProcessingError),
    Composite(CompositeError),
}

impl OutputError {
    pub fn code(&self) -> ErrorCode {
        match self {
            OutputError::Plain(d) => d.code(),
            OutputError::Validation(e) => e.details.code(),
            OutputError::Processing(e) => e.details.code(),
            OutputError::Composite(c) => c.code(),
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            OutputError::Plain(d) => d.severity(),
            OutputError::Validation(e) => e.details.severity(),
            OutputError::Processing(e) => e.details.severity(),
            OutputError::Composite(c) => c.severity(),
        }
    }

    pub fn context(&self) -> &ErrorContext {
        match self {
            OutputError::Plain(d) => d.context(),
            OutputError::Validation(e) => e.details.context(),
            OutputError::Processing(e) => e.details.context(),
            OutputError::Composite(c) => c.context().unwrap_or(&EMPTY_CONTEXT),
        }
    }

    pub fn suggestions(&self) -> Vec<String> {
        match self {
            OutputError::Plain(d) => d.suggestions().to_vec(),
            OutputError::Validation(e) => e.details.suggestions().to_vec(),
            OutputError::Processing(e) => e.details.suggestions().to_vec(),
            OutputError::Composite(c) => c.suggestions(),
        }
    }

    /// The message portion of the error, without code prefix, context
    /// decorations, or trailing blocks. The reporter keys top-N ranking on
    /// `(code, message)` pairs.
    pub fn message(&self) -> String {
        match self {
            OutputError::Plain(d) => d.message().to_string(),
            OutputError::Validation(e) => e.details.message().to_string(),
            OutputError::Processing(e) => e.details.message().to_string(),
            OutputError::Composite(c) => c.headline(),
        }
    }

    /// Set (or overwrite) the cause and return the error. On a composite
    /// the cause is lifted into the error model and appended instead, which
    /// matches the composite `wrap == add` rule.
    #[must_use]
    pub fn wrap<E>(self, cause: E) -> OutputError
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        match self {
            OutputError::Plain(mut d) => {
                d.cause = Some(Arc::new(cause));
                OutputError::Plain(d)
            }
            OutputError::Validation(mut e) => {
                e.details.cause = Some(Arc::new(cause));
                OutputError::Validation(e)
            }
            OutputError::Processing(mut e) => {
                e.details.cause = Some(Arc::new(cause));
                OutputError::Processing(e)
            }
            OutputError::Composite(mut c) => {
                c.add(OutputError::from_foreign(cause));
                OutputError::Composite(c)
            }
        }
    }

    /// Lift an arbitrary error into the model as a generic processing
    /// failure: fixed code, fixed message prefix, original kept as cause.
    pub fn from_foreign<E>(err: E) -> OutputError
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let mut details = ErrorDetails::new(ERR_PROCESSING_FAILURE, ErrorSeverity::Error);
        details.message = OnceCell::from(format!("unexpected error: {err}"));
        details.cause = Some(Arc::new(err));
        OutputError::Processing(ProcessingError {
            details,
            retryable: false,
            partial_result: None,
        })
    }

    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            OutputError::Validation(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_processing(&self) -> Option<&ProcessingError> {
        match self {
            OutputError::Processing(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_composite(&self) -> Option<&CompositeError> {
        match self {
            OutputError::Composite(c) => Some(c),
            _ => None,
        }
    }

    fn details(&self) -> Option<&ErrorDetails> {
        match self {
            OutputError::Plain(d) => Some(d),
            OutputError::Validation(e) => Some(&e.details),
            OutputError::Processing(e) => Some(&e.details),
            OutputError::Composite(_) => None,
        }
    }
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let OutputError::Composite(c) = self {
            return c.fmt(f);
        }
        // Safe: every non-composite variant has details.
        let details = match self.details() {
            Some(d) => d,
            None => return Ok(()),
        };

        write!(f, "[{}] {}", details.code(), details.message())?;
        let ctx = details.context();
        if let Some(field) = &ctx.field {
            write!(f, " (field: {field})")?;
        }
        if let Some(operation) = &ctx.operation {
            write!(f, " (operation: {operation})")?;
        }
        if let OutputError::Validation(e) = self {
            if !e.violations.is_empty() {
                write!(f, "\nValidation violations:\n")?;
                for v in &e.violations {
                    writeln!(
                        f,
                        "  - {}: {} (value: {})",
                        v.field,
                        v.message,
                        display_value(&v.value)
                    )?;
                }
            }
        }
        if !details.suggestions().is_empty() {
            write!(f, "\nSuggestions:\n")?;
            for s in details.suggestions() {
                writeln!(f, "  - {s}")?;
            }
        }
        if let Some(cause) = details.cause() {
            write!(f, "\nCaused by: {cause}")?;
        }
        Ok(())
    }
}

impl std::error::Error for OutputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.details()
            .and_then(|d| d.cause.as_ref())
            .map(|c| &**c as &(dyn std::error::Error + 'static))
    }
}
