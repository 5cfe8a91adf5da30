//! Ordered aggregation of multiple error values
//!
//! Collect-all validation produces one of these. Derived accessors follow
//! fixed rules: code and context come from the first contained error,
//! severity is the most severe contained, suggestions are the sorted
//! deduplicated union.

use super::codes::{ErrorCode, ERR_PROCESSING_FAILURE};
use super::context::ErrorContext;
use super::severity::ErrorSeverity;
use super::types::OutputError;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Default)]
pub struct CompositeError {
    errors: Vec<OutputError>,
}

impl CompositeError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an error. Accepts `Option` so callers can feed results
    /// through without filtering; `None` is a no-op.
    pub fn add(&mut self, err: impl Into<Option<OutputError>>) {
        if let Some(err) = err.into() {
            self.errors.push(err);
        }
    }

    /// Append every present error from the iterator.
    pub fn add_all<I>(&mut self, errors: I)
    where
        I: IntoIterator<Item = Option<OutputError>>,
    {
        self.errors.extend(errors.into_iter().flatten());
    }

    /// Equivalent to [`CompositeError::add`].
    pub fn wrap(&mut self, err: OutputError) {
        self.add(err);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn count(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[OutputError] {
        &self.errors
    }

    /// `None` when empty, the composite lifted into [`OutputError`]
    /// otherwise.
    pub fn error_or_nil(self) -> Option<OutputError> {
        if self.errors.is_empty() {
            None
        } else {
            Some(OutputError::Composite(self))
        }
    }

    /// First contained error's code; a generic processing code when empty.
    pub fn code(&self) -> ErrorCode {
        self.errors
            .first()
            .map(OutputError::code)
            .unwrap_or(ERR_PROCESSING_FAILURE)
    }

    /// Most severe contained severity; `Info` when empty.
    pub fn severity(&self) -> ErrorSeverity {
        self.errors
            .iter()
            .map(OutputError::severity)
            .min()
            .unwrap_or(ErrorSeverity::Info)
    }

    /// First contained error's context.
    pub fn context(&self) -> Option<&ErrorContext> {
        self.errors.first().map(OutputError::context)
    }

    /// Sorted, deduplicated union of all contained suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        let set: BTreeSet<String> = self
            .errors
            .iter()
            .flat_map(OutputError::suggestions)
            .collect();
        set.into_iter().collect()
    }

    /// The headline used when this composite is ranked by the reporter.
    pub(crate) fn headline(&self) -> String {
        match self.errors.len() {
            0 => "no errors".to_string(),
            1 => self.errors[0].message(),
            n => format!("multiple validation errors ({n}):"),
        }
    }
}

impl fmt::Display for CompositeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.len() {
            0 => f.write_str("no errors"),
            1 => self.errors[0].fmt(f),
            n => {
                write!(f, "multiple validation errors ({n}):")?;
                for (i, err) in self.errors.iter().enumerate() {
                    write!(f, "\n  {}. {}", i + 1, err)?;
                }
                Ok(())
            }
        }
    }
}

impl FromIterator<OutputError> for CompositeError {
    fn from_iter<I: IntoIterator<Item = OutputError>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::builder::ErrorBuilder;
    use crate::error::codes::{ERR_EMPTY_DATASET, ERR_INVALID_FORMAT, ERR_MISSING_COLUMN};
    use pretty_assertions::assert_eq;

    fn err(code: ErrorCode, severity: ErrorSeverity, msg: &str) -> OutputError {
        ErrorBuilder::new(code).severity(severity).message(msg).build()
    }

    #[test]
    fn empty_composite_is_nil() {
        let composite = CompositeError::new();
        assert!(!composite.has_errors());
        assert!(composite.error_or_nil().is_none());
    }

    #[test]
    fn add_is_nil_tolerant() {
        let mut composite = CompositeError::new();
        composite.add(None);
        composite.add(err(ERR_INVALID_FORMAT, ErrorSeverity::Error, "a"));
        composite.add_all(vec![
            None,
            Some(err(ERR_MISSING_COLUMN, ErrorSeverity::Warning, "b")),
        ]);
        assert_eq!(composite.count(), 2);
    }

    #[test]
    fn severity_is_most_severe_contained() {
        let mut composite = CompositeError::new();
        composite.add(err(ERR_INVALID_FORMAT, ErrorSeverity::Warning, "w"));
        composite.add(err(ERR_MISSING_COLUMN, ErrorSeverity::Fatal, "f"));
        composite.add(err(ERR_EMPTY_DATASET, ErrorSeverity::Error, "e"));
        assert_eq!(composite.severity(), ErrorSeverity::Fatal);
    }

    #[test]
    fn code_and_context_come_from_first_error() {
        let mut composite = CompositeError::new();
        composite.add(
            ErrorBuilder::new(ERR_MISSING_COLUMN)
                .message("first")
                .with_operation("table_content_validation")
                .build(),
        );
        composite.add(err(ERR_INVALID_FORMAT, ErrorSeverity::Error, "second"));
        assert_eq!(composite.code(), ERR_MISSING_COLUMN);
        assert_eq!(
            composite.context().unwrap().operation.as_deref(),
            Some("table_content_validation")
        );
    }

    #[test]
    fn single_child_display_equals_child_message() {
        let child = err(ERR_INVALID_FORMAT, ErrorSeverity::Error, "only one");
        let expected = child.to_string();
        let mut composite = CompositeError::new();
        composite.add(child);
        assert_eq!(composite.to_string(), expected);
    }

    #[test]
    fn multi_child_display_is_numbered() {
        let mut composite = CompositeError::new();
        composite.add(err(ERR_INVALID_FORMAT, ErrorSeverity::Error, "first problem"));
        composite.add(err(ERR_MISSING_COLUMN, ErrorSeverity::Error, "second problem"));
        let text = composite.to_string();
        assert!(text.starts_with("multiple validation errors (2):"));
        assert!(text.contains("first problem"));
        assert!(text.contains("second problem"));
        assert!(text.contains("\n  1. "));
        assert!(text.contains("\n  2. "));
    }

    #[test]
    fn suggestions_are_deduplicated_union_sorted() {
        let mut composite = CompositeError::new();
        composite.add(
            ErrorBuilder::new(ERR_INVALID_FORMAT)
                .message("a")
                .with_suggestion("use json")
                .with_suggestion("check docs")
                .build(),
        );
        composite.add(
            ErrorBuilder::new(ERR_MISSING_COLUMN)
                .message("b")
                .with_suggestion("use json")
                .build(),
        );
        assert_eq!(
            composite.suggestions(),
            vec!["check docs".to_string(), "use json".to_string()]
        );
    }
}
