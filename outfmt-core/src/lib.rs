//! Error taxonomy, validation, and recovery for data-rendering pipelines.
//!
//! Everything a format writer can get wrong is expressed as one
//! [`OutputError`] value carrying a stable `OUT-xxxx` code, a severity, a
//! lazily-built message, structured context, and remediation suggestions.
//! Around that model sit four cooperating subsystems:
//!
//! - [`validation`]: pluggable pre-render checks over datasets, documents,
//!   and text, with cost-aware execution ordering.
//! - [`recovery`]: priority-ordered repair strategies (format fallback,
//!   default values, retry plans).
//! - [`handler`]: the mode-driven policy point deciding whether an error is
//!   suppressed, collected, escalated, or resolved interactively.
//! - [`report`]: session-long aggregation with text and metrics exports.
//!
//! ```
//! use outfmt_core::error::codes::ERR_MISSING_COLUMN;
//! use outfmt_core::error::ErrorBuilder;
//! use outfmt_core::handler::{ErrorHandler, HandlerMode};
//!
//! let handler = ErrorHandler::new(HandlerMode::Lenient);
//! let err = ErrorBuilder::new(ERR_MISSING_COLUMN)
//!     .message("missing required columns: id")
//!     .build();
//! assert!(handler.handle_error(err).is_ok());
//! assert_eq!(handler.summary().total, 1);
//! ```

pub mod error;
pub mod handler;
pub mod interactive;
pub mod recovery;
pub mod report;
pub mod validation;

pub use error::{
    CompositeError, ErrorBuilder, ErrorCode, ErrorContext, ErrorSeverity, OutputError,
    OutputResult, ProcessingError, ValidationError, ValidationErrorBuilder, Violation,
};
pub use handler::{wrap_error, ErrorHandler, Handled, HandlerMode};
pub use recovery::{RecoveryContext, RecoveryHandler, RecoveryStrategy};
pub use report::{ErrorReporter, ErrorSummary};
pub use validation::{Subject, ValidationRunner, Validator};
