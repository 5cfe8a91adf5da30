//! Error model for the outfmt framework
//!
//! A closed taxonomy of error kinds with stable `OUT-` codes, a four-level
//! inverted severity order, optional diagnostic context, copy-on-write
//! builders with lazy message formatting, and composite aggregation.
//!
//! Everything downstream (validation, recovery, the mode-driven handler,
//! interactive resolution, reporting) consumes these values. Nothing here
//! performs I/O.

pub mod builder;
pub mod codes;
pub mod composite;
pub mod context;
mod serialize;
pub mod severity;
pub mod types;

pub use builder::{ErrorBuilder, ValidationErrorBuilder};
pub use codes::{CodeCategory, ErrorCode};
pub use composite::CompositeError;
pub use context::{ErrorContext, OUTPUT_FORMAT_KEY};
pub use severity::ErrorSeverity;
pub use types::{
    Cause, OutputError, OutputResult, ProcessingError, ValidationError, Violation,
};
