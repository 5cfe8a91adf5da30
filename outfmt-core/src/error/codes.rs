//! Stable error code catalog for outfmt
//!
//! Every error minted by this framework carries a namespaced `OUT-` code.
//! The numeric range encodes the taxonomy:
//!
//! - `1xxx` configuration faults (pre-processing setup)
//! - `2xxx` validation faults (bad data, possibly many violations)
//! - `3xxx` processing faults (generation and I/O, may be retryable)
//! - `4xxx` runtime faults (environmental)
//!
//! Code string values are stable literals. Logging, metrics export, and the
//! auto-fix registry all key on them, so they must never be renumbered.

use serde::{Serialize, Serializer};
use std::fmt;

/// Namespaced, immutable error code (`OUT-1001`, `OUT-2003`, ...).
///
/// Codes are `Copy` and compare by their string value, which also gives the
/// ascending ordering the metrics exporter relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ErrorCode(&'static str);

impl ErrorCode {
    /// Mint a new code. Intended for embedders extending the catalog;
    /// stick to the `OUT-<range><nn>` convention so `category()` stays
    /// meaningful.
    pub const fn new(code: &'static str) -> Self {
        ErrorCode(code)
    }

    pub const fn as_str(&self) -> &'static str {
        self.0
    }

    /// Taxonomy category derived from the numeric range of the code.
    pub fn category(&self) -> CodeCategory {
        match self.0.strip_prefix("OUT-").and_then(|n| n.chars().next()) {
            Some('1') => CodeCategory::Configuration,
            Some('2') => CodeCategory::Validation,
            Some('3') => CodeCategory::Processing,
            Some('4') => CodeCategory::Runtime,
            _ => CodeCategory::Unknown,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}

/// Error taxonomy category, derived from the code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeCategory {
    Configuration,
    Validation,
    Processing,
    Runtime,
    Unknown,
}

impl CodeCategory {
    pub fn name(&self) -> &'static str {
        match self {
            CodeCategory::Configuration => "configuration",
            CodeCategory::Validation => "validation",
            CodeCategory::Processing => "processing",
            CodeCategory::Runtime => "runtime",
            CodeCategory::Unknown => "unknown",
        }
    }
}

// Configuration (1xxx)
pub const ERR_INVALID_FORMAT: ErrorCode = ErrorCode::new("OUT-1001");
pub const ERR_INVALID_CONFIG: ErrorCode = ErrorCode::new("OUT-1002");
pub const ERR_MISSING_PARAMETER: ErrorCode = ErrorCode::new("OUT-1003");

// Validation (2xxx)
pub const ERR_MISSING_COLUMN: ErrorCode = ErrorCode::new("OUT-2001");
pub const ERR_INVALID_DATA_TYPE: ErrorCode = ErrorCode::new("OUT-2002");
pub const ERR_CONSTRAINT_VIOLATION: ErrorCode = ErrorCode::new("OUT-2003");
pub const ERR_EMPTY_DATASET: ErrorCode = ErrorCode::new("OUT-2004");
pub const ERR_MALFORMED_DATA: ErrorCode = ErrorCode::new("OUT-2005");
pub const ERR_NIL_VALUE: ErrorCode = ErrorCode::new("OUT-2006");

// Processing (3xxx)
pub const ERR_PROCESSING_FAILURE: ErrorCode = ErrorCode::new("OUT-3001");
pub const ERR_FILE_WRITE: ErrorCode = ErrorCode::new("OUT-3002");
pub const ERR_S3_UPLOAD: ErrorCode = ErrorCode::new("OUT-3003");
pub const ERR_NETWORK_TIMEOUT: ErrorCode = ErrorCode::new("OUT-3004");
pub const ERR_SERVICE_UNAVAILABLE: ErrorCode = ErrorCode::new("OUT-3005");
pub const ERR_RENDER_FAILURE: ErrorCode = ErrorCode::new("OUT-3006");

// Runtime (4xxx)
pub const ERR_RESOURCE_EXHAUSTED: ErrorCode = ErrorCode::new("OUT-4001");
pub const ERR_UNSUPPORTED_PLATFORM: ErrorCode = ErrorCode::new("OUT-4002");
