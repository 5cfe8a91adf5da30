//! Error severity levels
//!
//! The ordering is inverted from intuition: lower numeric level means MORE
//! severe (`Fatal=0 < Error=1 < Warning=2 < Info=3`). Call sites must use
//! [`ErrorSeverity::at_least_as_severe`] instead of raw comparisons so the
//! inversion cannot be misread.

use serde::Serialize;
use std::fmt;

/// Four-level severity, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Fatal = 0,
    Error = 1,
    Warning = 2,
    Info = 3,
}

impl ErrorSeverity {
    /// True when `self` is at least as severe as `threshold`.
    ///
    /// Severity numbers ascend as severity descends, so this is a `<=` on
    /// the numeric level.
    pub fn at_least_as_severe(self, threshold: ErrorSeverity) -> bool {
        self.level() <= threshold.level()
    }

    /// Numeric level (0 = most severe).
    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            ErrorSeverity::Fatal => "fatal",
            ErrorSeverity::Error => "error",
            ErrorSeverity::Warning => "warning",
            ErrorSeverity::Info => "info",
        }
    }

    /// Label for a raw numeric level; out-of-range levels render as
    /// `"unknown"`.
    pub fn name_for_level(level: u8) -> &'static str {
        match Self::from_level(level) {
            Some(severity) => severity.name(),
            None => "unknown",
        }
    }

    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(ErrorSeverity::Fatal),
            1 => Some(ErrorSeverity::Error),
            2 => Some(ErrorSeverity::Warning),
            3 => Some(ErrorSeverity::Info),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
