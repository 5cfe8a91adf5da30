//! Mode-driven error handling policy
//!
//! The [`ErrorHandler`] is the single policy point between error producers
//! (validators, renderers) and outcomes. Its mode decides whether an error
//! is collected, suppressed, escalated, or handed to interactive
//! resolution:
//!
//! - **Strict**: warnings/infos invoke the optional callback and vanish;
//!   errors and fatals are returned immediately, never collected.
//! - **Lenient**: everything is collected; only fatals are returned.
//! - **Interactive**: warnings/infos behave as lenient, fatals return
//!   immediately uncollected, errors go to the attached resolver.
//!
//! A recovery engine is strictly opt-in: when attached it gets one shot at
//! Error-severity failures before the mode policy applies. The internal
//! collections are guarded by a reader/writer lock; concurrent workers may
//! share one handler instance.

use crate::error::{ErrorSeverity, OutputError};
use crate::recovery::{RecoveryContext, RecoveryHandler};
use crate::report::ErrorSummary;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{debug, warn};

/// Handler operating mode. May be switched at any time; switching never
/// clears collected history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerMode {
    Strict,
    Lenient,
    Interactive,
}

/// Successful handling outcome. `RetryRequested` signals that the user
/// chose to retry during interactive resolution; re-execution is the
/// caller's responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    Resolved,
    RetryRequested,
}

/// How an interactive resolution ended. Produced by the resolver attached
/// via [`ErrorHandler::with_resolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionOutcome {
    Aborted,
    Skipped,
    Fixed,
    RetryRequested,
}

/// Interactive resolution seam. Implemented by
/// [`crate::interactive::InteractiveResolver`]; tests substitute scripted
/// implementations.
pub trait Resolve: Send + Sync {
    fn resolve(&self, err: &OutputError) -> ResolutionOutcome;
}

pub type WarningCallback = Arc<dyn Fn(&OutputError) + Send + Sync>;

/// Lift an arbitrary error into the error model as a generic processing
/// failure. Every format-write path routes its foreign errors through this
/// before handling.
pub fn wrap_error<E>(err: E) -> OutputError
where
    E: std::error::Error + Send + Sync + 'static,
{
    OutputError::from_foreign(err)
}

struct HandlerState {
    mode: HandlerMode,
    collected: Vec<OutputError>,
    session_start: DateTime<Utc>,
}

pub struct ErrorHandler {
    state: RwLock<HandlerState>,
    warning_callback: Option<WarningCallback>,
    resolver: Option<Arc<dyn Resolve>>,
    recovery: Option<(Arc<RecoveryHandler>, Mutex<RecoveryContext>)>,
}

impl ErrorHandler {
    pub fn new(mode: HandlerMode) -> Self {
        Self {
            state: RwLock::new(HandlerState {
                mode,
                collected: Vec::new(),
                session_start: Utc::now(),
            }),
            warning_callback: None,
            resolver: None,
            recovery: None,
        }
    }

    /// Invoked for every Warning/Info-severity error the handler sees.
    pub fn with_warning_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&OutputError) + Send + Sync + 'static,
    {
        self.warning_callback = Some(Arc::new(callback));
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn Resolve>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Attach a recovery engine. Absent this, no recovery ever runs.
    pub fn with_recovery(mut self, recovery: RecoveryHandler, ctx: RecoveryContext) -> Self {
        self.recovery = Some((Arc::new(recovery), Mutex::new(ctx)));
        self
    }

    pub fn mode(&self) -> HandlerMode {
        self.state.read().mode
    }

    pub fn set_mode(&self, mode: HandlerMode) {
        self.state.write().mode = mode;
    }

    /// Pass `Ok` results straight through; route errors into
    /// [`ErrorHandler::handle_error`].
    pub fn handle_result(&self, result: Result<(), OutputError>) -> Result<Handled, OutputError> {
        match result {
            Ok(()) => Ok(Handled::Resolved),
            Err(err) => self.handle_error(err),
        }
    }

    /// Lift a foreign error into the model, then handle it.
    pub fn handle_foreign<E>(&self, err: E) -> Result<Handled, OutputError>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.handle_error(wrap_error(err))
    }

    pub fn handle_error(&self, err: OutputError) -> Result<Handled, OutputError> {
        let severity = err.severity();
        let mode = self.mode();

        // Opt-in recovery gets one shot at Error-severity failures before
        // the mode policy applies. Fatal is never recovered.
        if severity == ErrorSeverity::Error && self.try_recover(&err) {
            return Ok(Handled::Resolved);
        }

        match mode {
            HandlerMode::Strict => match severity {
                ErrorSeverity::Warning | ErrorSeverity::Info => {
                    self.notify(&err);
                    Ok(Handled::Resolved)
                }
                ErrorSeverity::Error | ErrorSeverity::Fatal => Err(err),
            },
            HandlerMode::Lenient => {
                if matches!(severity, ErrorSeverity::Warning | ErrorSeverity::Info) {
                    self.notify(&err);
                }
                self.collect(err.clone());
                if severity == ErrorSeverity::Fatal {
                    Err(err)
                } else {
                    debug!(code = %err.code(), severity = %severity, "error suppressed");
                    Ok(Handled::Resolved)
                }
            }
            HandlerMode::Interactive => match severity {
                ErrorSeverity::Warning | ErrorSeverity::Info => {
                    self.notify(&err);
                    self.collect(err);
                    Ok(Handled::Resolved)
                }
                ErrorSeverity::Fatal => Err(err),
                ErrorSeverity::Error => match &self.resolver {
                    Some(resolver) => match resolver.resolve(&err) {
                        ResolutionOutcome::Aborted => Err(err),
                        ResolutionOutcome::Skipped | ResolutionOutcome::Fixed => {
                            self.collect(err);
                            Ok(Handled::Resolved)
                        }
                        ResolutionOutcome::RetryRequested => Ok(Handled::RetryRequested),
                    },
                    None => {
                        warn!(code = %err.code(), "interactive mode without resolver, escalating");
                        Err(err)
                    }
                },
            },
        }
    }

    /// Empty the collected list and reset the session clock. The mode is
    /// untouched.
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.collected.clear();
        state.session_start = Utc::now();
    }

    pub fn has_errors(&self) -> bool {
        !self.state.read().collected.is_empty()
    }

    /// True if any collected error is at least as severe as `threshold`.
    pub fn has_errors_with_severity(&self, threshold: ErrorSeverity) -> bool {
        self.state
            .read()
            .collected
            .iter()
            .any(|err| err.severity().at_least_as_severe(threshold))
    }

    /// Snapshot of everything collected so far.
    pub fn collected_errors(&self) -> Vec<OutputError> {
        self.state.read().collected.clone()
    }

    pub fn summary(&self) -> ErrorSummary {
        let state = self.state.read();
        let mut summary = ErrorSummary::from_errors(state.collected.iter());
        if summary.total > 0 {
            summary.first_seen = Some(state.session_start);
            summary.last_seen = Some(Utc::now());
        }
        summary
    }

    fn notify(&self, err: &OutputError) {
        if let Some(callback) = &self.warning_callback {
            callback(err);
        }
    }

    fn collect(&self, err: OutputError) {
        self.state.write().collected.push(err);
    }

    fn try_recover(&self, err: &OutputError) -> bool {
        let Some((recovery, ctx)) = &self.recovery else {
            return false;
        };
        let mut ctx = ctx.lock();
        recovery.recover(err.clone(), &mut ctx).is_ok()
    }
}
