//! Interactive error resolution
//!
//! When the handler runs in interactive mode, Error-severity failures are
//! presented to the user with a menu: abort, skip, retry (for retryable
//! processing errors), and any automatic fixes registered for the error's
//! code. Input arrives through the [`LineSource`] seam so tests and
//! non-terminal embeddings can script the session.

pub mod fixes;
pub mod retry;
pub mod workflow;

pub use fixes::{default_fixes, AutoFix, AutoFixRegistry};
pub use retry::RetryMechanism;
pub use workflow::{GuidedWorkflow, WorkflowError, WorkflowStep};

use crate::error::{ErrorSeverity, OutputError};
use crate::handler::{Resolve, ResolutionOutcome};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use tracing::warn;

const DEFAULT_PROMPT_RETRIES: u32 = 3;

/// One line of user input. `Ok(None)` means end of input.
pub trait LineSource: Send {
    fn read_line(&mut self) -> io::Result<Option<String>>;
}

/// Reads from standard input.
#[derive(Default)]
pub struct StdinLineSource;

impl LineSource for StdinLineSource {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Feeds a fixed sequence of answers, then end of input.
#[derive(Default)]
pub struct ScriptedLineSource {
    lines: VecDeque<String>,
}

impl ScriptedLineSource {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

impl LineSource for ScriptedLineSource {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.lines.pop_front())
    }
}

enum MenuChoice {
    Abort,
    Skip,
    Retry,
    Fix(usize),
}

/// Prompts the user to resolve an error. Attached to the handler through
/// [`crate::handler::ErrorHandler::with_resolver`].
pub struct InteractiveResolver {
    input: Mutex<Box<dyn LineSource>>,
    output: Mutex<Box<dyn Write + Send>>,
    fixes: AutoFixRegistry,
    max_prompt_retries: u32,
}

impl InteractiveResolver {
    /// Terminal-backed resolver with the stock fix catalog.
    pub fn stdio() -> Self {
        Self::new(StdinLineSource, io::stderr())
    }

    pub fn new(input: impl LineSource + 'static, output: impl Write + Send + 'static) -> Self {
        Self {
            input: Mutex::new(Box::new(input)),
            output: Mutex::new(Box::new(output)),
            fixes: default_fixes(),
            max_prompt_retries: DEFAULT_PROMPT_RETRIES,
        }
    }

    pub fn with_fixes(mut self, fixes: AutoFixRegistry) -> Self {
        self.fixes = fixes;
        self
    }

    pub fn with_max_prompt_retries(mut self, retries: u32) -> Self {
        self.max_prompt_retries = retries;
        self
    }

    fn default_outcome(err: &OutputError) -> ResolutionOutcome {
        match err.severity() {
            ErrorSeverity::Warning | ErrorSeverity::Info => ResolutionOutcome::Skipped,
            ErrorSeverity::Error | ErrorSeverity::Fatal => ResolutionOutcome::Aborted,
        }
    }

    fn offer_retry(err: &OutputError) -> bool {
        err.as_processing().is_some_and(|p| p.retryable())
    }

    fn print_menu(&self, out: &mut dyn Write, err: &OutputError) -> io::Result<()> {
        writeln!(out, "\nerror: {err}")?;
        writeln!(out, "severity: {}", err.severity().name())?;
        writeln!(out, "\nHow would you like to proceed?")?;
        writeln!(out, "  [a] abort")?;
        writeln!(out, "  [s] skip this error")?;
        if Self::offer_retry(err) {
            writeln!(out, "  [r] retry the operation")?;
        }
        for (i, fix) in self.fixes.fixes_for(err.code().as_str()).iter().enumerate() {
            writeln!(out, "  [{}] fix: {} - {}", i + 1, fix.name(), fix.description())?;
        }
        let default = match Self::default_outcome(err) {
            ResolutionOutcome::Skipped => "s",
            _ => "a",
        };
        write!(out, "choice [{default}]: ")?;
        out.flush()
    }

    fn parse_choice(&self, err: &OutputError, line: &str) -> Option<MenuChoice> {
        let fixes = self.fixes.fixes_for(err.code().as_str());
        match line.trim().to_ascii_lowercase().as_str() {
            "a" | "abort" => Some(MenuChoice::Abort),
            "s" | "skip" => Some(MenuChoice::Skip),
            "r" | "retry" if Self::offer_retry(err) => Some(MenuChoice::Retry),
            other => match other.parse::<usize>() {
                Ok(n) if n >= 1 && n <= fixes.len() => Some(MenuChoice::Fix(n - 1)),
                _ => None,
            },
        }
    }
}

impl Resolve for InteractiveResolver {
    fn resolve(&self, err: &OutputError) -> ResolutionOutcome {
        let mut input = self.input.lock();
        let mut output = self.output.lock();
        let default = Self::default_outcome(err);

        for _ in 0..=self.max_prompt_retries {
            if self.print_menu(output.as_mut(), err).is_err() {
                warn!("interactive prompt unavailable, using default outcome");
                return default;
            }
            let line = match input.read_line() {
                Ok(Some(line)) => line,
                // End of input or a broken source falls back to the default.
                Ok(None) | Err(_) => return default,
            };
            if line.trim().is_empty() {
                return default;
            }
            match self.parse_choice(err, &line) {
                Some(MenuChoice::Abort) => return ResolutionOutcome::Aborted,
                Some(MenuChoice::Skip) => return ResolutionOutcome::Skipped,
                Some(MenuChoice::Retry) => return ResolutionOutcome::RetryRequested,
                Some(MenuChoice::Fix(index)) => {
                    let fix = &self.fixes.fixes_for(err.code().as_str())[index];
                    match fix.apply(err) {
                        Ok(applied) => {
                            let _ = writeln!(output, "applied fix {}: {applied}", fix.name());
                            return ResolutionOutcome::Fixed;
                        }
                        Err(fix_err) => {
                            let _ = writeln!(output, "fix {} failed: {fix_err}", fix.name());
                        }
                    }
                }
                None => {
                    let _ = writeln!(output, "unrecognized choice: {}", line.trim());
                }
            }
        }
        ResolutionOutcome::Aborted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::codes::{ERR_INVALID_FORMAT, ERR_NETWORK_TIMEOUT, ERR_NIL_VALUE};
    use crate::error::{ErrorBuilder, ErrorContext};
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex as StdMutex};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<StdMutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn plain_error() -> OutputError {
        ErrorBuilder::new(ERR_INVALID_FORMAT)
            .message("unknown format")
            .with_context(ErrorContext::new().with_output_format("xml"))
            .build()
    }

    fn resolver(answers: &[&str]) -> (InteractiveResolver, SharedBuffer) {
        let buffer = SharedBuffer::default();
        let resolver = InteractiveResolver::new(
            ScriptedLineSource::new(answers.iter().copied()),
            buffer.clone(),
        );
        (resolver, buffer)
    }

    #[test]
    fn abort_and_skip_choices() {
        let (r, _) = resolver(&["a"]);
        assert_eq!(r.resolve(&plain_error()), ResolutionOutcome::Aborted);
        let (r, _) = resolver(&["skip"]);
        assert_eq!(r.resolve(&plain_error()), ResolutionOutcome::Skipped);
    }

    #[test]
    fn retry_offered_only_for_retryable_processing_errors() {
        let retryable = ErrorBuilder::new(ERR_NETWORK_TIMEOUT)
            .message("timeout")
            .build_processing(true);
        let (r, out) = resolver(&["r"]);
        assert_eq!(r.resolve(&retryable), ResolutionOutcome::RetryRequested);
        assert!(out.contents().contains("[r] retry"));

        // Retry on a non-retryable error is unrecognized and falls back to
        // abort after the prompt budget.
        let (r, out) = resolver(&["r", "r", "r", "r"]);
        assert_eq!(r.resolve(&plain_error()), ResolutionOutcome::Aborted);
        assert!(out.contents().contains("unrecognized choice: r"));
    }

    #[test]
    fn fix_choice_applies_and_reports() {
        let (r, out) = resolver(&["1"]);
        assert_eq!(r.resolve(&plain_error()), ResolutionOutcome::Fixed);
        let printed = out.contents();
        assert!(printed.contains("[1] fix: use_default_format"));
        assert!(printed.contains("applied fix use_default_format: replaced format xml with table"));
    }

    #[test]
    fn failing_fix_reprompts() {
        let mut fixes = AutoFixRegistry::new();
        fixes.register(
            ERR_NIL_VALUE.as_str(),
            AutoFix::new("broken", "always fails", |err| Err(err.clone())),
        );
        let buffer = SharedBuffer::default();
        let r = InteractiveResolver::new(ScriptedLineSource::new(["1", "s"]), buffer.clone())
            .with_fixes(fixes);
        let err = ErrorBuilder::new(ERR_NIL_VALUE).message("nil").build();
        assert_eq!(r.resolve(&err), ResolutionOutcome::Skipped);
        assert!(buffer.contents().contains("fix broken failed"));
    }

    #[test]
    fn menu_presents_error_details_and_severity() {
        let (r, out) = resolver(&["s"]);
        r.resolve(&plain_error());
        let printed = out.contents();
        assert!(printed.contains("error: [OUT-1001] unknown format"));
        assert!(printed.contains("severity: error"));

        let warning = ErrorBuilder::new(ERR_INVALID_FORMAT)
            .severity(ErrorSeverity::Warning)
            .message("odd format")
            .with_suggestion("check the format list")
            .build();
        let (r, out) = resolver(&["s"]);
        r.resolve(&warning);
        let printed = out.contents();
        assert!(printed.contains("severity: warning"));
        assert!(printed.contains("check the format list"));
    }

    #[test]
    fn empty_input_takes_the_severity_default() {
        let (r, _) = resolver(&[""]);
        assert_eq!(r.resolve(&plain_error()), ResolutionOutcome::Aborted);

        let warning = ErrorBuilder::new(ERR_INVALID_FORMAT)
            .severity(ErrorSeverity::Warning)
            .message("odd format")
            .build();
        let (r, _) = resolver(&[""]);
        assert_eq!(r.resolve(&warning), ResolutionOutcome::Skipped);
    }

    #[test]
    fn end_of_input_takes_the_default() {
        let (r, _) = resolver(&[]);
        assert_eq!(r.resolve(&plain_error()), ResolutionOutcome::Aborted);
    }

    #[test]
    fn unrecognized_input_exhausts_prompt_budget() {
        let buffer = SharedBuffer::default();
        let r = InteractiveResolver::new(
            ScriptedLineSource::new(["x", "y", "z", "w", "v"]),
            buffer.clone(),
        )
        .with_max_prompt_retries(2);
        assert_eq!(r.resolve(&plain_error()), ResolutionOutcome::Aborted);
        // Budget of 2 retries means three prompts total.
        assert_eq!(buffer.contents().matches("How would you like").count(), 3);
    }
}
