//! End-to-end pipeline tests: validation feeding the handler, the handler
//! feeding the reporter, recovery and interactive resolution wired in the
//! way a format writer would wire them.

use outfmt_core::error::codes::{
    ERR_INVALID_FORMAT, ERR_MISSING_COLUMN, ERR_RENDER_FAILURE,
};
use outfmt_core::error::{ErrorBuilder, ErrorContext, ErrorSeverity};
use outfmt_core::handler::{ErrorHandler, HandlerMode, ResolutionOutcome};
use outfmt_core::interactive::{InteractiveResolver, ScriptedLineSource};
use outfmt_core::recovery::{FormatFallbackStrategy, RecoveryContext, RecoveryHandler};
use outfmt_core::report::ErrorReporter;
use outfmt_core::validation::{
    record, DataKind, DataTypeValidator, Dataset, EmptyDatasetValidator,
    OptimizedValidationRunner, RequiredColumnsValidator, Subject, ValidationMode,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn runner() -> OptimizedValidationRunner {
    let mut runner = OptimizedValidationRunner::new(ValidationMode::CollectAll);
    runner.add_validator(RequiredColumnsValidator::new(["id", "name"]));
    runner.add_validator(EmptyDatasetValidator::new(false));
    runner.add_validator(DataTypeValidator::new([("id", DataKind::Int)]));
    runner
}

#[test]
fn clean_dataset_passes_and_collects_nothing() {
    let subject = Subject::Dataset(
        Dataset::new(["id", "name"])
            .with_row(record([("id", 1), ("name", 1)]))
            .with_row(record([("id", 2), ("name", 2)])),
    );
    let handler = ErrorHandler::new(HandlerMode::Lenient);
    assert!(handler.handle_result(runner().run(&subject)).is_ok());
    assert!(!handler.has_errors());
}

#[test]
fn lenient_pipeline_collects_validation_failures_and_reports() {
    init_tracing();
    // Missing the "name" column, empty, so two validators fail.
    let subject = Subject::Dataset(Dataset::new(["id"]));
    let handler = ErrorHandler::new(HandlerMode::Lenient);
    assert!(handler.handle_result(runner().run(&subject)).is_ok());
    assert!(handler.has_errors());

    let reporter = ErrorReporter::new();
    for err in handler.collected_errors() {
        reporter.report(&err);
    }
    let summary = reporter.summary();
    assert_eq!(summary.total, 1);
    // The composite reports the first child's code.
    assert_eq!(summary.by_code.get("OUT-2001"), Some(&1));
    // Most severe child wins: missing column is an error.
    assert_eq!(summary.by_severity.get("error"), Some(&1));
}

#[test]
fn strict_pipeline_escalates_the_first_failure() {
    let subject = Subject::Dataset(Dataset::new(["id"]));
    let handler = ErrorHandler::new(HandlerMode::Strict);
    let err = handler
        .handle_result(runner().run(&subject))
        .expect_err("strict mode escalates");
    assert_eq!(err.code(), ERR_MISSING_COLUMN);
    assert!(!handler.has_errors());
}

#[test]
fn recovery_repairs_render_failures_before_policy_applies() {
    let recovery = RecoveryHandler::new()
        .with_strategy(FormatFallbackStrategy::new(["table", "csv", "json"]));
    let handler = ErrorHandler::new(HandlerMode::Strict)
        .with_recovery(recovery, RecoveryContext::new().with_output_format("table"));

    let render_err = ErrorBuilder::new(ERR_RENDER_FAILURE)
        .message("table renderer failed")
        .with_context(ErrorContext::new().with_output_format("table"))
        .build();
    assert!(handler.handle_error(render_err).is_ok());

    // csv fails next; the chain still has json.
    let render_err = ErrorBuilder::new(ERR_RENDER_FAILURE)
        .message("csv renderer failed")
        .with_context(ErrorContext::new().with_output_format("csv"))
        .build();
    assert!(handler.handle_error(render_err).is_ok());

    // json was the last entry, so this one escalates.
    let render_err = ErrorBuilder::new(ERR_RENDER_FAILURE)
        .message("json renderer failed")
        .with_context(ErrorContext::new().with_output_format("json"))
        .build();
    assert!(handler.handle_error(render_err).is_err());
}

#[test]
fn interactive_pipeline_applies_a_scripted_fix() {
    let resolver = InteractiveResolver::new(ScriptedLineSource::new(["1"]), Vec::new());
    let handler =
        ErrorHandler::new(HandlerMode::Interactive).with_resolver(Arc::new(resolver));

    let err = ErrorBuilder::new(ERR_INVALID_FORMAT)
        .message("unknown format")
        .with_context(ErrorContext::new().with_output_format("xml"))
        .build();
    assert!(handler.handle_error(err).is_ok());
    // Fixed errors are still collected for the session summary.
    assert_eq!(handler.collected_errors().len(), 1);
}

#[test]
fn interactive_resolver_default_abort_for_errors() {
    let resolver = InteractiveResolver::new(ScriptedLineSource::new([""]), Vec::new());
    use outfmt_core::handler::Resolve;
    let err = ErrorBuilder::new(ERR_INVALID_FORMAT).message("bad").build();
    assert_eq!(resolver.resolve(&err), ResolutionOutcome::Aborted);
}

#[test]
fn prometheus_export_reflects_reported_codes_in_order() {
    let reporter = ErrorReporter::new();
    reporter.report(&ErrorBuilder::new(ERR_MISSING_COLUMN).message("missing id").build());
    reporter.report(&ErrorBuilder::new(ERR_INVALID_FORMAT).message("bad format").build());
    assert_eq!(
        reporter.render_prometheus(),
        "# HELP go_output_errors_total Total errors recorded by code.\n\
         # TYPE go_output_errors_total counter\n\
         go_output_errors_total{code=\"OUT-1001\"} 1\n\
         go_output_errors_total{code=\"OUT-2001\"} 1\n"
    );
}

#[test]
fn handler_and_reporter_are_shareable_across_threads() {
    init_tracing();
    let handler = Arc::new(ErrorHandler::new(HandlerMode::Lenient));
    let reporter = Arc::new(ErrorReporter::new());

    let workers: Vec<_> = (0..8)
        .map(|i| {
            let handler = Arc::clone(&handler);
            let reporter = Arc::clone(&reporter);
            std::thread::spawn(move || {
                for j in 0..25 {
                    let err = ErrorBuilder::new(ERR_RENDER_FAILURE)
                        .severity(ErrorSeverity::Warning)
                        .message(format!("worker {i} failure {j}"))
                        .build();
                    reporter.report(&err);
                    handler.handle_error(err).unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(handler.collected_errors().len(), 200);
    assert_eq!(reporter.summary().total, 200);
    assert_eq!(reporter.summary().by_code.get("OUT-3006"), Some(&200));
}
