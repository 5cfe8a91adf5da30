//! Session-long error aggregation and export
//!
//! The reporter is an independent sink: anything reported to it is
//! appended to a timestamped, append-only entry log and rolled up into
//! counters. Summaries are read models computed by scanning that log;
//! entries are never mutated after append. All collections sit behind a
//! reader/writer lock so concurrent workers can share one reporter.

use crate::error::context::display_value;
use crate::error::{ErrorContext, ErrorSeverity, OutputError};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

/// Context values longer than this are excluded from aggregation.
const MAX_AGGREGATED_VALUE_LEN: usize = 100;

const DEFAULT_TOP_N: usize = 5;

/// One reported error, as recorded at report time.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEntry {
    pub timestamp: DateTime<Utc>,
    pub code: String,
    pub severity: ErrorSeverity,
    pub message: String,
    pub context: ErrorContext,
    pub suggestions: Vec<String>,
}

/// A `(code, message)` pair ranked by occurrence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopError {
    pub code: String,
    pub message: String,
    pub count: u64,
    pub per_second: f64,
}

/// Aggregated view over reported (or collected) errors.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ErrorSummary {
    pub total: u64,
    pub by_code: BTreeMap<String, u64>,
    pub by_severity: BTreeMap<String, u64>,
    /// Sorted and deduplicated.
    pub suggestions: Vec<String>,
    /// Warning/Info errors carrying at least one suggestion.
    pub fixable: u64,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
    pub top_errors: Vec<TopError>,
    pub operations: BTreeMap<String, u64>,
    pub fields: BTreeMap<String, u64>,
    pub values: BTreeMap<String, u64>,
}

impl ErrorSummary {
    /// Build counters from a set of error values. Used by the handler for
    /// its collected list; rates and time ranges stay unset.
    pub fn from_errors<'a, I>(errors: I) -> Self
    where
        I: IntoIterator<Item = &'a OutputError>,
    {
        let mut summary = ErrorSummary::default();
        let mut suggestions = BTreeSet::new();
        for err in errors {
            summary.total += 1;
            *summary
                .by_code
                .entry(err.code().as_str().to_string())
                .or_default() += 1;
            *summary
                .by_severity
                .entry(err.severity().name().to_string())
                .or_default() += 1;
            let errs_suggestions = err.suggestions();
            if matches!(
                err.severity(),
                ErrorSeverity::Warning | ErrorSeverity::Info
            ) && !errs_suggestions.is_empty()
            {
                summary.fixable += 1;
            }
            suggestions.extend(errs_suggestions);
            aggregate_context(&mut summary, err.context());
        }
        summary.suggestions = suggestions.into_iter().collect();
        summary
    }
}

fn aggregate_context(summary: &mut ErrorSummary, context: &ErrorContext) {
    if let Some(operation) = &context.operation {
        *summary.operations.entry(operation.clone()).or_default() += 1;
    }
    if let Some(field) = &context.field {
        *summary.fields.entry(field.clone()).or_default() += 1;
    }
    if let Some(value) = &context.value {
        let rendered = display_value(value);
        if rendered.len() <= MAX_AGGREGATED_VALUE_LEN {
            *summary.values.entry(rendered).or_default() += 1;
        }
    }
}

struct ReporterState {
    entries: Vec<ErrorEntry>,
    by_code: BTreeMap<String, u64>,
    by_severity: BTreeMap<String, u64>,
    suggestions: BTreeSet<String>,
    session_start: DateTime<Utc>,
    first_seen: Option<DateTime<Utc>>,
    last_seen: Option<DateTime<Utc>>,
}

impl ReporterState {
    fn fresh() -> Self {
        Self {
            entries: Vec::new(),
            by_code: BTreeMap::new(),
            by_severity: BTreeMap::new(),
            suggestions: BTreeSet::new(),
            session_start: Utc::now(),
            first_seen: None,
            last_seen: None,
        }
    }
}

pub struct ErrorReporter {
    state: RwLock<ReporterState>,
    top_n: usize,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(ReporterState::fresh()),
            top_n: DEFAULT_TOP_N,
        }
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Append a timestamped entry and roll counters forward.
    pub fn report(&self, err: &OutputError) {
        let now = Utc::now();
        let mut state = self.state.write();
        *state
            .by_code
            .entry(err.code().as_str().to_string())
            .or_default() += 1;
        *state
            .by_severity
            .entry(err.severity().name().to_string())
            .or_default() += 1;
        state.suggestions.extend(err.suggestions());
        state.first_seen.get_or_insert(now);
        state.last_seen = Some(now);
        state.entries.push(ErrorEntry {
            timestamp: now,
            code: err.code().as_str().to_string(),
            severity: err.severity(),
            message: err.message(),
            context: err.context().clone(),
            suggestions: err.suggestions(),
        });
    }

    pub fn entry_count(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn summary(&self) -> ErrorSummary {
        let state = self.state.read();
        let mut summary = ErrorSummary {
            total: state.entries.len() as u64,
            by_code: state.by_code.clone(),
            by_severity: state.by_severity.clone(),
            suggestions: state.suggestions.iter().cloned().collect(),
            first_seen: state.first_seen,
            last_seen: state.last_seen,
            ..ErrorSummary::default()
        };

        let elapsed_secs = (Utc::now() - state.session_start).num_seconds().max(1) as f64;
        let mut occurrences: BTreeMap<(String, String), u64> = BTreeMap::new();
        for entry in &state.entries {
            *occurrences
                .entry((entry.code.clone(), entry.message.clone()))
                .or_default() += 1;
            if matches!(
                entry.severity,
                ErrorSeverity::Warning | ErrorSeverity::Info
            ) && !entry.suggestions.is_empty()
            {
                summary.fixable += 1;
            }
            aggregate_context(&mut summary, &entry.context);
        }
        let mut ranked: Vec<TopError> = occurrences
            .into_iter()
            .map(|((code, message), count)| TopError {
                code,
                message,
                count,
                per_second: count as f64 / elapsed_secs,
            })
            .collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.code.cmp(&b.code)));
        ranked.truncate(self.top_n);
        summary.top_errors = ranked;
        summary
    }

    /// Reset everything, including the session clock.
    pub fn clear(&self) {
        *self.state.write() = ReporterState::fresh();
    }

    /// Multi-section human-readable report.
    pub fn render_text_report(&self) -> String {
        let summary = self.summary();
        let mut out = String::new();
        let _ = writeln!(out, "=== Error Report ===");
        let _ = writeln!(out, "Total errors: {}", summary.total);
        if let (Some(first), Some(last)) = (summary.first_seen, summary.last_seen) {
            let _ = writeln!(
                out,
                "Time range: {} - {}",
                first.to_rfc3339(),
                last.to_rfc3339()
            );
        }
        let _ = writeln!(out, "\nBy severity:");
        for (severity, count) in &summary.by_severity {
            let _ = writeln!(out, "  {severity}: {count}");
        }
        let _ = writeln!(out, "\nBy code:");
        for (code, count) in &summary.by_code {
            let _ = writeln!(out, "  {code}: {count}");
        }
        if !summary.top_errors.is_empty() {
            let _ = writeln!(out, "\nTop errors:");
            for (i, top) in summary.top_errors.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "  {}. [{}] {} - {} occurrence(s), {:.2}/s",
                    i + 1,
                    top.code,
                    top.message,
                    top.count,
                    top.per_second
                );
            }
        }
        if !summary.suggestions.is_empty() {
            let _ = writeln!(out, "\nSuggestions:");
            for suggestion in &summary.suggestions {
                let _ = writeln!(out, "  - {suggestion}");
            }
        }
        if !summary.operations.is_empty() || !summary.fields.is_empty() {
            let _ = writeln!(out, "\nContext hotspots:");
            for (operation, count) in &summary.operations {
                let _ = writeln!(out, "  operation {operation}: {count}");
            }
            for (field, count) in &summary.fields {
                let _ = writeln!(out, "  field {field}: {count}");
            }
        }
        let _ = writeln!(out, "\nFixable (warning/info with suggestions): {}", summary.fixable);
        out
    }

    /// Metrics-style plaintext export, one counter line per code, codes
    /// sorted ascending. The layout is fixed; scrapers parse it literally.
    pub fn render_prometheus(&self) -> String {
        let state = self.state.read();
        let mut out = String::new();
        out.push_str("# HELP go_output_errors_total Total errors recorded by code.\n");
        out.push_str("# TYPE go_output_errors_total counter\n");
        for (code, count) in &state.by_code {
            let _ = writeln!(out, "go_output_errors_total{{code=\"{code}\"}} {count}");
        }
        out
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Merge summaries from several reporters or handler sessions: counts sum,
/// suggestions union, time ranges widen to min/max.
pub fn aggregate_summaries(summaries: &[ErrorSummary]) -> ErrorSummary {
    let mut merged = ErrorSummary::default();
    let mut suggestions = BTreeSet::new();
    let mut ranked: BTreeMap<(String, String), u64> = BTreeMap::new();
    for summary in summaries {
        merged.total += summary.total;
        merged.fixable += summary.fixable;
        for (code, count) in &summary.by_code {
            *merged.by_code.entry(code.clone()).or_default() += count;
        }
        for (severity, count) in &summary.by_severity {
            *merged.by_severity.entry(severity.clone()).or_default() += count;
        }
        for (operation, count) in &summary.operations {
            *merged.operations.entry(operation.clone()).or_default() += count;
        }
        for (field, count) in &summary.fields {
            *merged.fields.entry(field.clone()).or_default() += count;
        }
        for (value, count) in &summary.values {
            *merged.values.entry(value.clone()).or_default() += count;
        }
        suggestions.extend(summary.suggestions.iter().cloned());
        for top in &summary.top_errors {
            *ranked
                .entry((top.code.clone(), top.message.clone()))
                .or_default() += top.count;
        }
        merged.first_seen = match (merged.first_seen, summary.first_seen) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        merged.last_seen = match (merged.last_seen, summary.last_seen) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }
    merged.suggestions = suggestions.into_iter().collect();
    let elapsed_secs = match (merged.first_seen, merged.last_seen) {
        (Some(first), Some(last)) => (last - first).num_seconds().max(1) as f64,
        _ => 1.0,
    };
    let mut top: Vec<TopError> = ranked
        .into_iter()
        .map(|((code, message), count)| TopError {
            code,
            message,
            count,
            per_second: count as f64 / elapsed_secs,
        })
        .collect();
    top.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.code.cmp(&b.code)));
    merged.top_errors = top;
    merged
}
