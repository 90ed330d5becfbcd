//! Dispatch metrics.
//!
//! Recorded through the `metrics` facade; without an installed recorder the
//! calls are no-ops, so applications pick their own exporter.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `hermes_dispatch_total` | Counter | `kind`, `outcome` |
//! | `hermes_dispatch_duration_seconds` | Histogram | `kind` |
//! | `hermes_validation_failures_total` | Counter | `field` |

use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};

/// Dispatch counter name.
pub const DISPATCH_TOTAL: &str = "hermes_dispatch_total";
/// Dispatch latency histogram name.
pub const DISPATCH_DURATION: &str = "hermes_dispatch_duration_seconds";
/// Validation failure counter name.
pub const VALIDATION_FAILURES: &str = "hermes_validation_failures_total";

/// How a dispatch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The handler ran and answered.
    Handled,
    /// No route matched and the fallback or a 404 answered.
    NotFound,
    /// A recoverable binding or usage failure answered.
    Rejected,
    /// An error propagated to the caller.
    Failed,
}

impl DispatchOutcome {
    /// The label value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Handled => "handled",
            Self::NotFound => "not_found",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        }
    }
}

/// Registers metric descriptions with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(DISPATCH_TOTAL, "Total dispatched requests and commands");
    describe_histogram!(DISPATCH_DURATION, "Dispatch duration in seconds");
    describe_counter!(VALIDATION_FAILURES, "Total failed validation rules by field");
}

/// Records one finished dispatch.
pub fn record_dispatch(kind: &str, outcome: DispatchOutcome, duration: Duration) {
    counter!(
        DISPATCH_TOTAL,
        "kind" => kind.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);

    histogram!(DISPATCH_DURATION, "kind" => kind.to_string()).record(duration.as_secs_f64());
}

/// Records one failed validation rule.
pub fn record_validation_failure(field: &str) {
    counter!(VALIDATION_FAILURES, "field" => field.to_string()).increment(1);
}
