//! Tracing and telemetry instrumentation for manta.
//!
//! Helper functions for creating tracing spans and recording metrics during
//! job lifecycle events. All functions work both with and without the
//! `metrics` feature flag.
//!
//! # Features
//!
//! - Tracing spans for the job lifecycle: submit, dispatch
//! - Integration with the `metrics` module for Prometheus metrics
//! - Helper functions that are no-ops when features are disabled

use tracing::{info_span, Span};

use crate::job::QueueStats;

/// Create a tracing span for a job submission.
///
/// The span includes the job_id and priority as fields for observability.
#[must_use]
pub fn job_submit_span(job_id: impl AsRef<str>, priority: i32) -> Span {
    info_span!(
        "manta.submit",
        job_id = %job_id.as_ref(),
        priority = priority,
    )
}

/// Create a tracing span for one dispatch attempt.
///
/// The span includes the job_id and attempt number as fields.
#[must_use]
pub fn job_dispatch_span(job_id: impl AsRef<str>, attempt: u32) -> Span {
    info_span!(
        "manta.dispatch",
        job_id = %job_id.as_ref(),
        attempt = attempt,
    )
}

/// Record a job submission.
///
/// Logged via tracing and mirrored into Prometheus when the `metrics`
/// feature is enabled.
pub fn record_job_submitted(job_id: impl AsRef<str>, priority: i32) {
    tracing::info!(
        job_id = %job_id.as_ref(),
        priority = priority,
        "job submitted"
    );

    #[cfg(feature = "metrics")]
    crate::metrics::record_job_submitted();
}

/// Record the settlement of one attempt.
///
/// `status` is one of `completed`, `retry`, `failed`.
pub fn record_job_settled(
    job_id: impl AsRef<str>,
    status: impl AsRef<str>,
    duration_secs: f64,
) {
    tracing::info!(
        job_id = %job_id.as_ref(),
        status = %status.as_ref(),
        duration_secs = duration_secs,
        "job attempt settled"
    );

    #[cfg(feature = "metrics")]
    crate::metrics::record_job_settled(status.as_ref(), duration_secs);
}

/// Update the queue depth gauges from a stats sample.
pub fn set_queue_depth(stats: QueueStats) {
    tracing::debug!(
        waiting = stats.waiting,
        running = stats.running,
        retained = stats.retained,
        "queue depth updated"
    );

    #[cfg(feature = "metrics")]
    {
        crate::metrics::set_queue_depth("waiting", stats.waiting as f64);
        crate::metrics::set_queue_depth("running", stats.running as f64);
        crate::metrics::set_queue_depth("retained", stats.retained as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_submit_span() {
        let _guard = tracing::subscriber::set_default(
            tracing_subscriber::FmtSubscriber::builder()
                .with_max_level(tracing::Level::TRACE)
                .finish(),
        );
        let span = job_submit_span("job-123", 5);
        assert_eq!(span.metadata().unwrap().name(), "manta.submit");
    }

    #[test]
    fn test_job_dispatch_span() {
        let _guard = tracing::subscriber::set_default(
            tracing_subscriber::FmtSubscriber::builder()
                .with_max_level(tracing::Level::TRACE)
                .finish(),
        );
        let span = job_dispatch_span("job-123", 2);
        assert_eq!(span.metadata().unwrap().name(), "manta.dispatch");
    }

    #[test]
    fn test_record_helpers_do_not_panic() {
        record_job_submitted("job-123", 0);
        record_job_settled("job-123", "completed", 0.25);
        set_queue_depth(QueueStats {
            waiting: 1,
            running: 2,
            retained: 3,
        });
    }
}
