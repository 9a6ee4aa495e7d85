//! Prometheus metrics instrumentation for manta.
//!
//! All metrics are conditionally compiled behind the `metrics` feature flag.
//!
//! # Metrics
//!
//! ## Counters
//! - `manta_jobs_submitted_total` - Total number of jobs admitted
//! - `manta_jobs_settled_total` - Total number of settled attempts by status
//!
//! ## Gauges
//! - `manta_queue_depth` - Current size of the waiting/running/retained sets
//!
//! ## Histograms
//! - `manta_job_duration_seconds` - Attempt duration in seconds
#![cfg(feature = "metrics")]

use prometheus::{
    exponential_buckets, Counter, CounterVec, GaugeVec, HistogramVec, Opts,
    Registry,
};
use std::sync::LazyLock;

/// Global Prometheus registry for manta metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Counter for total jobs admitted.
pub static JOBS_SUBMITTED_TOTAL: LazyLock<Counter> = LazyLock::new(|| {
    Counter::new(
        "manta_jobs_submitted_total",
        "Total number of jobs admitted to the queue",
    )
    .expect("manta_jobs_submitted_total metric creation failed")
});

/// Counter for settled attempts.
///
/// Labels:
/// - `status`: The settlement status (completed, retry, failed)
pub static JOBS_SETTLED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        "manta_jobs_settled_total",
        "Total number of settled job attempts",
    );
    CounterVec::new(opts, &["status"])
        .expect("manta_jobs_settled_total metric creation failed")
});

/// Gauge for current queue depth.
///
/// Labels:
/// - `set`: The logical set (waiting, running, retained)
pub static QUEUE_DEPTH: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts =
        Opts::new("manta_queue_depth", "Current size of the queue's job sets");
    GaugeVec::new(opts, &["set"])
        .expect("manta_queue_depth metric creation failed")
});

/// Histogram for attempt duration in seconds.
///
/// Labels:
/// - `status`: The settlement status (completed, retry, failed)
pub static JOB_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let buckets =
        exponential_buckets(0.001, 2.0, 15).expect("bucket creation failed");
    let opts = prometheus::HistogramOpts::new(
        "manta_job_duration_seconds",
        "Job attempt duration in seconds",
    )
    .buckets(buckets);
    HistogramVec::new(opts, &["status"])
        .expect("manta_job_duration_seconds metric creation failed")
});

/// Initialize all metrics by registering them with the global registry.
///
/// This function is idempotent - calling it multiple times is safe.
pub fn init_metrics() -> anyhow::Result<()> {
    let registry = &*REGISTRY;

    for metric in [
        Box::new(JOBS_SUBMITTED_TOTAL.clone())
            as Box<dyn prometheus::core::Collector>,
        Box::new(JOBS_SETTLED_TOTAL.clone()),
        Box::new(QUEUE_DEPTH.clone()),
        Box::new(JOB_DURATION_SECONDS.clone()),
    ] {
        if let Err(e) = registry.register(metric) {
            let msg = e.to_string();
            if !msg
                .contains("Duplicate metrics collector registration attempted")
            {
                return Err(e.into());
            }
        }
    }

    Ok(())
}

/// Helper to record a job submission.
pub fn record_job_submitted() {
    JOBS_SUBMITTED_TOTAL.inc();
}

/// Helper to record a settled attempt.
pub fn record_job_settled(status: &str, duration_secs: f64) {
    JOBS_SETTLED_TOTAL.with_label_values(&[status]).inc();
    JOB_DURATION_SECONDS
        .with_label_values(&[status])
        .observe(duration_secs);
}

/// Helper to update a queue depth gauge.
pub fn set_queue_depth(set: &str, depth: f64) {
    QUEUE_DEPTH.with_label_values(&[set]).set(depth);
}

/// Gather all registered metrics in Prometheus text format.
pub fn gather_metrics() -> anyhow::Result<String> {
    let encoder = prometheus::TextEncoder::new();
    let metric_families = REGISTRY.gather();
    encoder
        .encode_to_string(&metric_families)
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initialization() {
        init_metrics().expect("metrics initialization should succeed");
    }

    #[test]
    fn test_record_job_submitted() {
        record_job_submitted();
    }

    #[test]
    fn test_record_job_settled() {
        record_job_settled("completed", 0.5);
        record_job_settled("retry", 1.5);
        record_job_settled("failed", 2.5);
    }

    #[test]
    fn test_set_queue_depth() {
        set_queue_depth("waiting", 42.0);
        set_queue_depth("running", 4.0);
        set_queue_depth("retained", 100.0);
    }

    #[test]
    fn test_gather_metrics() {
        init_metrics().expect("metrics initialization should succeed");

        record_job_submitted();
        record_job_settled("completed", 0.1);

        let output = gather_metrics().expect("gather should succeed");
        assert!(output.contains("manta_jobs_submitted_total"));
        assert!(output.contains("manta_jobs_settled_total"));
    }
}
