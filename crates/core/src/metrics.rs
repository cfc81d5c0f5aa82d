//! Prometheus metrics for supervised runs.

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

/// External tool launches.
pub static RUNS_STARTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("ffdrive_runs_started_total", "Total external tool launches").unwrap()
});

/// Finished runs by result.
pub static RUNS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ffdrive_runs_finished_total", "Total finished runs"),
        &["result"], // "succeeded", "failed", "cancelled", "timed_out", "launch_failed", "io_error"
    )
    .unwrap()
});

/// Wall-clock run duration in seconds.
pub static RUN_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("ffdrive_run_duration_seconds", "Duration of supervised runs")
            .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 300.0, 900.0, 1800.0, 3600.0]),
        &["result"],
    )
    .unwrap()
});

/// Fatal diagnostic markers seen, by marker.
pub static FATAL_MARKERS_SEEN: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ffdrive_fatal_markers_total",
            "Fatal diagnostic lines recognized in tool output",
        ),
        &["marker"],
    )
    .unwrap()
});

/// Records the end of a run.
pub fn record_run_finished(result: &str, elapsed_secs: f64) {
    RUNS_FINISHED.with_label_values(&[result]).inc();
    RUN_DURATION
        .with_label_values(&[result])
        .observe(elapsed_secs);
}

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(RUNS_STARTED.clone()),
        Box::new(RUNS_FINISHED.clone()),
        Box::new(RUN_DURATION.clone()),
        Box::new(FATAL_MARKERS_SEEN.clone()),
    ]
}
