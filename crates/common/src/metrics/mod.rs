//! Metrics and observability utilities
//!
//! Records pipeline metrics through the metrics-rs facade with
//! standardized naming. Exporter wiring is left to the host binary.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};

/// Metrics prefix for all ScholarRAG metrics
pub const METRICS_PREFIX: &str = "scholarrag";

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_searches_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of paper searches"
    );

    describe_histogram!(
        format!("{}_search_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Search plus knowledge-base build latency in seconds"
    );

    describe_counter!(
        format!("{}_questions_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of questions asked"
    );

    describe_histogram!(
        format!("{}_ask_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Retrieve plus synthesize latency in seconds"
    );
}

/// Record a completed search and knowledge-base build
pub fn record_search(duration_secs: f64, papers: usize) {
    counter!(format!("{}_searches_total", METRICS_PREFIX)).increment(1);
    histogram!(format!("{}_search_duration_seconds", METRICS_PREFIX)).record(duration_secs);
    histogram!(format!("{}_search_papers", METRICS_PREFIX)).record(papers as f64);
}

/// Record a completed question/answer round trip
pub fn record_ask(duration_secs: f64, sources: usize) {
    counter!(format!("{}_questions_total", METRICS_PREFIX)).increment(1);
    histogram!(format!("{}_ask_duration_seconds", METRICS_PREFIX)).record(duration_secs);
    histogram!(format!("{}_ask_sources", METRICS_PREFIX)).record(sources as f64);
}
