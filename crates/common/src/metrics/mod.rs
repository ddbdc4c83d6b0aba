//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with latency-aligned histograms
//! and standardized naming conventions.

use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit,
};
use std::time::Instant;

/// Metrics prefix for all Observatory metrics
pub const METRICS_PREFIX: &str = "observatory";

/// Histogram buckets for request latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
];

/// Buckets for model latency (typically slower)
pub const MODEL_BUCKETS: &[f64] = &[
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.000,  // 2s
    5.000,  // 5s
    10.00,  // 10s
    30.00,  // 30s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Classification metrics
    describe_counter!(
        format!("{}_classifications_total", METRICS_PREFIX),
        Unit::Count,
        "Search queries classified, labelled by source (model or fallback)"
    );

    describe_histogram!(
        format!("{}_classification_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Search intent classification latency in seconds"
    );

    describe_counter!(
        format!("{}_classifier_failures_total", METRICS_PREFIX),
        Unit::Count,
        "Model failures that degraded to the local fallback"
    );

    // Listing metrics
    describe_gauge!(
        format!("{}_filtered_results_count", METRICS_PREFIX),
        Unit::Count,
        "Rows left after applying the active filters"
    );

    // Catalog metrics
    describe_counter!(
        format!("{}_records_loaded_total", METRICS_PREFIX),
        Unit::Count,
        "Rows accepted by the tabular loaders"
    );

    describe_counter!(
        format!("{}_records_skipped_total", METRICS_PREFIX),
        Unit::Count,
        "Rows dropped by the tabular loaders"
    );

    // Chatbot metrics
    describe_counter!(
        format!("{}_chatbot_questions_total", METRICS_PREFIX),
        Unit::Count,
        "Questions sent to the document chatbot"
    );

    // Session metrics
    describe_gauge!(
        format!("{}_active_sessions", METRICS_PREFIX),
        Unit::Count,
        "Search sessions currently held in memory"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record a finished classification
pub fn record_classification(duration_secs: f64, source: &str, intent: &str) {
    counter!(
        format!("{}_classifications_total", METRICS_PREFIX),
        "source" => source.to_string(),
        "intent" => intent.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_classification_duration_seconds", METRICS_PREFIX),
        "source" => source.to_string()
    )
    .record(duration_secs);
}

/// Helper to record a model failure that was absorbed by the fallback
pub fn record_classifier_failure(reason: &str) {
    counter!(
        format!("{}_classifier_failures_total", METRICS_PREFIX),
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Helper to record listing sizes
pub fn record_filtered(table: &str, result_count: usize) {
    gauge!(
        format!("{}_filtered_results_count", METRICS_PREFIX),
        "table" => table.to_string()
    )
    .set(result_count as f64);
}

/// Helper to record loader outcomes
pub fn record_load(source: &str, loaded: usize, skipped: usize) {
    counter!(
        format!("{}_records_loaded_total", METRICS_PREFIX),
        "source" => source.to_string()
    )
    .increment(loaded as u64);

    counter!(
        format!("{}_records_skipped_total", METRICS_PREFIX),
        "source" => source.to_string()
    )
    .increment(skipped as u64);
}

/// Helper to record chatbot traffic
pub fn record_chatbot_question(success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_chatbot_questions_total", METRICS_PREFIX),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Helper to record the live session count
pub fn record_active_sessions(count: usize) {
    gauge!(format!("{}_active_sessions", METRICS_PREFIX)).set(count as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_buckets_sorted() {
        for buckets in [LATENCY_BUCKETS, MODEL_BUCKETS] {
            let mut prev = 0.0;
            for &bucket in buckets {
                assert!(bucket > prev);
                prev = bucket;
            }
        }
    }

    #[test]
    fn test_recorders_without_exporter() {
        let metrics = RequestMetrics::start("POST", "/v1/sessions");
        metrics.finish(201);
        record_classification(0.2, "fallback", "area");
        record_classifier_failure("timeout");
        record_filtered("researchers", 12);
        record_load("projects", 10, 2);
        record_chatbot_question(true);
        // Just verify it runs without panic
    }
}
