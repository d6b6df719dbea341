/// Metrics and telemetry for the service directory
///
/// Provides Prometheus-compatible metrics for monitoring:
/// - Directory cache hit/miss rates and size
/// - Directory fetch attempts and latency
/// - Resolution outcomes

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Encoder, Histogram, IntCounter, IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    // ========== Cache Metrics ==========

    /// Directory cache hits
    pub static ref DIRECTORY_CACHE_HITS_TOTAL: IntCounter = register_int_counter!(
        "directory_cache_hits_total",
        "Total number of directory cache hits"
    )
    .unwrap();

    /// Directory cache misses, including expired entries
    pub static ref DIRECTORY_CACHE_MISSES_TOTAL: IntCounter = register_int_counter!(
        "directory_cache_misses_total",
        "Total number of directory cache misses"
    )
    .unwrap();

    /// Number of entries held in the directory cache
    pub static ref DIRECTORY_CACHE_SIZE: IntGauge = register_int_gauge!(
        "directory_cache_size",
        "Number of entries in the directory cache"
    )
    .unwrap();

    // ========== Fetch Metrics ==========

    /// Directory fetch attempts by outcome
    pub static ref DIRECTORY_FETCH_ATTEMPTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "directory_fetch_attempts_total",
        "Total number of directory fetch attempts",
        &["outcome"]
    )
    .unwrap();

    /// Directory fetch duration including retries
    pub static ref DIRECTORY_FETCH_DURATION_SECONDS: Histogram = register_histogram!(
        "directory_fetch_duration_seconds",
        "Directory fetch latencies in seconds, including retries",
        vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]
    )
    .unwrap();

    /// Fetched entries dropped because of an invalid URL
    pub static ref DIRECTORY_ENTRIES_DROPPED_TOTAL: IntCounter = register_int_counter!(
        "directory_entries_dropped_total",
        "Total number of fetched directory entries dropped as invalid"
    )
    .unwrap();

    // ========== Resolution Metrics ==========

    /// Resolutions by outcome (hit, refreshed, not_found, error)
    pub static ref DIRECTORY_RESOLUTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "directory_resolutions_total",
        "Total number of identifier resolutions",
        &["outcome"]
    )
    .unwrap();

    // ========== Background Job Metrics ==========

    /// Background job executions by job type and status
    pub static ref BACKGROUND_JOBS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "background_jobs_total",
        "Total number of background job executions",
        &["job_type", "status"]
    )
    .unwrap();
}

/// Encode all registered metrics in the Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Record the outcome of a resolve call
pub fn record_resolution(outcome: &str) {
    DIRECTORY_RESOLUTIONS_TOTAL
        .with_label_values(&[outcome])
        .inc();
}

/// Record a background job execution
pub fn record_background_job(job_type: &str, status: &str) {
    BACKGROUND_JOBS_TOTAL
        .with_label_values(&[job_type, status])
        .inc();
}
