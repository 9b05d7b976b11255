use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all EPA-dunk metrics
const PREFIX: &str = "epa_dunk";

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "endpoint", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0, 120.0, 300.0]),
        &["method", "endpoint"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Generation Metrics
    pub static ref GENERATION_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_generation_requests_total"),
            "Song requests by outcome (reused, generated, generator_failed, storage_failed)"
        ),
        &["outcome"]
    ).expect("Failed to create generation_requests_total metric");

    pub static ref GENERATOR_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_generator_duration_seconds"),
            "Time spent waiting for the audio generator"
        )
        .buckets(vec![1.0, 5.0, 10.0, 20.0, 30.0, 60.0, 120.0, 180.0, 240.0]),
        &["generator"]
    ).expect("Failed to create generator_duration_seconds metric");

    pub static ref SONGS_TOTAL: Gauge = Gauge::new(
        format!("{PREFIX}_songs_total"),
        "Number of songs in the generation history"
    ).expect("Failed to create songs_total metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Ignore errors if already registered (tests call this repeatedly)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(GENERATION_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(GENERATOR_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(SONGS_TOTAL.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Collapses a request path into a low-cardinality label.
pub fn categorize_endpoint(path: &str) -> &'static str {
    if path.starts_with("/api/generate-song") {
        "generate"
    } else if path.starts_with("/api/health") {
        "health"
    } else if path.starts_with("/api/") {
        "api_other"
    } else if path.starts_with("/tracks/") {
        "tracks"
    } else if path.starts_with("/shared/") {
        "shared"
    } else {
        "static"
    }
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let endpoint = categorize_endpoint(path);
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, endpoint, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, endpoint])
        .observe(duration.as_secs_f64());
}

pub fn record_generation_outcome(outcome: &str) {
    GENERATION_REQUESTS_TOTAL
        .with_label_values(&[outcome])
        .inc();
}

pub fn record_generator_latency(generator: &str, duration: Duration) {
    GENERATOR_DURATION_SECONDS
        .with_label_values(&[generator])
        .observe(duration.as_secs_f64());
}

pub fn set_songs_total(count: usize) {
    SONGS_TOTAL.set(count as f64);
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_default();
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
