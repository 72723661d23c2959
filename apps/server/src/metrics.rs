//! Metrics collection for the directory server
//!
//! Prometheus metrics registered in the default registry and exposed on `/metrics`.

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, register_int_gauge_vec,
    HistogramVec, IntCounterVec, IntGauge, IntGaugeVec,
};

lazy_static! {
    // HTTP Request Metrics

    /// Total HTTP requests by method, path, and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "directory_http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .expect("Failed to register HTTP_REQUESTS_TOTAL");

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "directory_http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("Failed to register HTTP_REQUEST_DURATION_SECONDS");

    /// In-flight HTTP requests
    pub static ref HTTP_REQUESTS_IN_FLIGHT: IntGaugeVec = register_int_gauge_vec!(
        "directory_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
        &["method", "path"]
    )
    .expect("Failed to register HTTP_REQUESTS_IN_FLIGHT");

    // Search Metrics

    /// Completed searches by the strategy that produced the page
    pub static ref SEARCH_TOTAL: IntCounterVec = register_int_counter_vec!(
        "directory_search_total",
        "Total number of searches by strategy",
        &["strategy"]
    )
    .expect("Failed to register SEARCH_TOTAL");

    /// Fallbacks from generated SQL to filter search
    pub static ref SEARCH_FALLBACKS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "directory_search_fallbacks_total",
        "Total number of fallbacks to filter search",
        &["reason"]
    )
    .expect("Failed to register SEARCH_FALLBACKS_TOTAL");

    /// Generated SQL rejected by the safety validator
    pub static ref SQL_REJECTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "directory_sql_rejections_total",
        "Total number of generated statements rejected",
        &["reason"]
    )
    .expect("Failed to register SQL_REJECTIONS_TOTAL");

    /// Search results returned per page
    pub static ref SEARCH_RESULTS: HistogramVec = register_histogram_vec!(
        "directory_search_results",
        "Number of companies returned per search page",
        &["strategy"],
        vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0]
    )
    .expect("Failed to register SEARCH_RESULTS");

    // Generation Metrics

    /// Text generation round trip
    pub static ref GENERATION_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "directory_generation_duration_seconds",
        "Text generation duration in seconds",
        &["purpose", "outcome"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("Failed to register GENERATION_DURATION_SECONDS");

    // Database Metrics

    /// Open database connections (refreshed on scrape)
    pub static ref DB_CONNECTIONS_ACTIVE: IntGauge = register_int_gauge!(
        "directory_db_connections_active",
        "Number of open database connections"
    )
    .expect("Failed to register DB_CONNECTIONS_ACTIVE");

    /// Idle database connections (refreshed on scrape)
    pub static ref DB_CONNECTIONS_IDLE: IntGauge = register_int_gauge!(
        "directory_db_connections_idle",
        "Number of idle database connections"
    )
    .expect("Failed to register DB_CONNECTIONS_IDLE");

    // Enrichment Metrics

    /// Enrichment attempts by outcome
    pub static ref ENRICHMENT_TOTAL: IntCounterVec = register_int_counter_vec!(
        "directory_enrichment_total",
        "Total number of company enrichment attempts",
        &["status"]
    )
    .expect("Failed to register ENRICHMENT_TOTAL");
}

/// Helper to sanitize path for metrics labels (replace ids, limit cardinality)
pub fn sanitize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if segments.is_empty() {
        return "/".to_string();
    }

    let labelled: Vec<&str> = segments
        .into_iter()
        .take(4)
        .map(|segment| {
            if segment.chars().all(|c| c.is_ascii_digit()) {
                "{id}"
            } else {
                segment
            }
        })
        .collect();

    format!("/{}", labelled.join("/"))
}
