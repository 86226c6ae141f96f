//! Prometheus metrics for monitoring the wagering platform.
//!
//! Metrics are exposed in Prometheus text format on a dedicated listener
//! for scraping by monitoring systems.

#![allow(dead_code)] // Public API for future integration

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Sets up a scrape endpoint on the specified address; metrics become
/// available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request with method, path and status labels.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

// ============================================================================
// Wager Metrics
// ============================================================================

/// Increment created wagers counter.
pub fn wagers_created_total() {
    metrics::counter!("wagers_created_total").increment(1);
}

/// Increment accepted (matched) wagers counter.
pub fn wagers_matched_total() {
    metrics::counter!("wagers_matched_total").increment(1);
}

/// Increment settled wagers counter.
pub fn wagers_completed_total() {
    metrics::counter!("wagers_completed_total").increment(1);
}

/// Increment cancelled wagers counter.
pub fn wagers_cancelled_total() {
    metrics::counter!("wagers_cancelled_total").increment(1);
}

/// Record stake size distribution in minor units.
pub fn stake_amount(amount: i64) {
    metrics::histogram!("stake_amount").record(amount as f64);
}

// ============================================================================
// Payment Metrics
// ============================================================================

/// Increment deposits counter by method.
pub fn deposits_total(method: &str) {
    metrics::counter!("deposits_total",
        "method" => method.to_string()
    )
    .increment(1);
}

/// Increment withdrawal requests counter.
pub fn withdrawals_total() {
    metrics::counter!("withdrawals_total").increment(1);
}

/// Increment webhook notifications counter by outcome.
pub fn webhook_results_total(outcome: &str) {
    metrics::counter!("webhook_results_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}
