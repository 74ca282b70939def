//! Prometheus metrics setup and metric definitions

use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Latency buckets in seconds. Upstream auth calls dominate, so the range
/// reaches further than a typical in-process endpoint would need.
const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
];

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_prometheus_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .set_buckets(LATENCY_BUCKETS)
        .context("failed to set histogram buckets")?
        .install_recorder()
        .context("failed to install Prometheus recorder")
}

/// Register metric descriptions and zero the counters that only move on
/// specific code paths, so HELP/TYPE lines show up from startup.
pub fn describe_metrics() {
    describe_counter!("http_requests_total", "Total number of HTTP requests");
    describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_gauge!(
        "http_requests_in_flight",
        "Number of HTTP requests currently being processed"
    );

    describe_counter!("auth_login_total", "Login attempts by result");
    describe_counter!("auth_sign_up_total", "Sign-up attempts by result");
    describe_counter!(
        "cognito_requests_total",
        "Calls to the identity provider by operation and outcome"
    );
    describe_histogram!(
        "cognito_request_duration_seconds",
        "Identity provider call latency in seconds"
    );

    counter!("auth_login_total", "result" => "success").absolute(0);
    counter!("auth_sign_up_total", "result" => "success").absolute(0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_metrics_without_recorder() {
        // No recorder installed: macros fall back to the no-op recorder
        describe_metrics();
    }

    #[test]
    fn test_latency_buckets_sorted() {
        assert!(LATENCY_BUCKETS.windows(2).all(|w| w[0] < w[1]));
    }
}
