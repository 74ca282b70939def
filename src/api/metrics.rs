//! Prometheus scrape endpoint

use crate::error::error_envelope;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Render the recorder in text exposition format, or 404 when the recorder
/// was never installed.
pub async fn metrics_handler(State(handle): State<Arc<Option<PrometheusHandle>>>) -> Response {
    let Some(handle) = handle.as_ref() else {
        return error_envelope(
            StatusCode::NOT_FOUND,
            "MetricsDisabled",
            "Metrics are not enabled.",
        );
    };

    (
        [(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)],
        handle.render(),
    )
        .into_response()
}
