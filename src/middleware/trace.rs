//! Request span maker for `TraceLayer`.
//!
//! Credentials only travel in JSON bodies here, but clients occasionally put
//! them in the query string anyway. Those values are redacted before the URI
//! reaches the logs.

use super::gateway_path::PathBase;
use axum::http::{Request, Uri};
use tower_http::trace::MakeSpan;
use tracing::Span;

/// Query parameter names whose values are never logged.
const SENSITIVE_PARAMS: &[&str] = &[
    "password",
    "secret_hash",
    "client_secret",
    "access_token",
    "id_token",
    "refresh_token",
    "token",
];

/// `MakeSpan` that logs the routed URI with sensitive query values redacted,
/// plus the gateway path base when one was stripped.
#[derive(Clone, Debug)]
pub struct SanitizedMakeSpan;

impl<B> MakeSpan<B> for SanitizedMakeSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let path_base = request
            .extensions()
            .get::<PathBase>()
            .map(|b| b.0.as_str())
            .unwrap_or("");

        tracing::info_span!(
            "http",
            method = %request.method(),
            uri = %sanitize_uri(request.uri()),
            path_base = %path_base,
            version = ?request.version(),
        )
    }
}

fn sanitize_uri(uri: &Uri) -> String {
    let Some(query) = uri.query() else {
        return uri.path().to_string();
    };

    let pairs: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if is_sensitive(key) => format!("{key}=[REDACTED]"),
            _ => pair.to_string(),
        })
        .collect();

    format!("{}?{}", uri.path(), pairs.join("&"))
}

fn is_sensitive(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SENSITIVE_PARAMS.contains(&key.as_str())
}
