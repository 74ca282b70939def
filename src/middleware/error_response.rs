//! Error response normalization middleware
//!
//! Framework-level rejections (malformed JSON, unknown route, wrong method)
//! come back as text/plain. This middleware rewrites them into the same error
//! envelope the handlers use so clients only ever parse one shape.

use crate::error::error_envelope;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::Response,
};

/// Paths that render their own bodies and are never rewritten.
const PASSTHROUGH_PATHS: &[&str] = &["/health", "/metrics"];

pub async fn normalize_error_response(request: Request<Body>, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let response = next.run(request).await;

    if PASSTHROUGH_PATHS.contains(&path.as_str()) {
        return response;
    }

    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.contains("application/json"))
        .unwrap_or(false);
    if is_json {
        return response;
    }

    let (status, code, message) = generic_error(status);
    error_envelope(status, code, message)
}

/// Envelope status, code and message for a bare framework rejection.
///
/// A body that parses as JSON but does not fit the input type is rejected
/// with 422; it is reported as 400 like any other unreadable body.
fn generic_error(status: StatusCode) -> (StatusCode, &'static str, &'static str) {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => (
            StatusCode::BAD_REQUEST,
            "BadRequest",
            "Invalid request body.",
        ),
        StatusCode::NOT_FOUND => (status, "NotFound", "Resource not found."),
        StatusCode::METHOD_NOT_ALLOWED => (status, "MethodNotAllowed", "Method not allowed."),
        StatusCode::UNSUPPORTED_MEDIA_TYPE => (
            status,
            "UnsupportedMediaType",
            "Content-Type must be application/json.",
        ),
        StatusCode::PAYLOAD_TOO_LARGE => (status, "PayloadTooLarge", "Request body too large."),
        _ if status.is_client_error() => (status, "BadRequest", "Invalid request."),
        _ => (status, "InternalServerError", "Internal server error."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        routing::{get, post},
        Router,
    };
    use tower::ServiceExt;

    fn app(router: Router) -> Router {
        router.layer(axum::middleware::from_fn(normalize_error_response))
    }

    async fn call(app: Router, method: &str, uri: &str) -> Response {
        app.oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_success_response_passthrough() {
        let app = app(Router::new().route("/test", post(|| async { (StatusCode::OK, "ok") })));

        let response = call(app, "POST", "/test").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_text_error_converted_to_envelope() {
        let app = app(Router::new().route(
            "/test",
            post(|| async { (StatusCode::BAD_REQUEST, "Failed to parse the request body") }),
        ));

        let response = call(app, "POST", "/test").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let ct = response.headers().get(header::CONTENT_TYPE).unwrap();
        assert!(ct.to_str().unwrap().contains("application/json"));

        let json = json_body(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "BadRequest");
        assert_eq!(json["error"]["message"], "Invalid request body.");
    }

    #[tokio::test]
    async fn test_unprocessable_rejection_becomes_bad_request() {
        let app = app(Router::new().route(
            "/test",
            post(|| async {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "Failed to deserialize the JSON body into the target type",
                )
            }),
        ));

        let response = call(app, "POST", "/test").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"]["code"], "BadRequest");
        assert_eq!(json["error"]["message"], "Invalid request body.");
    }

    #[tokio::test]
    async fn test_json_unprocessable_passthrough() {
        let app = app(Router::new().route(
            "/test",
            post(|| async {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    axum::Json(serde_json::json!({"code": "InvalidPassword"})),
                )
            }),
        ));

        let response = call(app, "POST", "/test").await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_wrong_method_becomes_envelope() {
        let app = app(Router::new().route("/test", get(|| async { "ok" })));

        let response = call(app, "DELETE", "/test").await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let json = json_body(response).await;
        assert_eq!(json["error"]["code"], "MethodNotAllowed");
    }

    #[tokio::test]
    async fn test_json_error_passthrough() {
        let app = app(Router::new().route(
            "/test",
            post(|| async {
                (
                    StatusCode::CONFLICT,
                    axum::Json(serde_json::json!({"custom": true})),
                )
            }),
        ));

        let response = call(app, "POST", "/test").await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(json_body(response).await["custom"], true);
    }

    #[tokio::test]
    async fn test_health_not_normalized() {
        let app = app(Router::new().route(
            "/health",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "degraded") }),
        ));

        let response = call(app, "GET", "/health").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"degraded");
    }
}
