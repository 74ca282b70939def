//! Common test utilities
//!
//! Integration tests run the production router against a real
//! `CognitoClient` pointed at a wiremock server, so the full path from HTTP
//! request to Cognito wire format is exercised without AWS.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    response::Response,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::sync::Arc;
use tower::{Service, ServiceExt};
use videoproc_auth::cognito::CognitoClient;
use videoproc_auth::config::{CognitoConfig, Config, TelemetryConfig};
use videoproc_auth::server::build_router;
use videoproc_auth::service::AuthService;
use videoproc_auth::state::HasServices;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CLIENT_ID: &str = "test-client-id";
pub const CLIENT_SECRET: &str = "test-client-secret";
pub const TEST_EMAIL: &str = "user@example.com";
pub const TEST_PASSWORD: &str = "Password123!";

/// SECRET_HASH for (`TEST_EMAIL`, `CLIENT_ID`, `CLIENT_SECRET`)
pub const TEST_EMAIL_SECRET_HASH: &str = "JDFaz1Kl3Xp5KDXMm53WxP0U+ngLmtk3FN01nVGOnmQ=";

pub const AMZ_TARGET: &str = "X-Amz-Target";
pub const INITIATE_AUTH_TARGET: &str = "AWSCognitoIdentityProviderService.InitiateAuth";
pub const SIGN_UP_TARGET: &str = "AWSCognitoIdentityProviderService.SignUp";

pub fn test_config(endpoint: &str, client_secret: Option<&str>) -> Config {
    Config {
        http_host: "127.0.0.1".to_string(),
        http_port: 0,
        cognito: CognitoConfig {
            region: "us-east-1".to_string(),
            user_pool_id: "us-east-1_TestPool".to_string(),
            client_id: CLIENT_ID.to_string(),
            client_secret: client_secret.map(str::to_string),
            endpoint: Some(endpoint.to_string()),
            access_key_id: Some("test-access-key".to_string()),
            secret_access_key: Some("test-secret-key".to_string()),
            timeout_secs: 5,
            max_attempts: 1,
        },
        telemetry: TelemetryConfig {
            metrics_enabled: false,
            ..TelemetryConfig::default()
        },
    }
}

/// Mock Cognito user pool endpoint
pub struct MockCognitoServer {
    server: MockServer,
}

impl MockCognitoServer {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// JSON bodies of every request received so far
    pub async fn received_bodies(&self) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect()
    }

    pub async fn mock_login_success(&self) {
        Mock::given(method("POST"))
            .and(path("/"))
            .and(header(AMZ_TARGET, INITIATE_AUTH_TARGET))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "AuthenticationResult": {
                    "AccessToken": "access-token",
                    "IdToken": "id-token",
                    "RefreshToken": "refresh-token",
                    "ExpiresIn": 3600,
                    "TokenType": "Bearer"
                },
                "ChallengeParameters": {}
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_login_challenge(&self, challenge: &str) {
        Mock::given(method("POST"))
            .and(path("/"))
            .and(header(AMZ_TARGET, INITIATE_AUTH_TARGET))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ChallengeName": challenge,
                "Session": "session-token",
                "ChallengeParameters": {}
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_sign_up_success(&self, user_sub: &str, confirmed: bool) {
        Mock::given(method("POST"))
            .and(path("/"))
            .and(header(AMZ_TARGET, SIGN_UP_TARGET))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "UserConfirmed": confirmed,
                "UserSub": user_sub
            })))
            .mount(&self.server)
            .await;
    }

    /// Answer `target` with a Cognito-style error body
    pub async fn mock_error(&self, target: &str, status: u16, error_type: &str, message: &str) {
        Mock::given(method("POST"))
            .and(path("/"))
            .and(header(AMZ_TARGET, target))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "__type": error_type,
                "message": message
            })))
            .mount(&self.server)
            .await;
    }
}

/// Test state backed by a `CognitoClient` pointed at a mock server
#[derive(Clone)]
pub struct TestAppState {
    pub config: Arc<Config>,
    pub auth_service: Arc<AuthService<CognitoClient>>,
}

impl TestAppState {
    pub async fn new(cognito_url: &str, client_secret: Option<&str>) -> Self {
        let config = test_config(cognito_url, client_secret);
        let client = CognitoClient::from_config(config.cognito.clone()).await;
        Self {
            config: Arc::new(config),
            auth_service: Arc::new(AuthService::new(Arc::new(client))),
        }
    }

    pub async fn with_mock_cognito(mock: &MockCognitoServer) -> Self {
        Self::new(&mock.uri(), Some(CLIENT_SECRET)).await
    }
}

impl HasServices for TestAppState {
    type Provider = CognitoClient;

    fn config(&self) -> &Config {
        &self.config
    }

    fn auth_service(&self) -> &AuthService<Self::Provider> {
        &self.auth_service
    }
}

pub fn build_test_router(state: TestAppState) -> axum::Router {
    build_router(state, None)
}

pub fn login_body(email: &str, password: &str) -> Value {
    json!({ "email": email, "password": password })
}

pub fn create_user_body(name: &str, email: &str, password: &str) -> Value {
    json!({ "name": name, "email": email, "password": password })
}

// ============================================================================
// HTTP Test Helpers
// ============================================================================

async fn send<S>(app: &S, request: Request<Body>) -> (StatusCode, Option<Value>)
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone,
{
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_default();

    if body_bytes.is_empty() {
        return (status, None);
    }

    match serde_json::from_slice(&body_bytes) {
        Ok(data) => (status, Some(data)),
        Err(_) => (status, None),
    }
}

/// Make a GET request and parse JSON response
pub async fn get_json<S>(app: &S, path: &str) -> (StatusCode, Option<Value>)
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone,
{
    let request = Request::builder()
        .method(Method::GET)
        .uri(path)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Make a POST request with JSON body and parse JSON response
pub async fn post_json<S, T>(app: &S, path: &str, body: &T) -> (StatusCode, Option<Value>)
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone,
    T: Serialize,
{
    let request = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap();
    send(app, request).await
}

/// POST a raw body with the given content type
pub async fn post_raw<S>(
    app: &S,
    path: &str,
    content_type: &str,
    body: &str,
) -> (StatusCode, Option<Value>)
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone,
{
    let request = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header("Content-Type", content_type)
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// Deserialize the `data` member of a success envelope
pub fn data<T: DeserializeOwned>(body: &Option<Value>) -> T {
    let body = body.as_ref().expect("response body");
    assert_eq!(body["success"], true, "not a success envelope: {body}");
    serde_json::from_value(body["data"].clone()).unwrap()
}
