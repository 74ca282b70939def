//! Server initialization and routing

use crate::api;
use crate::cognito::CognitoClient;
use crate::config::Config;
use crate::error::error_envelope;
use crate::middleware::{
    gateway_path::GatewayPathMiddleware, normalize_error_response, GatewayPathLayer,
    ObservabilityLayer, SanitizedMakeSpan,
};
use crate::service::AuthService;
use crate::state::HasServices;
use anyhow::Result;
use axum::{
    extract::Request,
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Router, ServiceExt,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::Layer;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

/// Set by the Lambda execution environment
const LAMBDA_RUNTIME_API: &str = "AWS_LAMBDA_RUNTIME_API";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth_service: Arc<AuthService<CognitoClient>>,
}

impl AppState {
    /// Wire the production Cognito client into the auth service.
    pub async fn new(config: Config) -> Self {
        let cognito_client = Arc::new(CognitoClient::from_config(config.cognito.clone()).await);
        info!(
            region = %config.cognito.region,
            endpoint = config.cognito.endpoint.as_deref().unwrap_or("default"),
            user_pool_id = %config.cognito.user_pool_id,
            client_id = %cognito_client.client_id(),
            secret_hash = config.cognito.client_secret.is_some(),
            "Cognito client initialized"
        );

        Self {
            config: Arc::new(config),
            auth_service: Arc::new(AuthService::new(cognito_client)),
        }
    }
}

impl HasServices for AppState {
    type Provider = CognitoClient;

    fn config(&self) -> &Config {
        &self.config
    }

    fn auth_service(&self) -> &AuthService<Self::Provider> {
        &self.auth_service
    }
}

/// How the process receives requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hosting {
    /// Standalone HTTP listener
    Http,
    /// AWS Lambda behind API Gateway or a function URL
    Lambda,
}

impl Hosting {
    /// Lambda when the runtime API address is set, HTTP otherwise.
    pub fn detect(runtime_api: Option<&str>) -> Self {
        match runtime_api {
            Some(api) if !api.trim().is_empty() => Self::Lambda,
            _ => Self::Http,
        }
    }

    pub fn from_env() -> Self {
        Self::detect(std::env::var(LAMBDA_RUNTIME_API).ok().as_deref())
    }
}

/// Serve the application in whichever hosting mode the environment selects.
pub async fn run(config: Config, prometheus_handle: Option<PrometheusHandle>) -> Result<()> {
    match Hosting::from_env() {
        Hosting::Lambda => run_lambda(config, prometheus_handle).await,
        Hosting::Http => run_http(config, prometheus_handle).await,
    }
}

/// Hand the application to the Lambda runtime.
///
/// Each invocation is converted to an HTTP request and passed through the
/// same gateway rewrite and router as the standalone server.
pub async fn run_lambda(config: Config, prometheus_handle: Option<PrometheusHandle>) -> Result<()> {
    let state = AppState::new(config).await;
    let app = build_app(state, prometheus_handle);

    info!("Lambda runtime started");
    lambda_http::run(app)
        .await
        .map_err(|e| anyhow::anyhow!("Lambda runtime failed: {}", e))
}

/// Run the HTTP server until Ctrl-C or SIGTERM.
pub async fn run_http(config: Config, prometheus_handle: Option<PrometheusHandle>) -> Result<()> {
    let http_addr = config.http_addr();
    let state = AppState::new(config).await;
    let app = build_app(state, prometheus_handle);

    let listener = TcpListener::bind(&http_addr).await?;
    info!("HTTP server started on {}", http_addr);

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

/// Router wrapped in the gateway path layer.
///
/// The rewrite has to happen before route matching, which `Router::layer`
/// cannot do, so the whole router is wrapped instead.
pub fn build_app<S: HasServices>(
    state: S,
    prometheus_handle: Option<PrometheusHandle>,
) -> GatewayPathMiddleware<Router> {
    GatewayPathLayer::from_env().layer(build_router(state, prometheus_handle))
}

/// Build the HTTP router with generic state type
///
/// This function is generic over the state type, allowing it to work with
/// both production `AppState` and test implementations that implement `HasServices`.
pub fn build_router<S: HasServices>(
    state: S,
    prometheus_handle: Option<PrometheusHandle>,
) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(api::health::health::<S>))
        .route("/auth/login", post(api::auth::login::<S>))
        .route("/auth/users/create", post(api::user::create::<S>))
        .with_state(state)
        .route(
            "/metrics",
            get(api::metrics::metrics_handler).with_state(Arc::new(prometheus_handle)),
        )
        .fallback(not_found)
        .layer(axum::middleware::from_fn(normalize_error_response))
        .layer(ObservabilityLayer)
        .layer(TraceLayer::new_for_http().make_span_with(SanitizedMakeSpan))
        .layer(cors)
}

async fn not_found() -> Response {
    error_envelope(StatusCode::NOT_FOUND, "NotFound", "Resource not found.")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
