//! API gateway path normalization
//!
//! When the service sits behind an API gateway, requests arrive with a stage
//! segment (`/prod/...`) and/or a mount prefix (`/auth/...`) in front of the
//! real route. This layer strips both before routing so the router only ever
//! sees `/health`, `/auth/login` and friends.
//!
//! Rules are read from the process environment on every request:
//! - `GATEWAY_STAGE`: optional stage segment, removed without recording a base
//! - `GATEWAY_PATH_PREFIX`: optional prefix, recorded as [`PathBase`]
//!
//! Matching is ASCII case-insensitive and only on whole segments, so a
//! `/auth` prefix never eats `/authorize`. Anything that does not match passes
//! through untouched.
//!
//! `Router::layer` runs after route matching, so this layer must wrap the
//! finished router (see `server::build_app`).

use axum::http::{uri::PathAndQuery, Request, Uri};
use std::task::{Context, Poll};
use tower::{Layer, Service};

pub const GATEWAY_PATH_PREFIX_KEY: &str = "GATEWAY_PATH_PREFIX";
pub const GATEWAY_STAGE_KEY: &str = "GATEWAY_STAGE";

/// Path prefix stripped from the request, in the casing the client sent.
///
/// Inserted as a request extension whenever the gateway prefix matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathBase(pub String);

/// Result of applying [`GatewayRules`] to a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedPath {
    pub path_base: Option<String>,
    pub path: String,
}

impl RoutedPath {
    fn unchanged(path: &str) -> Self {
        Self {
            path_base: None,
            path: path.to_string(),
        }
    }
}

/// Normalized stage and prefix rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayRules {
    stage: Option<String>,
    prefix: Option<String>,
}

impl GatewayRules {
    /// Build rules from raw values, normalizing them the same way the
    /// environment values are normalized.
    pub fn new(stage: Option<&str>, prefix: Option<&str>) -> Self {
        Self {
            stage: stage.and_then(normalize_stage),
            prefix: prefix.and_then(normalize_prefix),
        }
    }

    /// Read rules from the given environment variables.
    pub fn from_env_keys(stage_key: &str, prefix_key: &str) -> Self {
        let stage = std::env::var(stage_key).ok();
        let prefix = std::env::var(prefix_key).ok();
        Self::new(stage.as_deref(), prefix.as_deref())
    }

    /// Read rules from `GATEWAY_STAGE` and `GATEWAY_PATH_PREFIX`.
    pub fn from_env() -> Self {
        Self::from_env_keys(GATEWAY_STAGE_KEY, GATEWAY_PATH_PREFIX_KEY)
    }

    pub fn is_empty(&self) -> bool {
        self.stage.is_none() && self.prefix.is_none()
    }

    /// Strip the stage, then the prefix, from `path`.
    pub fn apply(&self, path: &str) -> RoutedPath {
        let path = match &self.stage {
            Some(stage) => strip_segment(path, stage)
                .map(|(_, rest)| rest)
                .unwrap_or(path),
            None => path,
        };

        let Some(prefix) = &self.prefix else {
            return RoutedPath::unchanged(path);
        };

        match strip_segment(path, prefix) {
            Some((base, rest)) => RoutedPath {
                path_base: Some(base.to_string()),
                path: rest.to_string(),
            },
            None => RoutedPath::unchanged(path),
        }
    }
}

fn normalize_stage(raw: &str) -> Option<String> {
    let stage = raw.trim().trim_matches('/');
    if stage.is_empty() {
        return None;
    }
    Some(format!("/{stage}"))
}

fn normalize_prefix(raw: &str) -> Option<String> {
    let prefix = raw.trim();
    if prefix.is_empty() {
        return None;
    }

    let mut prefix = if prefix.starts_with('/') {
        prefix.to_string()
    } else {
        format!("/{prefix}")
    };
    if prefix.len() > 1 {
        let trimmed = prefix.trim_end_matches('/').len().max(1);
        prefix.truncate(trimmed);
    }
    Some(prefix)
}

/// Match `segment` at the start of `path` on a segment boundary.
///
/// Returns the matched slice (original casing) and the remainder, which is
/// `/` when the whole path matched.
fn strip_segment<'a>(path: &'a str, segment: &str) -> Option<(&'a str, &'a str)> {
    let head = path.get(..segment.len())?;
    if !head.eq_ignore_ascii_case(segment) {
        return None;
    }

    let rest = &path[segment.len()..];
    if rest.is_empty() {
        return Some((head, "/"));
    }
    if !rest.starts_with('/') {
        return None;
    }
    Some((head, rest))
}

#[derive(Debug, Clone)]
enum RuleSource {
    Env {
        stage_key: String,
        prefix_key: String,
    },
    Fixed(GatewayRules),
}

impl RuleSource {
    fn resolve(&self) -> GatewayRules {
        match self {
            RuleSource::Env {
                stage_key,
                prefix_key,
            } => GatewayRules::from_env_keys(stage_key, prefix_key),
            RuleSource::Fixed(rules) => rules.clone(),
        }
    }
}

/// Tower Layer that rewrites gateway-prefixed request paths.
#[derive(Debug, Clone)]
pub struct GatewayPathLayer {
    source: RuleSource,
}

impl GatewayPathLayer {
    /// Read `GATEWAY_STAGE` / `GATEWAY_PATH_PREFIX` on every request.
    pub fn from_env() -> Self {
        Self::with_env_keys(GATEWAY_STAGE_KEY, GATEWAY_PATH_PREFIX_KEY)
    }

    /// Read the given environment variables on every request.
    pub fn with_env_keys(stage_key: impl Into<String>, prefix_key: impl Into<String>) -> Self {
        Self {
            source: RuleSource::Env {
                stage_key: stage_key.into(),
                prefix_key: prefix_key.into(),
            },
        }
    }

    /// Use fixed rules instead of the environment.
    pub fn with_rules(rules: GatewayRules) -> Self {
        Self {
            source: RuleSource::Fixed(rules),
        }
    }
}

impl<S> Layer<S> for GatewayPathLayer {
    type Service = GatewayPathMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GatewayPathMiddleware {
            inner,
            source: self.source.clone(),
        }
    }
}

/// Tower Service applying [`GatewayRules`] before the inner service runs.
#[derive(Debug, Clone)]
pub struct GatewayPathMiddleware<S> {
    inner: S,
    source: RuleSource,
}

impl<S, B> Service<Request<B>> for GatewayPathMiddleware<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<B>) -> Self::Future {
        let rules = self.source.resolve();
        if !rules.is_empty() {
            rewrite_request(&rules, &mut request);
        }
        self.inner.call(request)
    }
}

fn rewrite_request<B>(rules: &GatewayRules, request: &mut Request<B>) {
    let original = request.uri().path().to_string();
    let routed = rules.apply(&original);
    if routed.path == original && routed.path_base.is_none() {
        return;
    }

    let path_and_query = match request.uri().query() {
        Some(query) => format!("{}?{}", routed.path, query),
        None => routed.path.clone(),
    };

    let mut parts = request.uri().clone().into_parts();
    parts.path_and_query = match path_and_query.parse::<PathAndQuery>() {
        Ok(pq) => Some(pq),
        Err(e) => {
            tracing::warn!(path = %original, error = %e, "Failed to rewrite gateway path");
            return;
        }
    };
    let uri = match Uri::from_parts(parts) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::warn!(path = %original, error = %e, "Failed to rewrite gateway path");
            return;
        }
    };

    tracing::debug!(
        original_path = %original,
        path_base = routed.path_base.as_deref().unwrap_or(""),
        path = %routed.path,
        "Gateway path rewritten"
    );

    *request.uri_mut() = uri;
    if let Some(base) = routed.path_base {
        request.extensions_mut().insert(PathBase(base));
    }
}
