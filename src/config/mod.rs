//! Configuration management for the auth API

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server host
    pub http_host: String,
    /// HTTP server port
    pub http_port: u16,
    /// Cognito configuration
    pub cognito: CognitoConfig,
    /// Logging and metrics configuration
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone)]
pub struct CognitoConfig {
    pub region: String,
    pub user_pool_id: String,
    pub client_id: String,
    /// App client secret. `None` for public clients, in which case no
    /// SECRET_HASH is sent.
    pub client_secret: Option<String>,
    /// Endpoint override for local emulators. `None` uses the regional
    /// endpoint the SDK resolves.
    pub endpoint: Option<String>,
    /// Explicit AWS credentials. Without them the default chain is used.
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub timeout_secs: u64,
    /// SDK attempts per operation, including the first
    pub max_attempts: u32,
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    /// "json" or "pretty"
    pub log_format: String,
    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "videoproc-auth".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            http_host: env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: parse_or("HTTP_PORT", env::var("HTTP_PORT").ok(), 8080)?,
            cognito: CognitoConfig {
                region: env::var("COGNITO_REGION").context("COGNITO_REGION is required")?,
                user_pool_id: env::var("COGNITO_USER_POOL_ID").unwrap_or_default(),
                client_id: env::var("COGNITO_CLIENT_ID")
                    .context("COGNITO_CLIENT_ID is required")?,
                client_secret: non_empty(env::var("COGNITO_CLIENT_SECRET").ok()),
                endpoint: non_empty(env::var("COGNITO_ENDPOINT").ok()),
                access_key_id: non_empty(env::var("COGNITO_ACCESS_KEY_ID").ok()),
                secret_access_key: non_empty(env::var("COGNITO_SECRET_ACCESS_KEY").ok()),
                timeout_secs: parse_or(
                    "COGNITO_TIMEOUT_SECS",
                    env::var("COGNITO_TIMEOUT_SECS").ok(),
                    30,
                )?,
                max_attempts: parse_or(
                    "COGNITO_MAX_ATTEMPTS",
                    env::var("COGNITO_MAX_ATTEMPTS").ok(),
                    3,
                )?,
            },
            telemetry: TelemetryConfig {
                service_name: env::var("SERVICE_NAME")
                    .unwrap_or_else(|_| "videoproc-auth".to_string()),
                log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
                metrics_enabled: env::var("METRICS_ENABLED")
                    .map(|s| s.to_lowercase() != "false")
                    .unwrap_or(true),
            },
        })
    }

    /// Get HTTP server address
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

/// Parse `value` read from `key`, falling back to `default` when unset.
fn parse_or<T>(key: &str, value: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: {:?}", key, raw)),
        None => Ok(default),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
