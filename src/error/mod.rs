//! Unified error handling for the auth API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Identity provider error: {0}")]
    IdentityProvider(#[from] ProviderError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Error kinds reported by the identity provider.
///
/// Classified from the modeled Cognito exceptions. Any other modeled code is
/// carried as `Other` and treated as an upstream failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderErrorKind {
    NotAuthorized,
    UserNotFound,
    UserNotConfirmed,
    UsernameExists,
    InvalidPassword,
    TooManyRequests,
    InvalidParameter,
    Other(String),
    /// Transport failure or an unreadable response
    Unavailable,
}

/// An error returned by (or while talking to) the identity provider.
#[derive(Error, Debug, Clone)]
#[error("{kind:?}: {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unavailable, message)
    }
}

/// A single failed field constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Error response body
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    success: bool,
    error: ErrorDetail,
    timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: &'static str,
}

/// Validation failure body
#[derive(Serialize)]
struct ValidationErrorResponse<'a> {
    success: bool,
    errors: &'a [FieldError],
}

impl AppError {
    /// Status, machine-readable code and client-facing message for this error.
    fn parts(&self) -> (StatusCode, &'static str, &'static str) {
        match self {
            AppError::BadRequest(_) | AppError::Validation(_) => {
                (StatusCode::BAD_REQUEST, "BadRequest", "Invalid request.")
            }
            AppError::Unauthorized(_) => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                "Unauthorized access.",
            ),
            AppError::IdentityProvider(e) => match e.kind {
                ProviderErrorKind::NotAuthorized | ProviderErrorKind::UserNotFound => (
                    StatusCode::UNAUTHORIZED,
                    "InvalidCredentials",
                    "Invalid credentials.",
                ),
                ProviderErrorKind::UserNotConfirmed => (
                    StatusCode::FORBIDDEN,
                    "UserNotConfirmed",
                    "Account not confirmed. Check your e-mail and confirm the sign-up.",
                ),
                ProviderErrorKind::UsernameExists => (
                    StatusCode::CONFLICT,
                    "UserAlreadyExists",
                    "User already exists.",
                ),
                ProviderErrorKind::InvalidPassword => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "InvalidPassword",
                    "Password does not meet the policy requirements.",
                ),
                ProviderErrorKind::TooManyRequests => (
                    StatusCode::TOO_MANY_REQUESTS,
                    "TooManyRequests",
                    "Request limit exceeded.",
                ),
                ProviderErrorKind::InvalidParameter => (
                    StatusCode::BAD_REQUEST,
                    "InvalidParameter",
                    "Invalid parameter.",
                ),
                ProviderErrorKind::Other(_) | ProviderErrorKind::Unavailable => (
                    StatusCode::BAD_GATEWAY,
                    "ExternalServiceError",
                    "Error communicating with the authentication service.",
                ),
            },
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalServerError",
                "Internal server error.",
            ),
        }
    }

    /// HTTP status this error maps to
    pub fn status(&self) -> StatusCode {
        self.parts().0
    }

    /// Machine-readable error code returned to clients
    pub fn code(&self) -> &'static str {
        self.parts().1
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Validation(errors) => {
                let body = Json(ValidationErrorResponse {
                    success: false,
                    errors,
                });
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::IdentityProvider(e) => match e.kind {
                ProviderErrorKind::Other(_) | ProviderErrorKind::Unavailable => {
                    tracing::error!("Identity provider error: {}", e);
                }
                _ => tracing::debug!("Identity provider rejected request: {}", e),
            },
            AppError::Internal(e) => tracing::error!("Internal error: {:?}", e),
            AppError::BadRequest(msg) | AppError::Unauthorized(msg) => {
                tracing::debug!("{}", msg)
            }
        }

        let (status, code, message) = self.parts();
        error_envelope(status, code, message)
    }
}

/// Build the standard error envelope for a status, code and message.
pub fn error_envelope(status: StatusCode, code: &'static str, message: &'static str) -> Response {
    let body = Json(ErrorResponse {
        success: false,
        error: ErrorDetail { code, message },
        timestamp: Utc::now(),
    });

    (status, body).into_response()
}

// Conversion from validation errors
impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid.", field)),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        AppError::Validation(fields)
    }
}
