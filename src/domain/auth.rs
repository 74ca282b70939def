//! Login and sign-up models

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Rejects empty and whitespace-only values
fn required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

/// Input for logging in with e-mail and password
///
/// Property names are accepted in camelCase, PascalCase or upper case.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginInput {
    #[serde(default, alias = "Email", alias = "EMAIL")]
    #[validate(
        custom(function = "required", message = "Email is required."),
        length(max = 256, message = "Email must be at most 256 characters."),
        email(message = "Email must be a valid address.")
    )]
    pub email: String,
    #[serde(default, alias = "Password", alias = "PASSWORD")]
    #[validate(
        custom(function = "required", message = "Password is required."),
        length(
            min = 8,
            max = 256,
            message = "Password must be between 8 and 256 characters."
        )
    )]
    pub password: String,
}

/// Input for creating a new user in the pool
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserInput {
    #[serde(default, alias = "Name", alias = "NAME")]
    #[validate(
        custom(function = "required", message = "Name is required."),
        length(max = 256, message = "Name must be at most 256 characters.")
    )]
    pub name: String,
    #[serde(default, alias = "Email", alias = "EMAIL")]
    #[validate(
        custom(function = "required", message = "Email is required."),
        length(max = 256, message = "Email must be at most 256 characters."),
        email(message = "Email must be a valid address.")
    )]
    pub email: String,
    #[serde(default, alias = "Password", alias = "PASSWORD")]
    #[validate(
        custom(function = "required", message = "Password is required."),
        length(
            min = 8,
            max = 256,
            message = "Password must be between 8 and 256 characters."
        )
    )]
    pub password: String,
}

/// Tokens issued by the identity provider on a successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutput {
    pub access_token: String,
    pub id_token: String,
    /// May be absent depending on the pool configuration
    pub refresh_token: Option<String>,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    pub token_type: String,
}

/// Result of a sign-up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUserOutput {
    /// Provider-side unique id (Cognito `UserSub`)
    pub user_id: String,
    pub username: String,
    pub user_confirmed: bool,
    pub confirmation_required: bool,
}

/// Login response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub id_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    pub token_type: String,
}

impl From<LoginOutput> for LoginResponse {
    fn from(output: LoginOutput) -> Self {
        Self {
            access_token: output.access_token,
            id_token: output.id_token,
            refresh_token: output.refresh_token,
            expires_in: output.expires_in,
            token_type: output.token_type,
        }
    }
}

/// Create-user response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserResponse {
    pub user_id: String,
    pub username: String,
    pub user_confirmed: bool,
    pub confirmation_required: bool,
}

impl From<CreateUserOutput> for CreateUserResponse {
    fn from(output: CreateUserOutput) -> Self {
        Self {
            user_id: output.user_id,
            username: output.username,
            user_confirmed: output.user_confirmed,
            confirmation_required: output.confirmation_required,
        }
    }
}
