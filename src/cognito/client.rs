//! Cognito user pool client
//!
//! `InitiateAuth` and `SignUp` go through the AWS SDK. Confidential app
//! clients add a SECRET_HASH to each call.

use crate::config::CognitoConfig;
use crate::crypto::compute_secret_hash;
use crate::domain::{CreateUserOutput, LoginOutput};
use crate::error::{AppError, ProviderError, ProviderErrorKind, Result};
use anyhow::Context;
use async_trait::async_trait;
use aws_sdk_cognitoidentityprovider::{
    config::{retry::RetryConfig, timeout::TimeoutConfig, Builder, Credentials, Region},
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    operation::{initiate_auth::InitiateAuthError, sign_up::SignUpError},
    types::{AttributeType, AuthFlowType},
    Client,
};
use metrics::{counter, histogram};
use std::time::{Duration, Instant};

use super::IdentityProvider;

/// Cognito user pool client
#[derive(Clone)]
pub struct CognitoClient {
    client: Client,
    config: CognitoConfig,
}

impl CognitoClient {
    /// Create a new Cognito client from configuration
    ///
    /// Async because the SDK resolves credentials and region while loading.
    pub async fn from_config(config: CognitoConfig) -> Self {
        let mut loader = aws_config::from_env().region(Region::new(config.region.clone()));

        if let (Some(access_key), Some(secret_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            loader = loader.credentials_provider(Credentials::new(
                access_key.clone(),
                secret_key.clone(),
                None,
                None,
                "videoproc-auth",
            ));
        }

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint.clone());
        }

        let sdk_config = loader.load().await;
        let client_config = Builder::from(&sdk_config)
            .retry_config(RetryConfig::standard().with_max_attempts(config.max_attempts.max(1)))
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(Duration::from_secs(config.timeout_secs))
                    .build(),
            )
            .build();

        Self {
            client: Client::from_conf(client_config),
            config,
        }
    }

    /// App client id used for every call
    pub fn client_id(&self) -> &str {
        &self.config.client_id
    }

    /// SECRET_HASH for `username`, or `None` for a public app client
    fn secret_hash(&self, username: &str) -> Result<Option<String>> {
        match self.config.client_secret.as_deref() {
            Some(secret) if !secret.is_empty() => Ok(Some(compute_secret_hash(
                username,
                &self.config.client_id,
                secret,
            )?)),
            _ => Ok(None),
        }
    }
}

fn record(operation: &'static str, start: Instant, result: &std::result::Result<(), &ProviderError>) {
    let outcome = match result {
        Ok(()) => "ok",
        Err(e) => AppError::IdentityProvider((*e).clone()).code(),
    };
    counter!("cognito_requests_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
    histogram!("cognito_request_duration_seconds", "operation" => operation)
        .record(start.elapsed().as_secs_f64());
}

/// Map an SDK failure onto a provider error.
///
/// Modeled service errors are classified by `classify`; other modeled codes
/// become `Other`. Transport, timeout and unparseable responses are
/// `Unavailable`.
fn provider_error<E, R>(
    operation: &str,
    err: SdkError<E, R>,
    classify: fn(&E) -> Option<ProviderErrorKind>,
) -> ProviderError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match err {
        SdkError::ServiceError(context) => {
            let err = context.into_err();
            let kind = match (classify(&err), err.code()) {
                (Some(kind), _) => kind,
                (None, Some(code)) => ProviderErrorKind::Other(code.to_string()),
                (None, None) => {
                    return ProviderError::unavailable(format!(
                        "{} failed: {}",
                        operation,
                        DisplayErrorContext(&err)
                    ))
                }
            };
            ProviderError::new(kind, err.message().unwrap_or_default())
        }
        other => ProviderError::unavailable(format!(
            "Failed to call {}: {}",
            operation,
            DisplayErrorContext(&other)
        )),
    }
}

fn classify_initiate_auth(err: &InitiateAuthError) -> Option<ProviderErrorKind> {
    match err {
        InitiateAuthError::NotAuthorizedException(_) => Some(ProviderErrorKind::NotAuthorized),
        InitiateAuthError::UserNotFoundException(_) => Some(ProviderErrorKind::UserNotFound),
        InitiateAuthError::UserNotConfirmedException(_) => {
            Some(ProviderErrorKind::UserNotConfirmed)
        }
        InitiateAuthError::TooManyRequestsException(_) => Some(ProviderErrorKind::TooManyRequests),
        InitiateAuthError::InvalidParameterException(_) => {
            Some(ProviderErrorKind::InvalidParameter)
        }
        _ => None,
    }
}

fn classify_sign_up(err: &SignUpError) -> Option<ProviderErrorKind> {
    match err {
        SignUpError::UsernameExistsException(_) => Some(ProviderErrorKind::UsernameExists),
        SignUpError::InvalidPasswordException(_) => Some(ProviderErrorKind::InvalidPassword),
        SignUpError::InvalidParameterException(_) => Some(ProviderErrorKind::InvalidParameter),
        SignUpError::TooManyRequestsException(_) => Some(ProviderErrorKind::TooManyRequests),
        SignUpError::NotAuthorizedException(_) => Some(ProviderErrorKind::NotAuthorized),
        _ => None,
    }
}

fn user_attribute(name: &str, value: &str) -> Result<AttributeType> {
    Ok(AttributeType::builder()
        .name(name)
        .value(value)
        .build()
        .context("Failed to build user attribute")?)
}

#[async_trait]
impl IdentityProvider for CognitoClient {
    async fn login(&self, email: &str, password: &str) -> Result<LoginOutput> {
        tracing::info!(email = %email, "Attempting login");

        let mut request = self
            .client
            .initiate_auth()
            .auth_flow(AuthFlowType::UserPasswordAuth)
            .client_id(&self.config.client_id)
            .auth_parameters("USERNAME", email)
            .auth_parameters("PASSWORD", password);
        if let Some(hash) = self.secret_hash(email)? {
            request = request.auth_parameters("SECRET_HASH", hash);
        }

        let start = Instant::now();
        let result = request
            .send()
            .await
            .map_err(|e| provider_error("InitiateAuth", e, classify_initiate_auth));
        record("InitiateAuth", start, &result.as_ref().map(|_| ()));

        let response = match result {
            Ok(r) => r,
            Err(e) => {
                if matches!(
                    e.kind,
                    ProviderErrorKind::NotAuthorized | ProviderErrorKind::UserNotFound
                ) {
                    tracing::warn!(email = %email, kind = ?e.kind, "Login failed");
                }
                return Err(e.into());
            }
        };

        let Some(tokens) = response.authentication_result() else {
            tracing::warn!(
                email = %email,
                challenge = ?response.challenge_name(),
                "Login failed: no authentication result"
            );
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        };

        let (Some(access_token), Some(id_token)) = (tokens.access_token(), tokens.id_token())
        else {
            return Err(ProviderError::unavailable("InitiateAuth returned no tokens").into());
        };

        tracing::info!(email = %email, "Login successful");

        Ok(LoginOutput {
            access_token: access_token.to_string(),
            id_token: id_token.to_string(),
            refresh_token: tokens.refresh_token().map(str::to_string),
            expires_in: i64::from(tokens.expires_in()),
            token_type: tokens.token_type().unwrap_or("Bearer").to_string(),
        })
    }

    async fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<CreateUserOutput> {
        tracing::info!(email = %email, "Attempting to create user");

        let request = self
            .client
            .sign_up()
            .client_id(&self.config.client_id)
            .username(email)
            .password(password)
            .set_secret_hash(self.secret_hash(email)?)
            .user_attributes(user_attribute("email", email)?)
            .user_attributes(user_attribute("name", name)?);

        let start = Instant::now();
        let result = request
            .send()
            .await
            .map_err(|e| provider_error("SignUp", e, classify_sign_up));
        record("SignUp", start, &result.as_ref().map(|_| ()));

        let response = match result {
            Ok(r) => r,
            Err(e) => {
                match e.kind {
                    ProviderErrorKind::UsernameExists
                    | ProviderErrorKind::InvalidPassword
                    | ProviderErrorKind::InvalidParameter => {
                        tracing::warn!(email = %email, kind = ?e.kind, "User creation failed")
                    }
                    _ => tracing::error!(email = %email, error = %e, "User creation failed"),
                }
                return Err(e.into());
            }
        };

        tracing::info!(
            email = %email,
            user_sub = %response.user_sub(),
            user_confirmed = response.user_confirmed(),
            "User created"
        );

        Ok(CreateUserOutput {
            user_id: response.user_sub().to_string(),
            username: email.to_string(),
            user_confirmed: response.user_confirmed(),
            confirmation_required: !response.user_confirmed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(client_secret: Option<&str>) -> CognitoConfig {
        CognitoConfig {
            region: "us-east-1".to_string(),
            user_pool_id: "us-east-1_pool".to_string(),
            client_id: "test-client-id".to_string(),
            client_secret: client_secret.map(str::to_string),
            endpoint: Some("http://127.0.0.1:1".to_string()),
            access_key_id: Some("test".to_string()),
            secret_access_key: Some("test".to_string()),
            timeout_secs: 1,
            max_attempts: 1,
        }
    }

    #[tokio::test]
    async fn test_secret_hash_for_confidential_client() {
        let client = CognitoClient::from_config(config(Some("test-client-secret"))).await;

        assert_eq!(
            client.secret_hash("testuser").unwrap().as_deref(),
            Some("1xEAywlzj2kqs5YxvP7WXzmKCguLpp9VfyPimVGLIbc=")
        );
    }

    #[tokio::test]
    async fn test_public_client_has_no_secret_hash() {
        let client = CognitoClient::from_config(config(None)).await;
        assert_eq!(client.secret_hash("testuser").unwrap(), None);

        let client = CognitoClient::from_config(config(Some(""))).await;
        assert_eq!(client.secret_hash("testuser").unwrap(), None);
    }

    #[test]
    fn test_classify_initiate_auth() {
        let err = InitiateAuthError::NotAuthorizedException(
            aws_sdk_cognitoidentityprovider::types::error::NotAuthorizedException::builder()
                .message("Incorrect username or password.")
                .build(),
        );
        assert_eq!(
            classify_initiate_auth(&err),
            Some(ProviderErrorKind::NotAuthorized)
        );
    }

    #[test]
    fn test_classify_sign_up() {
        let err = SignUpError::UsernameExistsException(
            aws_sdk_cognitoidentityprovider::types::error::UsernameExistsException::builder()
                .build(),
        );
        assert_eq!(classify_sign_up(&err), Some(ProviderErrorKind::UsernameExists));
    }
}
