//! Login and user creation use cases

use crate::cognito::IdentityProvider;
use crate::domain::{CreateUserInput, CreateUserResponse, LoginInput, LoginResponse};
use crate::error::Result;
use metrics::counter;
use std::sync::Arc;
use validator::Validate;

pub struct AuthService<P: IdentityProvider> {
    provider: Arc<P>,
}

impl<P: IdentityProvider> AuthService<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    pub async fn login(&self, input: LoginInput) -> Result<LoginResponse> {
        input.validate()?;
        tracing::info!(email = %input.email, "Executing login use case");

        let output = match self.provider.login(&input.email, &input.password).await {
            Ok(output) => output,
            Err(e) => {
                counter!("auth_login_total", "result" => "failure", "code" => e.code())
                    .increment(1);
                return Err(e);
            }
        };

        counter!("auth_login_total", "result" => "success").increment(1);
        tracing::info!(email = %input.email, "Login successful");

        Ok(output.into())
    }

    pub async fn create_user(&self, input: CreateUserInput) -> Result<CreateUserResponse> {
        input.validate()?;
        tracing::info!(email = %input.email, "Executing create user use case");

        let output = match self
            .provider
            .sign_up(&input.name, &input.email, &input.password)
            .await
        {
            Ok(output) => output,
            Err(e) => {
                counter!("auth_sign_up_total", "result" => "failure", "code" => e.code())
                    .increment(1);
                return Err(e);
            }
        };

        counter!("auth_sign_up_total", "result" => "success").increment(1);
        tracing::info!(
            email = %input.email,
            user_id = %output.user_id,
            user_confirmed = output.user_confirmed,
            "User created"
        );

        Ok(output.into())
    }
}
