//! Identity provider integration
//!
//! `IdentityProvider` is the port the use cases depend on; `CognitoClient`
//! implements it against a Cognito user pool.

pub mod client;

pub use client::CognitoClient;

use crate::domain::{CreateUserOutput, LoginOutput};
use crate::error::Result;
use async_trait::async_trait;

/// Operations delegated to the managed identity provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Authenticate with e-mail and password and return the issued tokens.
    async fn login(&self, email: &str, password: &str) -> Result<LoginOutput>;

    /// Register a new user identified by e-mail.
    async fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<CreateUserOutput>;
}
