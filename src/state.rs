//! Application state traits for dependency injection
//!
//! Handlers are generic over `HasServices`, so the same router runs against
//! the production `AppState` and against test states backed by a mock
//! identity provider.

use crate::cognito::IdentityProvider;
use crate::config::Config;
use crate::service::AuthService;

/// Trait for application state that provides access to all services.
pub trait HasServices: Clone + Send + Sync + 'static {
    /// The identity provider behind the auth use cases
    type Provider: IdentityProvider + 'static;

    /// Get the application configuration
    fn config(&self) -> &Config;

    /// Get the login / sign-up service
    fn auth_service(&self) -> &AuthService<Self::Provider>;
}
