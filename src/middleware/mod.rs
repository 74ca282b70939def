//! HTTP middleware
//!
//! - Gateway path normalization (wraps the whole router)
//! - Error response normalization
//! - Request ID propagation and HTTP metrics
//! - Log-safe request spans

pub mod error_response;
pub mod gateway_path;
pub mod metrics;
pub mod trace;

pub use error_response::normalize_error_response;
pub use gateway_path::{GatewayPathLayer, GatewayRules, PathBase, RoutedPath};
pub use metrics::ObservabilityLayer;
pub use trace::SanitizedMakeSpan;
