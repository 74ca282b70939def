//! VideoProc Auth - authentication service for the video processing platform
//!
//! Fronts an AWS Cognito user pool with a small REST API (login and user
//! registration) and strips API gateway stage/prefix segments so the same
//! routes work behind any gateway mount point.

pub mod api;
pub mod cognito;
pub mod config;
pub mod crypto;
pub mod domain;
pub mod error;
pub mod middleware;
pub mod server;
pub mod service;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
