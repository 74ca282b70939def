//! Domain models for the auth API

pub mod auth;

pub use auth::*;
