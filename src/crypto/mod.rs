//! Cryptographic utilities

pub mod secret_hash;

pub use secret_hash::compute_secret_hash;
