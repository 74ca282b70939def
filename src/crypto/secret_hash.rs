//! SECRET_HASH computation for confidential Cognito app clients.
//!
//! Cognito requires `Base64(HMAC-SHA256(client_secret, username + client_id))`
//! on auth and sign-up calls whenever the app client has a secret.

use crate::error::{AppError, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the SECRET_HASH for `identity` (the login username, here the
/// e-mail) under the given app client.
///
/// Callers must skip this when the client has no secret.
pub fn compute_secret_hash(identity: &str, client_id: &str, client_secret: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(client_secret.as_bytes())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid HMAC key: {}", e)))?;

    mac.update(identity.as_bytes());
    mac.update(client_id.as_bytes());

    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}
