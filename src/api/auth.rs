//! Authentication API handlers

use super::ApiResponse;
use crate::domain::{LoginInput, LoginResponse};
use crate::error::Result;
use crate::state::HasServices;
use axum::{extract::State, Json};

/// Authenticate a user with email and password
pub async fn login<S: HasServices>(
    State(state): State<S>,
    Json(input): Json<LoginInput>,
) -> Result<Json<ApiResponse<LoginResponse>>> {
    let response = state.auth_service().login(input).await?;
    Ok(Json(ApiResponse::new(response)))
}
