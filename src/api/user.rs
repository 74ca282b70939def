//! User management API handlers

use super::ApiResponse;
use crate::domain::{CreateUserInput, CreateUserResponse};
use crate::error::Result;
use crate::state::HasServices;
use axum::{extract::State, http::StatusCode, Json};

/// Register a new user in the identity provider
pub async fn create<S: HasServices>(
    State(state): State<S>,
    Json(input): Json<CreateUserInput>,
) -> Result<(StatusCode, Json<ApiResponse<CreateUserResponse>>)> {
    let response = state.auth_service().create_user(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(response))))
}
