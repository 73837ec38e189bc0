//! Session endpoint

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::user::{LoginRequest, SessionUser},
    services::users::INVALID_CREDENTIALS,
};

use super::ApiJson;

/// Successful login response
#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    pub user: SessionUser,
}

/// Authenticate with username and password
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    body: Result<ApiJson<LoginRequest>, AppError>,
) -> AppResult<Json<LoginResponse>> {
    // A malformed body is a failed login like any other mismatch
    let ApiJson(request) = body.map_err(|rejection| {
        tracing::debug!("Unreadable login body: {}", rejection);
        AppError::Authentication(INVALID_CREDENTIALS.to_string())
    })?;

    let user = state
        .services
        .users
        .authenticate(&request.username, &request.password)
        .await?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        success: true,
        user: user.into(),
    }))
}
