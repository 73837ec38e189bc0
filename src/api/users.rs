//! User management endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::user::{CreateUser, UpdateUser, User, UserShort},
};

use super::{ApiJson, MessageResponse};

/// User list response
#[derive(Serialize, ToSchema)]
pub struct UsersResponse {
    pub success: bool,
    pub users: Vec<UserShort>,
}

/// Single user response
#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub success: bool,
    pub user: User,
}

/// List library members (role `user`)
#[utoipa::path(
    get,
    path = "/users/list",
    tag = "users",
    responses(
        (status = 200, description = "List of members", body = UsersResponse)
    )
)]
pub async fn list_users(State(state): State<crate::AppState>) -> AppResult<Json<UsersResponse>> {
    let users = state.services.users.list_members().await?;

    Ok(Json(UsersResponse {
        success: true,
        users,
    }))
}

/// Get user details by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    params(
        ("id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User details", body = UserResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_user(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<UserResponse>> {
    let user = state.services.users.get_user(&id).await?;

    Ok(Json(UserResponse {
        success: true,
        user,
    }))
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid input or username/email already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<crate::AppState>,
    ApiJson(user): ApiJson<CreateUser>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let created = state.services.users.create_user(user).await?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            success: true,
            user: created,
        }),
    ))
}

/// Update an existing user
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    params(
        ("id" = String, Path, description = "User ID")
    ),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_user(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
    ApiJson(user): ApiJson<UpdateUser>,
) -> AppResult<Json<UserResponse>> {
    let updated = state.services.users.update_user(&id, user).await?;

    Ok(Json(UserResponse {
        success: true,
        user: updated,
    }))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    params(
        ("id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User deleted (also reported for unknown IDs)", body = MessageResponse)
    )
)]
pub async fn delete_user(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.services.users.delete_user(&id).await?;

    Ok(Json(MessageResponse::ok("Usuario eliminado")))
}
