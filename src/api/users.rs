//! User administration endpoints. The whole group requires `admin` except
//! `GET /users/me/permissions`, which any member may call.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::extract::{ApiJson, ApiPath};
use super::validation::{
    validate_email, validate_id, validate_name, validate_optional, validate_password,
};
use super::{
    ApiError, ApiResponse, AppState, AssignPermissionRequest, CreateUserRequest,
    UpdateUserRequest, UserPermissionsDto,
};
use crate::db::User;
use crate::domain::UserId;
use crate::services::{CallerIdentity, UserError, UserPatch};

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) | UserError::PermissionNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            UserError::EmailTaken => Self::Conflict(err.to_string()),
            UserError::Database(msg) => Self::DatabaseError(msg),
            UserError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

fn user_not_found() -> ApiError {
    ApiError::NotFound("User not found".to_string())
}

/// GET /users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<User>>>, ApiError> {
    let users = state.user_service().find_all().await?;
    Ok(Json(ApiResponse::success(users)))
}

/// POST /users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = validate_name(&payload.name)?;
    let email = validate_email(&payload.email)?;
    let password = validate_password(&payload.password)?;

    let user = state.user_service().create(name, email, password).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let id = validate_id("user", id)?;
    let user = state
        .user_service()
        .find_one(UserId::new(id))
        .await?
        .ok_or_else(user_not_found)?;
    Ok(Json(ApiResponse::success(user)))
}

/// PATCH /users/{id}
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let id = validate_id("user", id)?;
    let patch = UserPatch {
        name: validate_optional(payload.name.as_deref(), validate_name)?,
        email: validate_optional(payload.email.as_deref(), validate_email)?,
        password: validate_optional(payload.password.as_deref(), validate_password)?,
    };

    let user = state
        .user_service()
        .update(UserId::new(id), patch)
        .await?
        .ok_or_else(user_not_found)?;

    Ok(Json(ApiResponse::success(user)))
}

/// DELETE /users/{id}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, ApiError> {
    let id = validate_id("user", id)?;
    if !state.user_service().remove(UserId::new(id)).await? {
        return Err(user_not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /users/{id}/permissions
pub async fn get_user_permissions(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<ApiResponse<UserPermissionsDto>>, ApiError> {
    let id = validate_id("user", id)?;
    let user_id = UserId::new(id);

    if state.user_service().find_one(user_id).await?.is_none() {
        return Err(user_not_found());
    }
    let permissions = state.user_service().permissions(user_id).await?;

    Ok(Json(ApiResponse::success(UserPermissionsDto {
        user_id: id,
        permissions,
    })))
}

/// POST /users/{id}/permissions
pub async fn assign_user_permission(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<AssignPermissionRequest>,
) -> Result<Json<ApiResponse<UserPermissionsDto>>, ApiError> {
    let id = validate_id("user", id)?;
    let permission = payload.permission.trim();
    if permission.is_empty() {
        return Err(ApiError::validation("Permission is required"));
    }

    let user_id = UserId::new(id);
    state
        .permission_service()
        .assign_permission_to_user(user_id, permission)
        .await?;
    let permissions = state.user_service().permissions(user_id).await?;

    Ok(Json(ApiResponse::success(UserPermissionsDto {
        user_id: id,
        permissions,
    })))
}

/// GET /users/me/permissions
pub async fn my_permissions(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
) -> Result<Json<ApiResponse<UserPermissionsDto>>, ApiError> {
    let permissions = state
        .permission_service()
        .user_permissions(caller.user_id)
        .await?;

    Ok(Json(ApiResponse::success(UserPermissionsDto {
        user_id: caller.user_id.value(),
        permissions,
    })))
}
