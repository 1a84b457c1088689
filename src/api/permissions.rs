use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::db::Permission;

/// GET /permissions
pub async fn list_permissions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Permission>>>, ApiError> {
    let permissions = state.permission_service().find_all().await?;
    Ok(Json(ApiResponse::success(permissions)))
}
