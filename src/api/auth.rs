use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::extract::ApiJson;
use super::validation::{validate_email, validate_name, validate_password};
use super::{ApiError, ApiResponse, AppState, LoginRequest, RegisterRequest};
use crate::db::User;
use crate::services::{AuthError, AuthSession, CallerIdentity};

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailTaken => Self::Conflict(err.to_string()),
            AuthError::InvalidCredentials | AuthError::InvalidToken => {
                Self::Unauthorized(err.to_string())
            }
            AuthError::Database(msg) => Self::DatabaseError(msg),
            AuthError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Resolves an `Authorization: Bearer <token>` header into a [`CallerIdentity`]
/// request extension.
///
/// Requests without a bearer token pass through anonymously. A token that
/// fails verification, or whose subject no longer exists, is rejected with
/// 401 on every route, public ones included.
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(token) = extract_bearer_token(request.headers()) {
        let auth = state.auth_service();
        let claims = auth.verify_token(&token).inspect_err(|_| {
            tracing::debug!("Rejected request with invalid bearer token");
        })?;
        let user = auth.validate_user(&claims).await?;

        tracing::Span::current().record("user_id", user.id);
        request.extensions_mut().insert(CallerIdentity {
            user_id: claims.user_id(),
            email: user.email,
        });
    }

    Ok(next.run(request).await)
}

/// Rejects anonymous requests with 401. Outermost route layer on token routes.
pub async fn require_authentication(request: Request, next: Next) -> Result<Response, ApiError> {
    if request.extensions().get::<CallerIdentity>().is_none() {
        return Err(ApiError::unauthorized("User not authenticated"));
    }
    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("User not authenticated"))
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = validate_name(&payload.name)?;
    let email = validate_email(&payload.email)?;
    let password = validate_password(&payload.password)?;

    let session = state.auth_service().register(name, email, password).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(session))))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<ApiResponse<AuthSession>>, ApiError> {
    let email = validate_email(&payload.email)?;
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let session = state.auth_service().login(email, &payload.password).await?;

    Ok(Json(ApiResponse::success(session)))
}

/// GET /auth/profile
pub async fn profile(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let user = state
        .user_service()
        .find_one(caller.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid token"))?;

    Ok(Json(ApiResponse::success(user)))
}
