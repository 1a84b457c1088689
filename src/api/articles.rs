use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::extract::{ApiJson, ApiPath};
use super::validation::{
    validate_content, validate_id, validate_optional, validate_title,
};
use super::{ApiError, ApiResponse, AppState, CreateArticleRequest, UpdateArticleRequest};
use crate::db::Article;
use crate::domain::ArticleId;
use crate::services::{ArticleError, ArticlePatch, CallerIdentity};

impl From<ArticleError> for ApiError {
    fn from(err: ArticleError) -> Self {
        match err {
            ArticleError::NotFound(_) => Self::NotFound(err.to_string()),
            ArticleError::NotOwnerOnEdit | ArticleError::NotOwnerOnDelete => {
                Self::Forbidden(err.to_string())
            }
            ArticleError::Database(msg) => Self::DatabaseError(msg),
        }
    }
}

/// POST /articles
pub async fn create_article(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    ApiJson(payload): ApiJson<CreateArticleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = validate_title(&payload.title)?;
    let content = validate_content(&payload.content)?;

    let article = state
        .article_service()
        .create(title, content, caller.user_id)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(article))))
}

/// GET /articles
pub async fn list_articles(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Article>>>, ApiError> {
    let articles = state.article_service().find_all().await?;
    Ok(Json(ApiResponse::success(articles)))
}

/// GET /articles/my-articles
pub async fn my_articles(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
) -> Result<Json<ApiResponse<Vec<Article>>>, ApiError> {
    let articles = state
        .article_service()
        .find_by_author(caller.user_id)
        .await?;
    Ok(Json(ApiResponse::success(articles)))
}

/// GET /articles/{id}
///
/// An unknown id is not an error; `data` is `null`.
pub async fn get_article(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<ApiResponse<Option<Article>>>, ApiError> {
    let id = validate_id("article", id)?;
    let article = state.article_service().find_one(ArticleId::new(id)).await?;
    Ok(Json(ApiResponse::success(article)))
}

/// PATCH /articles/{id}
pub async fn update_article(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
    caller: CallerIdentity,
    ApiJson(payload): ApiJson<UpdateArticleRequest>,
) -> Result<Json<ApiResponse<Article>>, ApiError> {
    let id = validate_id("article", id)?;
    let patch = ArticlePatch {
        title: validate_optional(payload.title.as_deref(), validate_title)?,
        content: validate_optional(payload.content.as_deref(), validate_content)?,
    };

    let article = state
        .article_service()
        .update(ArticleId::new(id), patch, caller.user_id)
        .await?;

    Ok(Json(ApiResponse::success(article)))
}

/// DELETE /articles/{id}
pub async fn delete_article(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
    caller: CallerIdentity,
) -> Result<StatusCode, ApiError> {
    let id = validate_id("article", id)?;
    state
        .article_service()
        .remove(ArticleId::new(id), caller.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
