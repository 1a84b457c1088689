//! Domain service for article management.
//!
//! Coarse permission checks happen in the role guard before these methods
//! run. This service enforces ownership: only the author, or a caller holding
//! [`Permission::Admin`](crate::domain::Permission::Admin), may mutate an
//! article.

use thiserror::Error;

use crate::db::Article;
use crate::domain::{ArticleId, UserId};

#[derive(Debug, Error)]
pub enum ArticleError {
    #[error("Article not found")]
    NotFound(ArticleId),

    #[error("You can only edit your own articles")]
    NotOwnerOnEdit,

    #[error("You can only delete your own articles")]
    NotOwnerOnDelete,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for ArticleError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ArticleError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Partial update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ArticlePatch {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[async_trait::async_trait]
pub trait ArticleService: Send + Sync {
    /// Persists a new article owned by `author_id`.
    async fn create(
        &self,
        title: &str,
        content: &str,
        author_id: UserId,
    ) -> Result<Article, ArticleError>;

    /// All articles, newest first.
    async fn find_all(&self) -> Result<Vec<Article>, ArticleError>;

    /// Articles written by `author_id`, newest first.
    async fn find_by_author(&self, author_id: UserId) -> Result<Vec<Article>, ArticleError>;

    /// Absence is a normal result, not an error.
    async fn find_one(&self, id: ArticleId) -> Result<Option<Article>, ArticleError>;

    /// Applies `patch` and returns the reloaded article.
    ///
    /// # Errors
    ///
    /// - [`ArticleError::NotFound`] if the article does not exist
    /// - [`ArticleError::NotOwnerOnEdit`] if the caller is neither author nor admin
    async fn update(
        &self,
        id: ArticleId,
        patch: ArticlePatch,
        caller: UserId,
    ) -> Result<Article, ArticleError>;

    /// # Errors
    ///
    /// - [`ArticleError::NotFound`] if the article does not exist
    /// - [`ArticleError::NotOwnerOnDelete`] if the caller is neither author nor admin
    async fn remove(&self, id: ArticleId, caller: UserId) -> Result<(), ArticleError>;
}
