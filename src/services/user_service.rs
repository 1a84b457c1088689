//! Domain service for administering users and their permissions.

use thiserror::Error;

use crate::db::User;
use crate::domain::UserId;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound(UserId),

    #[error("Permission '{0}' not found")]
    PermissionNotFound(String),

    #[error("Email already in use")]
    EmailTaken,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Partial update. A new password is hashed before it is stored.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// # Errors
    ///
    /// Returns [`UserError::EmailTaken`] if the email is already registered.
    async fn create(&self, name: &str, email: &str, password: &str) -> Result<User, UserError>;

    async fn find_all(&self) -> Result<Vec<User>, UserError>;

    async fn find_one(&self, id: UserId) -> Result<Option<User>, UserError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError>;

    /// Returns `None` when the user does not exist.
    async fn update(&self, id: UserId, patch: UserPatch) -> Result<Option<User>, UserError>;

    /// Deletes the user with their articles and permission links.
    /// Returns `false` when the user does not exist.
    async fn remove(&self, id: UserId) -> Result<bool, UserError>;

    /// Permission names held by the user; empty for unknown users.
    async fn permissions(&self, id: UserId) -> Result<Vec<String>, UserError>;
}
