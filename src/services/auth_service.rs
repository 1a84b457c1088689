//! Domain service for registration, login and session resolution.

use serde::Serialize;
use thiserror::Error;

use super::token::{SessionClaims, TokenError};
use crate::db::User;
use crate::domain::UserId;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email already in use")]
    EmailTaken,

    /// Unknown email and wrong password share this variant so callers cannot
    /// tell which half was wrong.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid => Self::InvalidToken,
            TokenError::Signing(msg) => Self::Internal(msg),
        }
    }
}

/// The verified caller attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallerIdentity {
    pub user_id: UserId,
    pub email: String,
}

/// Result of a successful register or login. The user projection never
/// carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates a user and signs a session token for it.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::EmailTaken`] if the email is already registered.
    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError>;

    /// Verifies credentials and signs a session token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if login fails for any reason
    /// attributable to the credentials.
    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    /// Verifies a raw bearer token and decodes its claims.
    fn verify_token(&self, token: &str) -> Result<SessionClaims, AuthError>;

    /// Resolves verified claims to a live user.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] if the subject no longer exists.
    async fn validate_user(&self, claims: &SessionClaims) -> Result<User, AuthError>;
}
