//! `SeaORM` implementation of the `AuthService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::token::{SessionClaims, TokenAuthority};
use crate::config::SecurityConfig;
use crate::db::repositories::user::hash_password_blocking;
use crate::db::{Store, User, is_unique_violation};
use crate::domain::UserId;
use crate::services::auth_service::{AuthError, AuthService, AuthSession};

pub struct SeaOrmAuthService {
    store: Store,
    tokens: Arc<TokenAuthority>,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, tokens: Arc<TokenAuthority>, security: SecurityConfig) -> Self {
        Self {
            store,
            tokens,
            security,
        }
    }

    fn session_for(&self, user: User) -> Result<AuthSession, AuthError> {
        let token = self.tokens.issue(UserId::new(user.id), &user.email)?;
        Ok(AuthSession { user, token })
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        if self.store.get_user_by_email(email).await?.is_some() {
            debug!(email, "Registration rejected: email already in use");
            return Err(AuthError::EmailTaken);
        }

        let password_hash = hash_password_blocking(password, &self.security).await?;

        let user = match self.store.create_user(name, email, &password_hash).await {
            Ok(user) => user,
            // Lost a race with a concurrent registration for the same email
            Err(e) if is_unique_violation(&e) => return Err(AuthError::EmailTaken),
            Err(e) => return Err(e.into()),
        };

        info!(user_id = user.id, "Registered new user");
        self.session_for(user)
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let verified = self
            .store
            .verify_user_password(email, password, &self.security)
            .await?;
        let Some(user) = verified else {
            warn!(email, "Failed login attempt");
            return Err(AuthError::InvalidCredentials);
        };

        debug!(user_id = user.id, "User logged in");
        self.session_for(user)
    }

    fn verify_token(&self, token: &str) -> Result<SessionClaims, AuthError> {
        Ok(self.tokens.verify(token)?)
    }

    async fn validate_user(&self, claims: &SessionClaims) -> Result<User, AuthError> {
        self.store
            .get_user(claims.sub)
            .await?
            .ok_or(AuthError::InvalidToken)
    }
}
