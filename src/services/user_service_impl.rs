//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::config::SecurityConfig;
use crate::db::repositories::user::hash_password_blocking;
use crate::db::{Store, User, UserChanges, is_unique_violation};
use crate::domain::UserId;
use crate::services::user_service::{UserError, UserPatch, UserService};

pub struct SeaOrmUserService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    async fn ensure_email_free(&self, email: &str, except: Option<UserId>) -> Result<(), UserError> {
        match self.store.get_user_by_email(email).await? {
            Some(existing) if Some(UserId::new(existing.id)) != except => Err(UserError::EmailTaken),
            _ => Ok(()),
        }
    }
}

fn map_write_error(err: anyhow::Error) -> UserError {
    if is_unique_violation(&err) {
        UserError::EmailTaken
    } else {
        err.into()
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn create(&self, name: &str, email: &str, password: &str) -> Result<User, UserError> {
        self.ensure_email_free(email, None).await?;

        let password_hash = hash_password_blocking(password, &self.security).await?;
        let user = self
            .store
            .create_user(name, email, &password_hash)
            .await
            .map_err(map_write_error)?;

        info!(user_id = user.id, "User created");
        Ok(user)
    }

    async fn find_all(&self) -> Result<Vec<User>, UserError> {
        Ok(self.store.list_users().await?)
    }

    async fn find_one(&self, id: UserId) -> Result<Option<User>, UserError> {
        Ok(self.store.get_user(id.value()).await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        Ok(self.store.get_user_by_email(email).await?)
    }

    async fn update(&self, id: UserId, patch: UserPatch) -> Result<Option<User>, UserError> {
        if let Some(email) = &patch.email {
            self.ensure_email_free(email, Some(id)).await?;
        }

        let password_hash = match &patch.password {
            Some(password) => Some(hash_password_blocking(password, &self.security).await?),
            None => None,
        };

        let changes = UserChanges {
            name: patch.name,
            email: patch.email,
            password_hash,
        };

        self.store
            .update_user(id.value(), changes)
            .await
            .map_err(map_write_error)
    }

    async fn remove(&self, id: UserId) -> Result<bool, UserError> {
        let removed = self.store.delete_user(id.value()).await?;
        if removed {
            info!(user_id = %id, "User removed");
        }
        Ok(removed)
    }

    async fn permissions(&self, id: UserId) -> Result<Vec<String>, UserError> {
        Ok(self
            .store
            .get_user_permission_names(id.value())
            .await?
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::user::verify_password_hash;
    use sea_orm::EntityTrait;

    async fn service() -> SeaOrmUserService {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let security = SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        };
        SeaOrmUserService::new(store, security)
    }

    async fn stored_hash(service: &SeaOrmUserService, id: i32) -> String {
        crate::entities::prelude::Users::find_by_id(id)
            .one(&service.store.conn)
            .await
            .unwrap()
            .unwrap()
            .password_hash
    }

    #[tokio::test]
    async fn create_and_find() {
        let users = service().await;
        let user = users.create("João", "joao@x.com", "123456").await.unwrap();

        assert_eq!(
            users.find_one(UserId::new(user.id)).await.unwrap(),
            Some(user.clone())
        );
        assert_eq!(users.find_by_email("joao@x.com").await.unwrap(), Some(user));
        assert!(users.find_one(UserId::new(999)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email() {
        let users = service().await;
        users.create("A", "a@x.com", "123456").await.unwrap();
        assert!(matches!(
            users.create("B", "a@x.com", "123456").await,
            Err(UserError::EmailTaken)
        ));
    }

    #[tokio::test]
    async fn update_applies_fields_and_rehashes_password() {
        let users = service().await;
        let user = users.create("A", "a@x.com", "123456").await.unwrap();
        let id = UserId::new(user.id);

        let updated = users
            .update(
                id,
                UserPatch {
                    name: Some("Renamed".to_string()),
                    password: Some("new-secret".to_string()),
                    ..UserPatch::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.email, "a@x.com");

        let hash = stored_hash(&users, user.id).await;
        assert_ne!(hash, "new-secret");
        assert!(verify_password_hash("new-secret", &hash).unwrap());
    }

    #[tokio::test]
    async fn update_missing_user_returns_none() {
        let users = service().await;
        let result = users
            .update(UserId::new(999), UserPatch::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn update_to_taken_email_conflicts() {
        let users = service().await;
        users.create("A", "a@x.com", "123456").await.unwrap();
        let b = users.create("B", "b@x.com", "123456").await.unwrap();

        let patch = UserPatch {
            email: Some("a@x.com".to_string()),
            ..UserPatch::default()
        };
        assert!(matches!(
            users.update(UserId::new(b.id), patch).await,
            Err(UserError::EmailTaken)
        ));

        let keep_own = UserPatch {
            email: Some("b@x.com".to_string()),
            ..UserPatch::default()
        };
        assert!(users.update(UserId::new(b.id), keep_own).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn permissions_are_empty_for_unknown_users() {
        let users = service().await;
        assert!(users.permissions(UserId::new(999)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn remove_reports_whether_a_row_was_deleted() {
        let users = service().await;
        let user = users.create("A", "a@x.com", "123456").await.unwrap();

        assert!(users.remove(UserId::new(user.id)).await.unwrap());
        assert!(!users.remove(UserId::new(user.id)).await.unwrap());
    }
}
