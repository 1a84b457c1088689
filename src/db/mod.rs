use anyhow::Result;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, SqlErr, Statement,
};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;

pub mod migrator;
pub mod repositories;

pub use repositories::article::{Article, ArticleChanges};
pub use repositories::permission::Permission;
pub use repositories::user::{PermissionGrant, User, UserChanges};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        if in_memory {
            // Every SQLite connection gets its own in-memory database, so the
            // pool must hold exactly one connection that never expires.
            opt.max_connections(1).min_connections(1);
        } else {
            opt.max_connections(max_connections)
                .min_connections(min_connections)
                .idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn permission_repo(&self) -> repositories::permission::PermissionRepository {
        repositories::permission::PermissionRepository::new(self.conn.clone())
    }

    fn article_repo(&self) -> repositories::article::ArticleRepository {
        repositories::article::ArticleRepository::new(self.conn.clone())
    }

    // Users

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.user_repo().list_all().await
    }

    pub async fn create_user(&self, name: &str, email: &str, password_hash: &str) -> Result<User> {
        self.user_repo().create(name, email, password_hash).await
    }

    pub async fn create_user_with_permissions(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        permission_ids: &[i32],
    ) -> Result<User> {
        self.user_repo()
            .create_with_permissions(name, email, password_hash, permission_ids)
            .await
    }

    pub async fn update_user(&self, id: i32, changes: UserChanges) -> Result<Option<User>> {
        self.user_repo().update(id, changes).await
    }

    pub async fn delete_user(&self, id: i32) -> Result<bool> {
        self.user_repo().delete(id).await
    }

    pub async fn verify_user_password(
        &self,
        email: &str,
        password: &str,
        config: &SecurityConfig,
    ) -> Result<Option<User>> {
        self.user_repo().verify_password(email, password, config).await
    }

    pub async fn get_user_permission_names(&self, id: i32) -> Result<Option<Vec<String>>> {
        self.user_repo().permission_names(id).await
    }

    pub async fn assign_user_permission(
        &self,
        user_id: i32,
        permission_name: &str,
    ) -> Result<PermissionGrant> {
        self.user_repo()
            .assign_permission(user_id, permission_name)
            .await
    }

    // Permissions

    pub async fn list_permissions(&self) -> Result<Vec<Permission>> {
        self.permission_repo().list_all().await
    }

    pub async fn get_permission_by_name(&self, name: &str) -> Result<Option<Permission>> {
        self.permission_repo().get_by_name(name).await
    }

    pub async fn create_permission(&self, name: &str, description: &str) -> Result<Permission> {
        self.permission_repo().create(name, description).await
    }

    // Articles

    pub async fn create_article(&self, title: &str, content: &str, author_id: i32) -> Result<Article> {
        self.article_repo().create(title, content, author_id).await
    }

    pub async fn list_articles(&self) -> Result<Vec<Article>> {
        self.article_repo().list_all().await
    }

    pub async fn list_articles_by_author(&self, author_id: i32) -> Result<Vec<Article>> {
        self.article_repo().list_by_author(author_id).await
    }

    pub async fn get_article(&self, id: i32) -> Result<Option<Article>> {
        self.article_repo().get(id).await
    }

    pub async fn update_article(&self, id: i32, changes: ArticleChanges) -> Result<bool> {
        self.article_repo().update(id, changes).await
    }

    pub async fn delete_article(&self, id: i32) -> Result<bool> {
        self.article_repo().delete(id).await
    }
}

/// Whether an error chain bottoms out in a unique-constraint violation.
///
/// Check-then-insert paths use this to map the race where two requests pass
/// the check concurrently and the second insert is rejected by the index.
#[must_use]
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<DbErr>())
        .any(|db_err| matches!(db_err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> Store {
        Store::new("sqlite::memory:").await.unwrap()
    }

    fn fast_security() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        }
    }

    #[tokio::test]
    async fn password_check_hashes_even_for_unknown_email() {
        let store = memory_store().await;
        let security = fast_security();
        let hash = repositories::user::hash_password("123456", Some(&security)).unwrap();
        store.create_user("A", "a@x.com", &hash).await.unwrap();

        let found = store.verify_user_password("a@x.com", "123456", &security).await.unwrap();
        assert_eq!(found.map(|u| u.email), Some("a@x.com".to_string()));
        assert!(store.verify_user_password("a@x.com", "wrong", &security).await.unwrap().is_none());
        assert!(store.verify_user_password("ghost@x.com", "123456", &security).await.unwrap().is_none());

        // Params Argon2 refuses make the hash fail, which shows it ran.
        let broken = SecurityConfig {
            argon2_memory_cost_kib: 0,
            ..security
        };
        assert!(store.verify_user_password("ghost@x.com", "123456", &broken).await.is_err());
    }

    #[tokio::test]
    async fn duplicate_email_is_reported_as_unique_violation() {
        let store = memory_store().await;
        store.create_user("A", "a@x.com", "$argon2id$fake").await.unwrap();

        let err = store
            .create_user("B", "a@x.com", "$argon2id$fake")
            .await
            .unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[tokio::test]
    async fn empty_password_hash_is_rejected() {
        let store = memory_store().await;
        assert!(store.create_user("A", "a@x.com", "").await.is_err());
        assert!(store.get_user_by_email("a@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn permission_names_distinguish_missing_user_from_empty_set() {
        let store = memory_store().await;
        let user = store.create_user("A", "a@x.com", "$argon2id$fake").await.unwrap();

        assert_eq!(store.get_user_permission_names(user.id).await.unwrap(), Some(vec![]));
        assert_eq!(store.get_user_permission_names(999).await.unwrap(), None);
    }

    #[tokio::test]
    async fn assign_permission_reports_each_outcome() {
        let store = memory_store().await;
        let user = store.create_user("A", "a@x.com", "$argon2id$fake").await.unwrap();
        store.create_permission("editor", "Manage own articles").await.unwrap();

        assert_eq!(
            store.assign_user_permission(user.id, "editor").await.unwrap(),
            PermissionGrant::Granted
        );
        assert_eq!(
            store.assign_user_permission(user.id, "editor").await.unwrap(),
            PermissionGrant::AlreadyHeld
        );
        assert_eq!(
            store.assign_user_permission(user.id, "ghost").await.unwrap(),
            PermissionGrant::UnknownPermission
        );
        assert_eq!(
            store.assign_user_permission(999, "editor").await.unwrap(),
            PermissionGrant::UnknownUser
        );
        assert_eq!(
            store.get_user_permission_names(user.id).await.unwrap(),
            Some(vec!["editor".to_string()])
        );
    }

    #[tokio::test]
    async fn articles_are_listed_newest_first_with_author() {
        let store = memory_store().await;
        let user = store.create_user("A", "a@x.com", "$argon2id$fake").await.unwrap();

        let first = store.create_article("First", "first body!", user.id).await.unwrap();
        let second = store.create_article("Second", "second body", user.id).await.unwrap();

        let listed = store.list_articles().await.unwrap();
        assert_eq!(
            listed.iter().map(|a| a.id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );
        assert!(listed.iter().all(|a| a.author.email == "a@x.com"));
    }

    #[tokio::test]
    async fn deleting_a_user_cascades_to_articles_and_links() {
        let store = memory_store().await;
        let user = store.create_user("A", "a@x.com", "$argon2id$fake").await.unwrap();
        store.create_permission("reader", "Read articles only").await.unwrap();
        store.assign_user_permission(user.id, "reader").await.unwrap();
        let article = store.create_article("Title", "some content", user.id).await.unwrap();

        assert!(store.delete_user(user.id).await.unwrap());
        assert!(store.get_article(article.id).await.unwrap().is_none());
        assert_eq!(store.get_user_permission_names(user.id).await.unwrap(), None);
        assert!(!store.delete_user(user.id).await.unwrap());
    }
}
