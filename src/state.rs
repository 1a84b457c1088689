use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    ArticleService, AuthService, PermissionService, RoleGuard, SeaOrmArticleService,
    SeaOrmAuthService, SeaOrmUserService, TokenAuthority, UserService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,

    pub article_service: Arc<dyn ArticleService>,

    pub user_service: Arc<dyn UserService>,

    pub permission_service: PermissionService,

    pub role_guard: RoleGuard,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Ok(Self::with_store(config, store))
    }

    /// Wire every service on top of an already connected store.
    #[must_use]
    pub fn with_store(config: Config, store: Store) -> Self {
        let tokens = Arc::new(TokenAuthority::from_config(&config.security));

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            tokens,
            config.security.clone(),
        )) as Arc<dyn AuthService>;

        let article_service =
            Arc::new(SeaOrmArticleService::new(store.clone())) as Arc<dyn ArticleService>;

        let user_service = Arc::new(SeaOrmUserService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn UserService>;

        let permission_service = PermissionService::new(
            store.clone(),
            config.security.clone(),
            config.bootstrap.clone(),
        );

        let role_guard = RoleGuard::new(store.clone());

        Self {
            config: Arc::new(config),
            store,
            auth_service,
            article_service,
            user_service,
            permission_service,
            role_guard,
        }
    }
}
