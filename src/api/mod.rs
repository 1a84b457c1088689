use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, patch, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::services::{
    ArticleService, AuthService, PermissionService, RequiredPermissions, RoleGuard, UserService,
};
use crate::state::SharedState;

mod articles;
pub mod auth;
mod error;
mod extract;
pub mod guard;
mod permissions;
mod system;
mod types;
mod users;
mod validation;

pub use error::ApiError;
pub use guard::PolicyScope;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn article_service(&self) -> &Arc<dyn ArticleService> {
        &self.shared.article_service
    }

    #[must_use]
    pub fn user_service(&self) -> &Arc<dyn UserService> {
        &self.shared.user_service
    }

    #[must_use]
    pub fn permission_service(&self) -> &PermissionService {
        &self.shared.permission_service
    }

    #[must_use]
    pub fn role_guard(&self) -> &RoleGuard {
        &self.shared.role_guard
    }
}

#[must_use]
pub fn create_app_state(shared: Arc<SharedState>) -> Arc<AppState> {
    Arc::new(AppState { shared })
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config().server.cors_allowed_origins.clone();

    let api_router = Router::new()
        .merge(auth_routes())
        .merge(article_routes(&state))
        .merge(user_routes(&state))
        .merge(permission_routes(&state))
        .route("/health", get(system::health))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::authenticate,
        ))
        .with_state(state);

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route(
            "/auth/profile",
            PolicyScope::authenticated(get(auth::profile)),
        )
}

fn article_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let scope = PolicyScope::new(state.clone(), None);

    Router::new()
        .route("/articles", get(articles::list_articles))
        .route(
            "/articles",
            scope.protect(
                post(articles::create_article),
                Some(RequiredPermissions::AUTHORS),
            ),
        )
        .route(
            "/articles/my-articles",
            scope.protect(
                get(articles::my_articles),
                Some(RequiredPermissions::MEMBERS),
            ),
        )
        .route("/articles/{id}", get(articles::get_article))
        .route(
            "/articles/{id}",
            scope.protect(
                patch(articles::update_article),
                Some(RequiredPermissions::AUTHORS),
            ),
        )
        .route(
            "/articles/{id}",
            scope.protect(
                delete(articles::delete_article),
                Some(RequiredPermissions::AUTHORS),
            ),
        )
}

fn user_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let scope = PolicyScope::new(state.clone(), Some(RequiredPermissions::ADMIN));

    Router::new()
        .route("/users", scope.protect(get(users::list_users), None))
        .route("/users", scope.protect(post(users::create_user), None))
        .route(
            "/users/me/permissions",
            scope.protect(
                get(users::my_permissions),
                Some(RequiredPermissions::MEMBERS),
            ),
        )
        .route("/users/{id}", scope.protect(get(users::get_user), None))
        .route("/users/{id}", scope.protect(patch(users::update_user), None))
        .route("/users/{id}", scope.protect(delete(users::delete_user), None))
        .route(
            "/users/{id}/permissions",
            scope.protect(get(users::get_user_permissions), None),
        )
        .route(
            "/users/{id}/permissions",
            scope.protect(post(users::assign_user_permission), None),
        )
}

fn permission_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let scope = PolicyScope::new(state.clone(), Some(RequiredPermissions::ADMIN));

    Router::new().route(
        "/permissions",
        scope.protect(get(permissions::list_permissions), None),
    )
}
