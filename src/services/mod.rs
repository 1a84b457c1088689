pub mod token;
pub use token::{SessionClaims, TokenAuthority, TokenError};

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, AuthSession, CallerIdentity};
pub use auth_service_impl::SeaOrmAuthService;

pub mod role_guard;
pub use role_guard::{GuardError, RequiredPermissions, RoleGuard};

pub mod article_service;
pub mod article_service_impl;
pub use article_service::{ArticleError, ArticlePatch, ArticleService};
pub use article_service_impl::SeaOrmArticleService;

pub mod user_service;
pub mod user_service_impl;
pub use user_service::{UserError, UserPatch, UserService};
pub use user_service_impl::SeaOrmUserService;

pub mod permission_service;
pub use permission_service::{PermissionService, RootAccount};

pub mod bootstrap;
