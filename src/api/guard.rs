//! Route-level permission enforcement.
//!
//! A [`PolicyScope`] is created per resource group with an optional group
//! requirement. Each route registered through it may declare its own
//! requirement, which replaces the group's.

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};
use std::sync::Arc;

use super::auth::require_authentication;
use super::{ApiError, AppState};
use crate::services::{CallerIdentity, GuardError, RequiredPermissions};

impl From<GuardError> for ApiError {
    fn from(err: GuardError) -> Self {
        match err {
            GuardError::NotAuthenticated | GuardError::UserNotFound | GuardError::Denied(_) => {
                Self::Forbidden(err.to_string())
            }
            GuardError::Database(msg) => Self::DatabaseError(msg),
        }
    }
}

#[derive(Clone)]
pub struct GuardState {
    state: Arc<AppState>,
    required: Option<RequiredPermissions>,
}

pub async fn role_guard(
    State(guard): State<GuardState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller = request.extensions().get::<CallerIdentity>().cloned();

    guard
        .state
        .role_guard()
        .authorize(guard.required, caller.as_ref())
        .await?;

    Ok(next.run(request).await)
}

pub struct PolicyScope {
    state: Arc<AppState>,
    group: Option<RequiredPermissions>,
}

impl PolicyScope {
    #[must_use]
    pub const fn new(state: Arc<AppState>, group: Option<RequiredPermissions>) -> Self {
        Self { state, group }
    }

    /// Require a verified caller and no particular permission.
    pub fn authenticated(route: MethodRouter<Arc<AppState>>) -> MethodRouter<Arc<AppState>> {
        route.route_layer(middleware::from_fn(require_authentication))
    }

    /// Require a verified caller holding the resolved permission set.
    ///
    /// Anonymous callers get 401 from the authentication layer before the
    /// guard is consulted.
    pub fn protect(
        &self,
        route: MethodRouter<Arc<AppState>>,
        operation: Option<RequiredPermissions>,
    ) -> MethodRouter<Arc<AppState>> {
        let guard = GuardState {
            state: self.state.clone(),
            required: RequiredPermissions::resolve(operation, self.group),
        };

        Self::authenticated(route.route_layer(middleware::from_fn_with_state(guard, role_guard)))
    }
}
