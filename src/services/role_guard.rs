//! Route-level authorization.
//!
//! Each route binds an optional [`RequiredPermissions`] at registration time.
//! [`RoleGuard::authorize`] loads the caller's permission names fresh on every
//! call and allows the request iff the caller holds at least one of the
//! required permissions.

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;
use tracing::debug;

use super::auth_service::CallerIdentity;
use crate::db::Store;
use crate::domain::Permission;

/// A set of permissions of which any one grants access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredPermissions(&'static [Permission]);

impl RequiredPermissions {
    pub const ADMIN: Self = Self(&[Permission::Admin]);
    pub const AUTHORS: Self = Self(&[Permission::Admin, Permission::Editor]);
    pub const MEMBERS: Self = Self(&[Permission::Admin, Permission::Editor, Permission::Reader]);

    #[must_use]
    pub const fn any_of(permissions: &'static [Permission]) -> Self {
        Self(permissions)
    }

    #[must_use]
    pub const fn permissions(&self) -> &'static [Permission] {
        self.0
    }

    /// Operation-level declarations override the resource group's.
    #[must_use]
    pub const fn resolve(operation: Option<Self>, group: Option<Self>) -> Option<Self> {
        match operation {
            Some(required) => Some(required),
            None => group,
        }
    }

    /// True iff `held` intersects this set. An empty requirement is never met.
    #[must_use]
    pub fn is_satisfied_by<'a, I>(&self, held: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        let held: HashSet<&str> = held.into_iter().collect();
        self.0.iter().any(|p| held.contains(p.as_str()))
    }
}

impl fmt::Display for RequiredPermissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, permission) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(permission.as_str())?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum GuardError {
    #[error("User not authenticated")]
    NotAuthenticated,

    #[error("User not found")]
    UserNotFound,

    #[error("Access denied. Required permissions: {0}")]
    Denied(RequiredPermissions),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for GuardError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[derive(Clone)]
pub struct RoleGuard {
    store: Store,
}

impl RoleGuard {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn authorize(
        &self,
        required: Option<RequiredPermissions>,
        caller: Option<&CallerIdentity>,
    ) -> Result<(), GuardError> {
        let Some(required) = required else {
            return Ok(());
        };

        let caller = caller.ok_or(GuardError::NotAuthenticated)?;

        let held = self
            .store
            .get_user_permission_names(caller.user_id.value())
            .await?
            .ok_or(GuardError::UserNotFound)?;

        if required.is_satisfied_by(held.iter().map(String::as_str)) {
            Ok(())
        } else {
            debug!(
                user_id = %caller.user_id,
                required = %required,
                held = ?held,
                "Role guard denied request"
            );
            Err(GuardError::Denied(required))
        }
    }
}
