//! Permission catalog and root account provisioning.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::{BootstrapConfig, SecurityConfig};
use crate::db::repositories::user::hash_password_blocking;
use crate::db::{Permission as CatalogEntry, PermissionGrant, Store, User, is_unique_violation};
use crate::domain::{Permission, UserId};
use crate::services::user_service::UserError;

/// Outcome of provisioning the root account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootAccount {
    Created(User),
    AlreadyExists,
}

#[derive(Clone)]
pub struct PermissionService {
    store: Store,
    security: SecurityConfig,
    bootstrap: BootstrapConfig,
}

impl PermissionService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig, bootstrap: BootstrapConfig) -> Self {
        Self {
            store,
            security,
            bootstrap,
        }
    }

    pub async fn create_permission(&self, name: &str, description: &str) -> Result<CatalogEntry> {
        self.store.create_permission(name, description).await
    }

    pub async fn find_all(&self) -> Result<Vec<CatalogEntry>> {
        self.store.list_permissions().await
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<CatalogEntry>> {
        self.store.get_permission_by_name(name).await
    }

    /// Insert every canonical permission missing from the catalog.
    /// Returns the number of rows created.
    pub async fn seed_permissions(&self) -> Result<usize> {
        let mut created = 0;

        for permission in Permission::ALL {
            let name = permission.as_str();
            if self.find_by_name(name).await?.is_some() {
                debug!(permission = name, "Permission already exists");
                continue;
            }

            match self.create_permission(name, permission.description()).await {
                Ok(_) => {
                    info!(permission = name, "Permission created");
                    created += 1;
                }
                Err(e) if is_unique_violation(&e) => {
                    debug!(permission = name, "Permission already exists");
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to seed permission '{name}'"));
                }
            }
        }

        Ok(created)
    }

    /// Create the configured root account holding every catalog permission.
    /// Does nothing when an account with the root email already exists.
    pub async fn create_root_user(&self) -> Result<RootAccount> {
        let email = self.bootstrap.root_email.as_str();

        if self.store.get_user_by_email(email).await?.is_some() {
            debug!(email, "Root user already exists");
            return Ok(RootAccount::AlreadyExists);
        }

        let password_hash =
            hash_password_blocking(&self.bootstrap.root_password, &self.security).await?;
        let permission_ids: Vec<i32> = self.find_all().await?.iter().map(|p| p.id).collect();

        match self
            .store
            .create_user_with_permissions(
                &self.bootstrap.root_name,
                email,
                &password_hash,
                &permission_ids,
            )
            .await
        {
            Ok(user) => {
                info!(user_id = user.id, email, "Root user created");
                Ok(RootAccount::Created(user))
            }
            Err(e) if is_unique_violation(&e) => Ok(RootAccount::AlreadyExists),
            Err(e) => Err(e.context("Failed to create root user")),
        }
    }

    /// Permission names held by a user; empty when the user does not exist.
    pub async fn user_permissions(&self, user_id: UserId) -> Result<Vec<String>> {
        Ok(self
            .store
            .get_user_permission_names(user_id.value())
            .await?
            .unwrap_or_default())
    }

    /// Grants a catalog permission by name. Granting one already held is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// - [`UserError::NotFound`] for an unknown user
    /// - [`UserError::PermissionNotFound`] for a name missing from the catalog
    pub async fn assign_permission_to_user(
        &self,
        user_id: UserId,
        name: &str,
    ) -> Result<(), UserError> {
        match self.store.assign_user_permission(user_id.value(), name).await? {
            PermissionGrant::Granted => {
                info!(user_id = %user_id, permission = name, "Permission granted");
                Ok(())
            }
            PermissionGrant::AlreadyHeld => {
                debug!(user_id = %user_id, permission = name, "Permission already held");
                Ok(())
            }
            PermissionGrant::UnknownUser => Err(UserError::NotFound(user_id)),
            PermissionGrant::UnknownPermission => Err(UserError::PermissionNotFound(name.to_string())),
        }
    }
}
