//! Startup seeding of the permission catalog and the root account.

use tracing::{error, info};

use super::permission_service::{PermissionService, RootAccount};

/// Seed the catalog, then provision the root account.
///
/// Failures are logged and swallowed so the server still starts; the second
/// step is skipped when seeding fails.
pub async fn initialize(permissions: &PermissionService) {
    let created = match permissions.seed_permissions().await {
        Ok(created) => created,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Failed to seed permissions");
            return;
        }
    };

    match permissions.create_root_user().await {
        Ok(RootAccount::Created(_)) => {
            info!(permissions_created = created, "Bootstrap complete, root user created");
        }
        Ok(RootAccount::AlreadyExists) => {
            info!(permissions_created = created, "Bootstrap complete");
        }
        Err(e) => error!(error = %format!("{e:#}"), "Failed to create root user"),
    }
}
