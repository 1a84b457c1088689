use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::{articles, permissions, prelude::*, user_permissions, users};

/// User data returned from repository (without sensitive password hash)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Fields to change on an existing user. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

/// Outcome of attaching a permission to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionGrant {
    Granted,
    AlreadyHeld,
    UnknownUser,
    UnknownPermission,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    /// Get user by email
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(User::from))
    }

    pub async fn list_all(&self) -> Result<Vec<User>> {
        let rows = Users::find()
            .order_by_asc(users::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    /// Insert a user with an already hashed password.
    ///
    /// A duplicate email surfaces as the store's unique-constraint error;
    /// see [`crate::db::is_unique_violation`].
    pub async fn create(&self, name: &str, email: &str, password_hash: &str) -> Result<User> {
        self.create_with_permissions(name, email, password_hash, &[])
            .await
    }

    /// Insert a user and attach the given permission ids in one transaction.
    pub async fn create_with_permissions(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        permission_ids: &[i32],
    ) -> Result<User> {
        if password_hash.is_empty() {
            anyhow::bail!("Refusing to store an empty password hash");
        }

        let now = super::timestamp();
        let txn = self.conn.begin().await?;

        let model = users::ActiveModel {
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash.to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert user")?;

        if !permission_ids.is_empty() {
            let links: Vec<user_permissions::ActiveModel> = permission_ids
                .iter()
                .map(|permission_id| user_permissions::ActiveModel {
                    user_id: Set(model.id),
                    permission_id: Set(*permission_id),
                })
                .collect();

            UserPermissions::insert_many(links)
                .exec(&txn)
                .await
                .context("Failed to attach permissions to new user")?;
        }

        txn.commit().await?;
        Ok(User::from(model))
    }

    /// Apply the provided changes. Returns `None` when the user does not exist.
    pub async fn update(&self, id: i32, changes: UserChanges) -> Result<Option<User>> {
        let Some(user) = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for update")?
        else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(email) = changes.email {
            active.email = Set(email);
        }
        if let Some(hash) = changes.password_hash {
            active.password_hash = Set(hash);
        }
        active.updated_at = Set(super::timestamp());

        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update user")?;

        Ok(Some(User::from(updated)))
    }

    /// Delete a user together with their articles and permission links.
    /// Returns `false` when no such user exists.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;

        Articles::delete_many()
            .filter(articles::Column::AuthorId.eq(id))
            .exec(&txn)
            .await
            .context("Failed to delete user articles")?;

        UserPermissions::delete_many()
            .filter(user_permissions::Column::UserId.eq(id))
            .exec(&txn)
            .await
            .context("Failed to delete user permissions")?;

        let result = Users::delete_by_id(id)
            .exec(&txn)
            .await
            .context("Failed to delete user")?;

        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }

    /// Permission names held by a user, or `None` if the user does not exist.
    pub async fn permission_names(&self, id: i32) -> Result<Option<Vec<String>>> {
        let Some(user) = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for permissions")?
        else {
            return Ok(None);
        };

        let held = user
            .find_related(Permissions)
            .order_by_asc(permissions::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to load user permissions")?;

        Ok(Some(held.into_iter().map(|p| p.name).collect()))
    }

    pub async fn assign_permission(&self, id: i32, permission_name: &str) -> Result<PermissionGrant> {
        let txn = self.conn.begin().await?;

        if Users::find_by_id(id).one(&txn).await?.is_none() {
            return Ok(PermissionGrant::UnknownUser);
        }

        let Some(permission) = Permissions::find()
            .filter(permissions::Column::Name.eq(permission_name))
            .one(&txn)
            .await
            .context("Failed to query permission by name")?
        else {
            return Ok(PermissionGrant::UnknownPermission);
        };

        if UserPermissions::find_by_id((id, permission.id))
            .one(&txn)
            .await?
            .is_some()
        {
            return Ok(PermissionGrant::AlreadyHeld);
        }

        user_permissions::ActiveModel {
            user_id: Set(id),
            permission_id: Set(permission.id),
        }
        .insert(&txn)
        .await
        .context("Failed to attach permission")?;

        txn.commit().await?;
        Ok(PermissionGrant::Granted)
    }

    /// Verify a password for the user with the given email.
    ///
    /// Returns `None` both for an unknown email and for a wrong password.
    /// An unknown email still pays for one Argon2 hash with the configured
    /// params so both outcomes take comparable time.
    /// Note: This uses `spawn_blocking` because Argon2 hashing is CPU-intensive
    /// and would block the async runtime if run directly.
    pub async fn verify_password(
        &self,
        email: &str,
        password: &str,
        config: &SecurityConfig,
    ) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            hash_password_blocking(password, config).await?;
            return Ok(None);
        };

        let password_hash = user.password_hash.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || verify_password_hash(&password, &password_hash))
            .await
            .context("Password verification task panicked")??;

        Ok(is_valid.then(|| User::from(user)))
    }
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses the crate's default params.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None, // output length (use default)
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Hash on the blocking pool so request handling is not stalled.
pub async fn hash_password_blocking(password: &str, config: &SecurityConfig) -> Result<String> {
    let password = password.to_string();
    let config = config.clone();
    task::spawn_blocking(move || hash_password(&password, Some(&config)))
        .await
        .context("Password hashing task panicked")?
}

/// Compare a plaintext password against a stored PHC hash string.
/// The parameters are read from the hash itself.
pub fn verify_password_hash(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
