use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;

use crate::entities::{permissions, prelude::*};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Permission {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<permissions::Model> for Permission {
    fn from(model: permissions::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct PermissionRepository {
    conn: DatabaseConnection,
}

impl PermissionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list_all(&self) -> Result<Vec<Permission>> {
        let rows = Permissions::find()
            .order_by_asc(permissions::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list permissions")?;

        Ok(rows.into_iter().map(Permission::from).collect())
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<Permission>> {
        let row = Permissions::find()
            .filter(permissions::Column::Name.eq(name))
            .one(&self.conn)
            .await
            .context("Failed to query permission by name")?;

        Ok(row.map(Permission::from))
    }

    pub async fn create(&self, name: &str, description: &str) -> Result<Permission> {
        let now = super::timestamp();

        let model = permissions::ActiveModel {
            name: Set(name.to_string()),
            description: Set(description.to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert permission")?;

        Ok(Permission::from(model))
    }
}
