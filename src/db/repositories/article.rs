use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;

use super::user::User;
use crate::entities::{articles, prelude::*, users};

/// An article with its author relation loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub author_id: i32,
    pub author: User,
    pub created_at: String,
    pub updated_at: String,
}

impl Article {
    fn from_row((article, author): (articles::Model, Option<users::Model>)) -> Result<Self> {
        let author = author
            .ok_or_else(|| anyhow::anyhow!("Article {} has no author row", article.id))?;

        Ok(Self {
            id: article.id,
            title: article.title,
            content: article.content,
            author_id: article.author_id,
            author: User::from(author),
            created_at: article.created_at,
            updated_at: article.updated_at,
        })
    }
}

/// Fields to change on an existing article. The author is not changeable.
#[derive(Debug, Clone, Default)]
pub struct ArticleChanges {
    pub title: Option<String>,
    pub content: Option<String>,
}

pub struct ArticleRepository {
    conn: DatabaseConnection,
}

impl ArticleRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, title: &str, content: &str, author_id: i32) -> Result<Article> {
        let now = super::timestamp();

        let model = articles::ActiveModel {
            title: Set(title.to_string()),
            content: Set(content.to_string()),
            author_id: Set(author_id),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert article")?;

        self.get(model.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created article"))
    }

    /// Newest first, each with its author.
    pub async fn list_all(&self) -> Result<Vec<Article>> {
        let rows = Articles::find()
            .find_also_related(Users)
            .order_by_desc(articles::Column::CreatedAt)
            .order_by_desc(articles::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list articles")?;

        rows.into_iter().map(Article::from_row).collect()
    }

    pub async fn list_by_author(&self, author_id: i32) -> Result<Vec<Article>> {
        let rows = Articles::find()
            .filter(articles::Column::AuthorId.eq(author_id))
            .find_also_related(Users)
            .order_by_desc(articles::Column::CreatedAt)
            .order_by_desc(articles::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list articles by author")?;

        rows.into_iter().map(Article::from_row).collect()
    }

    pub async fn get(&self, id: i32) -> Result<Option<Article>> {
        let row = Articles::find_by_id(id)
            .find_also_related(Users)
            .one(&self.conn)
            .await
            .context("Failed to query article by ID")?;

        row.map(Article::from_row).transpose()
    }

    /// Returns `false` when the article does not exist.
    pub async fn update(&self, id: i32, changes: ArticleChanges) -> Result<bool> {
        let Some(article) = Articles::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query article for update")?
        else {
            return Ok(false);
        };

        let mut active: articles::ActiveModel = article.into();
        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(content) = changes.content {
            active.content = Set(content);
        }
        active.updated_at = Set(super::timestamp());
        active
            .update(&self.conn)
            .await
            .context("Failed to update article")?;

        Ok(true)
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Articles::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete article")?;

        Ok(result.rows_affected > 0)
    }
}
