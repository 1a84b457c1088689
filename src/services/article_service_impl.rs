//! `SeaORM` implementation of the `ArticleService` trait.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::db::{Article, ArticleChanges, Store};
use crate::domain::{ArticleId, Permission, UserId};
use crate::services::article_service::{ArticleError, ArticlePatch, ArticleService};

pub struct SeaOrmArticleService {
    store: Store,
}

impl SeaOrmArticleService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn load_existing(&self, id: ArticleId) -> Result<Article, ArticleError> {
        self.store
            .get_article(id.value())
            .await?
            .ok_or(ArticleError::NotFound(id))
    }

    /// Author, or admin bypass. `denial` is returned otherwise.
    async fn ensure_can_mutate(
        &self,
        article: &Article,
        caller: UserId,
        denial: ArticleError,
    ) -> Result<(), ArticleError> {
        if article.author_id == caller.value() {
            return Ok(());
        }

        let held = self
            .store
            .get_user_permission_names(caller.value())
            .await?
            .unwrap_or_default();

        if held.iter().any(|p| p == Permission::Admin.as_str()) {
            debug!(
                article_id = article.id,
                user_id = %caller,
                "Admin bypassing article ownership"
            );
            return Ok(());
        }

        Err(denial)
    }
}

#[async_trait]
impl ArticleService for SeaOrmArticleService {
    async fn create(
        &self,
        title: &str,
        content: &str,
        author_id: UserId,
    ) -> Result<Article, ArticleError> {
        let article = self
            .store
            .create_article(title, content, author_id.value())
            .await?;

        info!(article_id = article.id, author_id = %author_id, "Article created");
        Ok(article)
    }

    async fn find_all(&self) -> Result<Vec<Article>, ArticleError> {
        Ok(self.store.list_articles().await?)
    }

    async fn find_by_author(&self, author_id: UserId) -> Result<Vec<Article>, ArticleError> {
        Ok(self.store.list_articles_by_author(author_id.value()).await?)
    }

    async fn find_one(&self, id: ArticleId) -> Result<Option<Article>, ArticleError> {
        Ok(self.store.get_article(id.value()).await?)
    }

    async fn update(
        &self,
        id: ArticleId,
        patch: ArticlePatch,
        caller: UserId,
    ) -> Result<Article, ArticleError> {
        let article = self.load_existing(id).await?;
        self.ensure_can_mutate(&article, caller, ArticleError::NotOwnerOnEdit)
            .await?;

        let changes = ArticleChanges {
            title: patch.title,
            content: patch.content,
        };
        if !self.store.update_article(id.value(), changes).await? {
            return Err(ArticleError::NotFound(id));
        }

        self.load_existing(id).await
    }

    async fn remove(&self, id: ArticleId, caller: UserId) -> Result<(), ArticleError> {
        let article = self.load_existing(id).await?;
        self.ensure_can_mutate(&article, caller, ArticleError::NotOwnerOnDelete)
            .await?;

        if !self.store.delete_article(id.value()).await? {
            return Err(ArticleError::NotFound(id));
        }

        info!(article_id = %id, user_id = %caller, "Article removed");
        Ok(())
    }
}
