use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};

use criteria_repository::state::AppState;

use super::entity::article;

/// Factory for creating test data
pub struct Factory<'a> {
    state: &'a AppState,
}

#[allow(dead_code)]
impl<'a> Factory<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Insert `count` articles numbered from 1.
    ///
    /// Article `n` has slug `article-n`, `n * 10` views and is published when `n` is even.
    pub async fn create_articles(&self, count: i32) -> Vec<article::Model> {
        let mut created = Vec::new();
        for n in 1..=count {
            created.push(self.create_article(n).await);
        }
        created
    }

    pub async fn create_article(&self, n: i32) -> article::Model {
        article::ActiveModel {
            slug: Set(format!("article-{}", n)),
            title: Set(format!("Article {}", n)),
            published: Set(n % 2 == 0),
            views: Set(n * 10),
            ..Default::default()
        }
        .insert(&self.state.db)
        .await
        .unwrap()
    }

    /// Unsaved article, for save/save_many
    pub fn new_article(slug: &str) -> article::ActiveModel {
        article::ActiveModel {
            slug: Set(slug.to_string()),
            title: Set(format!("Title of {}", slug)),
            published: Set(false),
            views: Set(0),
            ..Default::default()
        }
    }

    pub async fn find_article(&self, id: i32) -> Option<article::Model> {
        article::Entity::find_by_id(id)
            .one(&self.state.db)
            .await
            .unwrap()
    }

    pub async fn article_count(&self) -> u64 {
        article::Entity::find().count(&self.state.db).await.unwrap()
    }
}
