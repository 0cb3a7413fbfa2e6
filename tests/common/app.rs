use criteria_repository::config::{Config, RepositoryConfig};
use criteria_repository::state::AppState;
use criteria_repository::Repository;
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, Schema};

use super::entity::{article, note, tag};

pub type ArticleRepository = Repository<article::Entity, article::ActiveModel>;
pub type TagRepository = Repository<tag::Entity, tag::ActiveModel>;
pub type NoteRepository = Repository<note::Entity, note::ActiveModel>;

/// Test configuration: a private in-memory SQLite database per test
pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        // A second pooled connection would open a different in-memory database
        max_connections: 1,
        min_connections: 1,
        sqlx_logging: false,
        repository: RepositoryConfig::default(),
    }
}

/// Test application wrapper
pub struct TestApp {
    pub state: AppState,
}

#[allow(dead_code)]
impl TestApp {
    /// Create a new test application with the schema in place
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: Config) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let state = AppState::new(config)
            .await
            .expect("Failed to create test app state");

        create_table(&state.db, article::Entity).await;
        create_table(&state.db, tag::Entity).await;
        create_table(&state.db, note::Entity).await;

        Self { state }
    }

    pub fn articles(&self) -> ArticleRepository {
        self.state.repository()
    }

    pub fn tags(&self) -> TagRepository {
        self.state.repository()
    }

    pub fn notes(&self) -> NoteRepository {
        self.state.repository()
    }
}

async fn create_table<E>(db: &DatabaseConnection, entity: E)
where
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let stmt = Schema::new(backend).create_table_from_entity(entity);

    db.execute(backend.build(&stmt))
        .await
        .expect("Failed to create table");
}
