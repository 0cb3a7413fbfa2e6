mod common;

use criteria_repository::state::{AppState, AppStateError};

use common::app::test_config;
use common::{Factory, TestApp};

#[tokio::test]
async fn test_unreachable_database_is_reported() {
    let mut config = test_config();
    config.database_url = "unknown://localhost/app".to_string();

    let result = AppState::new(config).await;
    assert!(matches!(result, Err(AppStateError::Database(_))));
}

#[tokio::test]
async fn test_repositories_are_independent() {
    let app = TestApp::new().await;
    Factory::new(&app.state).create_articles(4).await;

    let mut filtered = app.articles();
    filtered.query().limit(1);

    // A second repository from the same state starts from a clean query
    let mut other = app.articles();
    assert!(!other.has_query());
    assert_eq!(other.get_many().await.unwrap().len(), 4);

    assert_eq!(filtered.get_many().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_repository_picks_up_state_config() {
    let app = TestApp::new().await;

    let repo = app.articles();
    assert_eq!(repo.config(), app.state.config.repository);
}
