use sea_orm::{ActiveModelBehavior, ConnectOptions, Database, DatabaseConnection, EntityTrait};

use crate::config::Config;
use crate::repositories::Repository;

/// Application state shared across request handlers
#[derive(Clone)]
pub struct AppState {
    /// SeaORM database connection (pooled, cheap to clone)
    pub db: DatabaseConnection,
    pub config: Config,
}

impl AppState {
    /// Create a new AppState by connecting to the database
    pub async fn new(config: Config) -> Result<Self, AppStateError> {
        let mut opt = ConnectOptions::new(&config.database_url);
        opt.max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .sqlx_logging(config.sqlx_logging);

        let db = Database::connect(opt)
            .await
            .map_err(|e| AppStateError::Database(e.to_string()))?;

        tracing::info!("Database connection established");

        Ok(Self::with_connection(db, config))
    }

    /// Wrap an existing connection (for testing)
    pub fn with_connection(db: DatabaseConnection, config: Config) -> Self {
        Self { db, config }
    }

    /// Fresh repository for one logical operation.
    ///
    /// Repositories carry pending query state, so handlers should ask for a
    /// new one per request instead of keeping one around.
    pub fn repository<E, A>(&self) -> Repository<E, A>
    where
        E: EntityTrait,
        A: ActiveModelBehavior + Send + 'static,
    {
        Repository::new(self.db.clone()).with_config(self.config.repository)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppStateError {
    #[error("Database connection error: {0}")]
    Database(String),
}
