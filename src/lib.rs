// Library crate for the criteria repository layer
// Exports the repository, criteria and query types for embedding services and tests

pub mod config;
pub mod error;
pub mod models;
pub mod repositories;
pub mod state;

pub use error::{RepositoryError, RepositoryResult};
pub use models::{Page, PageRequest};
pub use repositories::{
    Criteria, CriteriaRegistry, Criterion, DefaultFactory, EntityFactory, PrimaryKeyValue, Query,
    Repository,
};
