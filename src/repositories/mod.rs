pub mod criteria;
pub mod factory;
pub mod query;
pub mod repository;

pub use criteria::{Criteria, CriteriaRegistry, Criterion};
pub use factory::{DefaultFactory, EntityFactory};
pub use query::Query;
pub use repository::{PrimaryKeyValue, Repository};
