use std::marker::PhantomData;

use sea_orm::ActiveModelBehavior;

use crate::error::RepositoryResult;

/// Produces new, empty active models for a repository to fill and persist.
///
/// A factory may refuse with [`RepositoryError::InvalidEntityType`] when the
/// model it resolves to is not one it can build.
///
/// [`RepositoryError::InvalidEntityType`]: crate::error::RepositoryError::InvalidEntityType
pub trait EntityFactory<A>: Send + Sync {
    fn make(&self) -> RepositoryResult<A>;
}

impl<A, F> EntityFactory<A> for F
where
    F: Fn() -> RepositoryResult<A> + Send + Sync,
{
    fn make(&self) -> RepositoryResult<A> {
        self()
    }
}

/// Builds models through [`ActiveModelBehavior::new`], so per-entity defaults
/// such as generated primary keys are honoured
pub struct DefaultFactory<A> {
    _model: PhantomData<fn() -> A>,
}

impl<A> DefaultFactory<A> {
    pub fn new() -> Self {
        Self {
            _model: PhantomData,
        }
    }
}

impl<A> Default for DefaultFactory<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> EntityFactory<A> for DefaultFactory<A>
where
    A: ActiveModelBehavior,
{
    fn make(&self) -> RepositoryResult<A> {
        Ok(A::new())
    }
}
