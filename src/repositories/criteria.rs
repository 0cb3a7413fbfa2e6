use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use sea_orm::EntityTrait;

use crate::error::{RepositoryError, RepositoryResult};
use crate::repositories::Query;

/// Reusable filter logic that can be folded into a pending query.
///
/// Implementations mutate the handle in place, for example by adding a
/// `WHERE` clause or an `ORDER BY`.
///
/// ```ignore
/// struct Published;
///
/// impl Criterion<article::Entity> for Published {
///     fn apply(&self, query: &mut Query<article::Entity>) {
///         query.filter(article::Column::Published.eq(true));
///     }
/// }
/// ```
pub trait Criterion<E>: Send + Sync
where
    E: EntityTrait,
{
    fn apply(&self, query: &mut Query<E>);

    /// Label used in logs
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// The two accepted shapes of criteria: a named [`Criterion`] or an inline closure
pub enum Criteria<E>
where
    E: EntityTrait,
{
    Named(Arc<dyn Criterion<E>>),
    Inline(Box<dyn FnOnce(&mut Query<E>) + Send>),
}

impl<E> Criteria<E>
where
    E: EntityTrait,
{
    pub fn named<C>(criterion: C) -> Self
    where
        C: Criterion<E> + 'static,
    {
        Criteria::Named(Arc::new(criterion))
    }

    pub fn inline<F>(f: F) -> Self
    where
        F: FnOnce(&mut Query<E>) + Send + 'static,
    {
        Criteria::Inline(Box::new(f))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Criteria::Named(criterion) => criterion.name(),
            Criteria::Inline(_) => "inline",
        }
    }

    pub(crate) fn apply(self, query: &mut Query<E>) {
        match self {
            Criteria::Named(criterion) => criterion.apply(query),
            Criteria::Inline(f) => f(query),
        }
        query.mark_applied();
    }
}

impl<E, F> From<F> for Criteria<E>
where
    E: EntityTrait,
    F: FnOnce(&mut Query<E>) + Send + 'static,
{
    fn from(f: F) -> Self {
        Criteria::inline(f)
    }
}

impl<E> fmt::Debug for Criteria<E>
where
    E: EntityTrait,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criteria::Named(criterion) => f.debug_tuple("Named").field(&criterion.name()).finish(),
            Criteria::Inline(_) => f.write_str("Inline"),
        }
    }
}

/// Named criteria that callers may select at runtime, e.g. from a request parameter
pub struct CriteriaRegistry<E>
where
    E: EntityTrait,
{
    criteria: HashMap<String, Arc<dyn Criterion<E>>>,
}

impl<E> CriteriaRegistry<E>
where
    E: EntityTrait,
{
    pub fn new() -> Self {
        Self {
            criteria: HashMap::new(),
        }
    }

    /// Register a criterion under `name`, replacing any previous entry
    pub fn register<C>(mut self, name: impl Into<String>, criterion: C) -> Self
    where
        C: Criterion<E> + 'static,
    {
        self.criteria.insert(name.into(), Arc::new(criterion));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.criteria.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.criteria.keys().map(String::as_str)
    }

    /// Look up a criterion by name
    pub fn resolve(&self, name: &str) -> RepositoryResult<Criteria<E>> {
        self.criteria
            .get(name)
            .map(|criterion| Criteria::Named(Arc::clone(criterion)))
            .ok_or_else(|| RepositoryError::InvalidCriterion(format!("unknown criterion `{name}`")))
    }
}

impl<E> Default for CriteriaRegistry<E>
where
    E: EntityTrait,
{
    fn default() -> Self {
        Self::new()
    }
}
