use std::mem;

use sea_orm::sea_query::IntoCondition;
use sea_orm::{
    DbBackend, EntityTrait, IntoSimpleExpr, QueryFilter, QueryOrder, QuerySelect, QueryTrait,
    Select,
};

/// A pending, not yet executed query for one entity type.
///
/// Criteria mutate the handle in place. The repository owns exactly one of
/// these at a time and hands the inner [`Select`] to SeaORM when a terminal
/// operation runs.
#[derive(Debug, Clone)]
pub struct Query<E>
where
    E: EntityTrait,
{
    select: Select<E>,
    applied: usize,
}

impl<E> Query<E>
where
    E: EntityTrait,
{
    /// Fresh handle with no filters: `SELECT * FROM <table>`
    pub fn new() -> Self {
        Self {
            select: E::find(),
            applied: 0,
        }
    }

    /// Rewrite the underlying select with any SeaORM builder call
    pub fn map<F>(&mut self, f: F) -> &mut Self
    where
        F: FnOnce(Select<E>) -> Select<E>,
    {
        let select = mem::replace(&mut self.select, E::find());
        self.select = f(select);
        self
    }

    pub fn filter<F>(&mut self, filter: F) -> &mut Self
    where
        F: IntoCondition,
    {
        self.map(|select| select.filter(filter))
    }

    pub fn order_by_asc<C>(&mut self, col: C) -> &mut Self
    where
        C: IntoSimpleExpr,
    {
        self.map(|select| select.order_by_asc(col))
    }

    pub fn order_by_desc<C>(&mut self, col: C) -> &mut Self
    where
        C: IntoSimpleExpr,
    {
        self.map(|select| select.order_by_desc(col))
    }

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.map(|select| select.limit(limit))
    }

    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.map(|select| select.offset(offset))
    }

    /// Number of criteria folded into this handle since it was created
    pub fn criteria_applied(&self) -> usize {
        self.applied
    }

    pub fn as_select(&self) -> &Select<E> {
        &self.select
    }

    pub fn into_select(self) -> Select<E> {
        self.select
    }

    /// Render the statement with values inlined, for logs and assertions
    pub fn to_sql(&self, backend: DbBackend) -> String {
        self.select.build(backend).to_string()
    }

    pub(crate) fn mark_applied(&mut self) {
        self.applied += 1;
    }
}

impl<E> Default for Query<E>
where
    E: EntityTrait,
{
    fn default() -> Self {
        Self::new()
    }
}
