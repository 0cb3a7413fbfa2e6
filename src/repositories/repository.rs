use sea_orm::sea_query::{IntoValueTuple, ValueTuple};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ActiveValue, ColumnTrait, Condition, DatabaseConnection,
    DbErr, EntityTrait, IdenStatic, IntoActiveModel, Iterable, PaginatorTrait,
    PrimaryKeyToColumn, PrimaryKeyTrait, QueryFilter, TryIntoModel,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::RepositoryConfig;
use crate::error::{RepositoryError, RepositoryResult};
use crate::models::{Page, PageRequest};
use crate::repositories::{Criteria, CriteriaRegistry, DefaultFactory, EntityFactory, Query};

/// Primary key value of an entity, e.g. `i32` or `Uuid`
pub type PrimaryKeyValue<E> = <<E as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType;

type Transform<M> = Box<dyn Fn(M) -> M + Send + Sync>;

/// Generic repository over one SeaORM entity.
///
/// Criteria accumulate on a single lazily created [`Query`]. Every terminal
/// operation moves that query out before touching the database, so the next
/// chain always starts from an unfiltered handle, whether or not the
/// operation succeeded.
///
/// A repository holds mutable query state and is meant to serve one logical
/// operation at a time. Build one per request (see
/// [`AppState::repository`](crate::state::AppState::repository)) rather than
/// sharing an instance.
pub struct Repository<E, A>
where
    E: EntityTrait,
{
    db: DatabaseConnection,
    query: Option<Query<E>>,
    config: RepositoryConfig,
    factory: Box<dyn EntityFactory<A>>,
    transform: Option<Transform<E::Model>>,
}

impl<E, A> Repository<E, A>
where
    E: EntityTrait,
    A: ActiveModelBehavior + Send + 'static,
{
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            query: None,
            config: RepositoryConfig::default(),
            factory: Box::new(DefaultFactory::<A>::new()),
            transform: None,
        }
    }
}

impl<E, A> Repository<E, A>
where
    E: EntityTrait,
{
    pub fn with_config(mut self, config: RepositoryConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the factory used by [`create`](Self::create)
    pub fn with_factory<F>(mut self, factory: F) -> Self
    where
        F: EntityFactory<A> + 'static,
    {
        self.factory = Box::new(factory);
        self
    }

    /// Run `transform` once on every entity returned by a read operation
    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(E::Model) -> E::Model + Send + Sync + 'static,
    {
        self.transform = Some(Box::new(transform));
        self
    }

    pub fn config(&self) -> RepositoryConfig {
        self.config
    }

    // ============ Query lifecycle ============

    /// Current query handle, created on first access after a teardown
    pub fn query(&mut self) -> &mut Query<E> {
        self.query.get_or_insert_with(Query::new)
    }

    /// Drop the pending query together with every criterion applied to it
    pub fn destroy_query(&mut self) {
        self.query = None;
    }

    pub fn has_query(&self) -> bool {
        self.query.is_some()
    }

    /// Move the pending query out, leaving the repository without one
    fn take_query(&mut self) -> Query<E> {
        self.query.take().unwrap_or_default()
    }

    // ============ Criteria ============

    /// Fold `criteria` into the pending query
    pub fn apply_criteria<C>(&mut self, criteria: C) -> &mut Self
    where
        C: Into<Criteria<E>>,
    {
        let criteria = criteria.into();
        tracing::trace!(
            entity = %entity_name::<E>(),
            criterion = criteria.label(),
            "applying criterion"
        );
        criteria.apply(self.query());
        self
    }

    /// Resolve every name against `registry`, then apply them in order.
    ///
    /// Resolution happens up front: if any name is unknown nothing is applied.
    pub fn apply_named<I, S>(
        &mut self,
        registry: &CriteriaRegistry<E>,
        names: I,
    ) -> RepositoryResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let resolved = names
            .into_iter()
            .map(|name| registry.resolve(name.as_ref()))
            .collect::<RepositoryResult<Vec<_>>>()?;

        for criteria in resolved {
            self.apply_criteria(criteria);
        }

        Ok(self)
    }

    // ============ Result normalization ============

    fn finish_one(&self, model: E::Model) -> E::Model {
        match &self.transform {
            Some(transform) => transform(model),
            None => model,
        }
    }

    fn finish_many(&self, models: Vec<E::Model>) -> Vec<E::Model> {
        match &self.transform {
            Some(transform) => models.into_iter().map(transform).collect(),
            None => models,
        }
    }
}

impl<E, A> Repository<E, A>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<A> + Serialize + DeserializeOwned + Send + Sync,
    A: ActiveModelTrait<Entity = E>
        + ActiveModelBehavior
        + TryIntoModel<E::Model>
        + Send
        + 'static,
{
    // ============ Reads ============

    /// All rows matching the accumulated criteria
    pub async fn get_many(&mut self) -> RepositoryResult<Vec<E::Model>> {
        let query = self.take_query();
        tracing::debug!(
            entity = %entity_name::<E>(),
            criteria = query.criteria_applied(),
            "fetching many"
        );

        let models = query.into_select().all(&self.db).await?;
        Ok(self.finish_many(models))
    }

    /// First row matching the accumulated criteria, if any
    pub async fn get_first(&mut self) -> RepositoryResult<Option<E::Model>> {
        let query = self.take_query();
        tracing::debug!(
            entity = %entity_name::<E>(),
            criteria = query.criteria_applied(),
            "fetching first"
        );

        let model = query.into_select().one(&self.db).await?;
        Ok(model.map(|m| self.finish_one(m)))
    }

    /// Number of rows matching the accumulated criteria
    pub async fn count(&mut self) -> RepositoryResult<u64> {
        let query = self.take_query();
        tracing::debug!(
            entity = %entity_name::<E>(),
            criteria = query.criteria_applied(),
            "counting"
        );

        let total = query.into_select().count(&self.db).await?;
        Ok(total)
    }

    /// Row with the given primary key, still subject to the accumulated criteria
    pub async fn get_by_id<K>(&mut self, id: K) -> RepositoryResult<E::Model>
    where
        K: Into<PrimaryKeyValue<E>>,
    {
        let model = self.find_by_identity(id.into()).await?;
        Ok(self.finish_one(model))
    }

    /// Rows whose primary key is in `ids`, still subject to the accumulated criteria
    pub async fn get_many_by_ids<I, K>(&mut self, ids: I) -> RepositoryResult<Vec<E::Model>>
    where
        I: IntoIterator<Item = K>,
        K: Into<PrimaryKeyValue<E>>,
    {
        let query = self.take_query();
        let ids: Vec<PrimaryKeyValue<E>> = ids.into_iter().map(Into::into).collect();
        tracing::debug!(
            entity = %entity_name::<E>(),
            criteria = query.criteria_applied(),
            ids = ids.len(),
            "fetching by ids"
        );

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = query
            .into_select()
            .filter(any_identity::<E>(ids))
            .all(&self.db)
            .await?;

        Ok(self.finish_many(models))
    }

    /// One page of rows matching the accumulated criteria.
    ///
    /// `page` is 1-based. `per_page` falls back to the configured default.
    pub async fn paginate(
        &mut self,
        page: u64,
        per_page: Option<u64>,
    ) -> RepositoryResult<Page<E::Model>> {
        let request = PageRequest {
            page: Some(page),
            per_page,
        };
        self.get_many_paginated(&request).await
    }

    pub async fn get_many_paginated(
        &mut self,
        request: &PageRequest,
    ) -> RepositoryResult<Page<E::Model>> {
        let query = self.take_query();
        let page = request.page();
        let per_page = request.per_page(self.config.per_page, self.config.max_per_page);
        tracing::debug!(
            entity = %entity_name::<E>(),
            criteria = query.criteria_applied(),
            page,
            per_page,
            "fetching page"
        );

        let paginator = query.into_select().paginate(&self.db, per_page);
        let total = paginator.num_items().await?;
        let models = match (page - 1).checked_mul(per_page) {
            Some(offset) if offset < total => paginator.fetch_page(page - 1).await?,
            _ => Vec::new(),
        };

        Ok(Page::new(self.finish_many(models), total, page, per_page))
    }

    // ============ Writes ============

    /// Build a new model through the factory, fill it from `attributes` and insert it
    pub async fn create(&mut self, attributes: serde_json::Value) -> RepositoryResult<E::Model> {
        self.destroy_query();
        tracing::debug!(entity = %entity_name::<E>(), "creating");

        let mut model = self.factory.make()?;
        fill(&mut model, attributes)?;

        model.insert(&self.db).await.map_err(|err| {
            tracing::warn!(entity = %entity_name::<E>(), error = %err, "insert failed");
            RepositoryError::store_failed(entity_name::<E>(), err)
        })
    }

    /// Insert the model if no row with its primary key exists, update it otherwise
    pub async fn save(&mut self, model: A) -> RepositoryResult<E::Model> {
        self.destroy_query();
        tracing::debug!(entity = %entity_name::<E>(), "saving");

        let candidate = model.clone();
        let saved = match model.save(&self.db).await {
            Ok(saved) => saved.try_into_model(),
            // A client-assigned key routes new rows to UPDATE, which matches nothing
            Err(DbErr::RecordNotUpdated) => {
                tracing::debug!(entity = %entity_name::<E>(), "no row to update, inserting");
                candidate.insert(&self.db).await
            }
            Err(err) => Err(err),
        };

        saved.map_err(|err| {
            tracing::warn!(entity = %entity_name::<E>(), error = %err, "save failed");
            RepositoryError::store_failed(entity_name::<E>(), err)
        })
    }

    /// Save each model in order, stopping at the first failure
    pub async fn save_many<I>(&mut self, models: I) -> RepositoryResult<Vec<E::Model>>
    where
        I: IntoIterator<Item = A>,
    {
        let mut saved = Vec::new();
        for model in models {
            saved.push(self.save(model).await?);
        }
        Ok(saved)
    }

    /// Overwrite the attributes present in `attributes` and persist the change
    pub async fn update(
        &mut self,
        model: E::Model,
        attributes: serde_json::Value,
    ) -> RepositoryResult<E::Model> {
        self.destroy_query();
        tracing::debug!(entity = %entity_name::<E>(), "updating");

        let mut active: A = model.into_active_model();
        fill(&mut active, attributes)?;

        active.update(&self.db).await.map_err(|err| {
            tracing::warn!(entity = %entity_name::<E>(), error = %err, "update failed");
            RepositoryError::update_failed(entity_name::<E>(), err)
        })
    }

    /// [`get_by_id`](Self::get_by_id) followed by [`update`](Self::update)
    pub async fn update_by_id<K>(
        &mut self,
        id: K,
        attributes: serde_json::Value,
    ) -> RepositoryResult<E::Model>
    where
        K: Into<PrimaryKeyValue<E>>,
    {
        let model = self.find_by_identity(id.into()).await?;
        self.update(model, attributes).await
    }

    pub async fn delete(&mut self, model: E::Model) -> RepositoryResult<()> {
        self.destroy_query();
        tracing::debug!(entity = %entity_name::<E>(), "deleting");

        let active: A = model.into_active_model();
        let result = active.delete(&self.db).await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound(entity_name::<E>()));
        }

        Ok(())
    }

    /// Delete each model in order, stopping at the first failure.
    /// Returns the number of models deleted.
    pub async fn delete_many<I>(&mut self, models: I) -> RepositoryResult<u64>
    where
        I: IntoIterator<Item = E::Model>,
    {
        let mut deleted = 0;
        for model in models {
            self.delete(model).await?;
            deleted += 1;
        }
        Ok(deleted)
    }

    /// Delete by primary key without going through the criteria.
    /// Pending criteria are discarded. Returns the number of rows removed.
    pub async fn delete_by_id<K>(&mut self, id: K) -> RepositoryResult<u64>
    where
        K: Into<PrimaryKeyValue<E>>,
    {
        self.discard_for_bulk_delete();

        let result = E::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected)
    }

    /// Bulk variant of [`delete_by_id`](Self::delete_by_id)
    pub async fn delete_by_ids<I, K>(&mut self, ids: I) -> RepositoryResult<u64>
    where
        I: IntoIterator<Item = K>,
        K: Into<PrimaryKeyValue<E>>,
    {
        self.discard_for_bulk_delete();

        let ids: Vec<PrimaryKeyValue<E>> = ids.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            return Ok(0);
        }

        let result = E::delete_many()
            .filter(any_identity::<E>(ids))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    // ============ Helpers ============

    async fn find_by_identity(&mut self, id: PrimaryKeyValue<E>) -> RepositoryResult<E::Model> {
        let query = self.take_query();
        tracing::debug!(
            entity = %entity_name::<E>(),
            criteria = query.criteria_applied(),
            "fetching by id"
        );

        query
            .into_select()
            .filter(identity::<E>(id))
            .one(&self.db)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(entity_name::<E>()))
    }

    fn discard_for_bulk_delete(&mut self) {
        let query = self.take_query();
        tracing::debug!(
            entity = %entity_name::<E>(),
            discarded_criteria = query.criteria_applied(),
            "deleting by id"
        );
    }
}

/// Table name, used to label errors and log events
fn entity_name<E>() -> String
where
    E: EntityTrait,
{
    E::default().table_name().to_string()
}

/// `pk = id`, expanded column by column for composite keys
fn identity<E>(id: PrimaryKeyValue<E>) -> Condition
where
    E: EntityTrait,
{
    E::PrimaryKey::iter()
        .zip(id.into_value_tuple())
        .fold(Condition::all(), |cond, (key, value)| {
            cond.add(key.into_column().eq(value))
        })
}

/// `pk IN (..)` for single-column keys, an `OR` of [`identity`] otherwise
fn any_identity<E>(ids: Vec<PrimaryKeyValue<E>>) -> Condition
where
    E: EntityTrait,
{
    let mut keys = E::PrimaryKey::iter();
    match (keys.next(), keys.next()) {
        (Some(key), None) => {
            let values = ids.into_iter().filter_map(|id| match id.into_value_tuple() {
                ValueTuple::One(value) => Some(value),
                _ => None,
            });
            Condition::any().add(key.into_column().is_in(values))
        }
        _ => ids
            .into_iter()
            .fold(Condition::any(), |cond, id| cond.add(identity::<E>(id))),
    }
}

/// Fill `model` from a JSON object.
///
/// Only the columns named in `attributes` are written. Values already on the
/// model (factory defaults, loaded rows) and the primary key are kept otherwise.
fn fill<A>(model: &mut A, attributes: serde_json::Value) -> RepositoryResult<()>
where
    A: ActiveModelBehavior + TryIntoModel<<A::Entity as EntityTrait>::Model>,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A> + Serialize + DeserializeOwned,
{
    let attributes = match attributes {
        serde_json::Value::Object(map) => map,
        other => {
            return Err(RepositoryError::InvalidAttributes(format!(
                "expected a JSON object, got {other}"
            )))
        }
    };

    let columns: Vec<_> = <A::Entity as EntityTrait>::Column::iter()
        .filter(|col| <A::Entity as EntityTrait>::PrimaryKey::from_column(*col).is_none())
        .filter(|col| attributes.contains_key(col.as_str()))
        .collect();

    // The model is deserialized whole, so absent fields come from the template
    let mut merged = match template(model) {
        Some(serde_json::Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    };
    merged.extend(attributes);

    let incoming = A::from_json(serde_json::Value::Object(merged))
        .map_err(|err| RepositoryError::InvalidAttributes(err.to_string()))?;

    for col in columns {
        if let ActiveValue::Set(value) = incoming.get(col) {
            model
                .try_set(col, value)
                .map_err(|err| RepositoryError::InvalidAttributes(err.to_string()))?;
        }
    }

    Ok(())
}

/// Serialized form of `model`, with column defaults standing in for unset
/// values. `None` when some unset column has no default.
fn template<A>(model: &A) -> Option<serde_json::Value>
where
    A: ActiveModelTrait + TryIntoModel<<A::Entity as EntityTrait>::Model>,
    <A::Entity as EntityTrait>::Model: Serialize,
{
    let mut base = A::default_values();
    for col in <A::Entity as EntityTrait>::Column::iter() {
        if let ActiveValue::Set(value) | ActiveValue::Unchanged(value) = model.get(col) {
            base.try_set(col, value).ok()?;
        }
    }

    let filled = base.try_into_model().ok()?;
    serde_json::to_value(filled).ok()
}
