// Generic soft-deleting repository over one partitioned container.
//
// Purpose
// - Entity-agnostic create, find, find-all, count, partial update, replace, soft delete
//   and permanent delete.
//
// Responsibilities
// - Scope every call to the partition named by the event context's tenant.
// - Hide soft-deleted documents unless the caller asks for them.
// - Call the injected `Validator` before every create and update.
// - Attach the event context to every written document under `_last_event_ctx`.
//
// Boundaries
// - Read, validate and write are separate store calls. Concurrent writers can both pass
//   validation; only the store's unique keys are a hard backstop.

pub mod errors;

use crate::config::Settings;
use crate::shared::core::date_range::DateRange;
use crate::shared::core::event_context::EventContext;
use crate::shared::core::time::datetime_str;
use crate::shared::infrastructure::document_store::{Document, DocumentStore, Order, Query};
use crate::shared::infrastructure::query_builder::QueryBuilder;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

pub use errors::RepositoryError;

pub const EVENT_CONTEXT_FIELD: &str = "_last_event_ctx";

pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Shape accepted by `create`, before the store assigns an id.
    type Draft: Serialize + Send + Sync;
    /// Typed partial update; unknown keys cannot be expressed.
    type Patch: Send + Sync;

    fn id(&self) -> &str;
    fn deleted(&self) -> Option<&str>;
    fn mark_deleted(&mut self, sentinel: String);
    fn apply(&mut self, patch: Self::Patch);
}

/// Hooks run before persistence. Both default to accepting the write.
#[async_trait]
pub trait Validator<E: Entity>: Send + Sync {
    async fn on_create(
        &self,
        _draft: &mut E::Draft,
        _context: &EventContext,
    ) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn on_update(&self, _entity: &E, _context: &EventContext) -> Result<(), RepositoryError> {
        Ok(())
    }
}

pub struct AcceptAll;

impl<E: Entity> Validator<E> for AcceptAll {}

#[derive(Debug, Clone)]
pub struct FindAllOptions {
    pub conditions: Vec<(String, Value)>,
    pub date_range: Option<DateRange>,
    pub max_count: Option<i64>,
    pub offset: Option<i64>,
    pub visible_only: bool,
    pub order_by: Option<(String, Order)>,
}

impl Default for FindAllOptions {
    fn default() -> Self {
        Self {
            conditions: Vec::new(),
            date_range: None,
            max_count: None,
            offset: None,
            visible_only: true,
            order_by: None,
        }
    }
}

impl FindAllOptions {
    pub fn with_condition(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }
}

pub struct Repository<E: Entity, S: DocumentStore> {
    store: Arc<S>,
    validator: Arc<dyn Validator<E>>,
    partition_key: String,
    default_page_size: i64,
    order_by: Option<(String, Order)>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity, S: DocumentStore> Repository<E, S> {
    pub fn new(store: Arc<S>, validator: Arc<dyn Validator<E>>, settings: &Settings) -> Self {
        Self {
            store,
            validator,
            partition_key: settings.partition_key.clone(),
            default_page_size: settings.default_page_size,
            order_by: None,
            _entity: PhantomData,
        }
    }

    /// Ordering applied to `find_all` when the caller does not ask for one.
    pub fn with_default_order(mut self, field: impl Into<String>, order: Order) -> Self {
        self.order_by = Some((field.into(), order));
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn page_size_or(&self, custom_page_size: Option<i64>) -> i64 {
        custom_page_size
            .filter(|size| *size > 0)
            .unwrap_or(self.default_page_size)
    }

    pub async fn create(
        &self,
        draft: E::Draft,
        context: &EventContext,
    ) -> Result<E, RepositoryError> {
        let mut draft = draft;
        self.validator.on_create(&mut draft, context).await?;

        let mut document = to_document(&draft)?;
        document.insert("id".into(), Value::String(Uuid::now_v7().to_string()));
        document.insert(self.partition_key.clone(), Value::String(context.tenant_id.clone()));
        replace_empty_value_per_none(&mut document);
        attach_context(&mut document, context)?;

        let created = self.store.create(&context.tenant_id, document).await?;
        let entity: E = from_document(created)?;
        tracing::info!(id = entity.id(), action = %context.action, "document created");
        Ok(entity)
    }

    pub async fn find(
        &self,
        id: &str,
        context: &EventContext,
        visible_only: bool,
    ) -> Result<E, RepositoryError> {
        let document = self.store.read(&context.tenant_id, id).await?;
        let entity: E = from_document(document)?;
        if visible_only && entity.deleted().is_some() {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        Ok(entity)
    }

    pub async fn find_all(
        &self,
        context: &EventContext,
        options: FindAllOptions,
    ) -> Result<Vec<E>, RepositoryError> {
        let order_by = options.order_by.clone().or_else(|| self.order_by.clone());
        let mut builder = self
            .filter(&options)
            .limit(Some(self.page_size_or(options.max_count)))
            .offset(options.offset);
        if let Some((field, order)) = order_by {
            builder = builder.order_by(&field, order);
        }
        self.execute(&context.tenant_id, &builder.build()).await
    }

    pub async fn count(
        &self,
        context: &EventContext,
        options: FindAllOptions,
    ) -> Result<u64, RepositoryError> {
        let query = self.filter(&options).select_count().build();
        tracing::debug!(
            query = query.text(),
            parameters = ?query.parameters(),
            "counting documents"
        );
        Ok(self.store.count(&context.tenant_id, &query).await?)
    }

    /// Runs an already built query in one partition and maps every row.
    pub async fn execute(
        &self,
        partition_key: &str,
        query: &Query,
    ) -> Result<Vec<E>, RepositoryError> {
        tracing::debug!(query = query.text(), parameters = ?query.parameters(), "executing query");
        self.store
            .query(partition_key, query)
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }

    pub async fn partial_update(
        &self,
        id: &str,
        patch: E::Patch,
        context: &EventContext,
    ) -> Result<E, RepositoryError> {
        let mut entity = self.find(id, context, true).await?;
        entity.apply(patch);
        self.update(entity, context).await
    }

    /// Replaces the stored document with `entity` after validation.
    pub async fn update(&self, entity: E, context: &EventContext) -> Result<E, RepositoryError> {
        self.validator.on_update(&entity, context).await?;

        let mut document = to_document(&entity)?;
        document.insert(self.partition_key.clone(), Value::String(context.tenant_id.clone()));
        replace_empty_value_per_none(&mut document);
        attach_context(&mut document, context)?;

        let replaced = self
            .store
            .replace(&context.tenant_id, entity.id(), document)
            .await?;
        let entity: E = from_document(replaced)?;
        tracing::info!(id = entity.id(), action = %context.action, "document replaced");
        Ok(entity)
    }

    /// Soft delete: stamps a fresh sentinel. A second call fails with `NotFound`.
    pub async fn delete(&self, id: &str, context: &EventContext) -> Result<E, RepositoryError> {
        let mut entity = self.find(id, context, true).await?;
        entity.mark_deleted(Uuid::now_v7().to_string());
        self.update(entity, context).await
    }

    /// Hard removal, bypassing visibility. Reserved for test and cleanup tooling.
    pub async fn delete_permanently(
        &self,
        id: &str,
        context: &EventContext,
    ) -> Result<(), RepositoryError> {
        self.store.delete(&context.tenant_id, id).await?;
        tracing::info!(id, action = %context.action, "document removed permanently");
        Ok(())
    }

    fn filter(&self, options: &FindAllOptions) -> QueryBuilder {
        let date_range = options.date_range;
        QueryBuilder::new()
            .where_equals(options.conditions.clone())
            .where_date_range(
                date_range.map(|range| datetime_str(range.start)),
                date_range.map(|range| datetime_str(range.end)),
            )
            .where_visible_only(options.visible_only)
    }
}

fn to_document<T: Serialize>(value: &T) -> Result<Document, RepositoryError> {
    match serde_json::to_value(value)? {
        Value::Object(document) => Ok(document),
        other => Err(RepositoryError::Serialization(serde::ser::Error::custom(format!(
            "expected an object, got {other}"
        )))),
    }
}

fn from_document<E: DeserializeOwned>(document: Document) -> Result<E, RepositoryError> {
    Ok(serde_json::from_value(Value::Object(document))?)
}

fn replace_empty_value_per_none(document: &mut Document) {
    for value in document.values_mut() {
        if value.as_str().is_some_and(str::is_empty) {
            *value = Value::Null;
        }
    }
}

fn attach_context(document: &mut Document, context: &EventContext) -> Result<(), RepositoryError> {
    document.insert(EVENT_CONTEXT_FIELD.into(), serde_json::to_value(context)?);
    Ok(())
}
