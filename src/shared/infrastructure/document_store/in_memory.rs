// In memory implementation of the DocumentStore port.
//
// Purpose
// - Run the repository layer and its tests without a database.
//
// Responsibilities
// - Keep documents per partition in insertion order (the store-native order).
// - Enforce the container's unique key policy; absent and null values compare equal.
// - Evaluate the structured clauses of a `Query` instead of parsing its text.
// - Compare timestamp strings chronologically, everything else by JSON value.

use crate::shared::core::interval::Interval;
use crate::shared::core::time::parse_datetime;
use crate::shared::infrastructure::document_store::{
    Condition, Document, DocumentStore, Order, Query, StoreError,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryDocumentStore {
    container_id: String,
    unique_keys: Vec<Vec<String>>,
    partitions: RwLock<HashMap<String, Vec<Document>>>,
    is_offline: bool,
}

impl InMemoryDocumentStore {
    pub fn new(container_id: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            ..Self::default()
        }
    }

    pub fn with_unique_key(mut self, paths: &[&str]) -> Self {
        self.unique_keys
            .push(paths.iter().map(|path| path.to_string()).collect());
        self
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    pub fn toggle_offline(&mut self) {
        self.is_offline = !self.is_offline;
    }

    pub async fn snapshot(&self, partition_key: &str) -> Vec<Document> {
        self.partitions
            .read()
            .await
            .get(partition_key)
            .cloned()
            .unwrap_or_default()
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.is_offline {
            return Err(StoreError::Transient(format!(
                "Document store {} offline",
                self.container_id
            )));
        }
        Ok(())
    }

    fn check_unique_keys(
        &self,
        partition_key: &str,
        documents: &[Document],
        candidate: &Document,
    ) -> Result<(), StoreError> {
        let candidate_id = document_id(candidate);
        for paths in &self.unique_keys {
            let key = unique_tuple(candidate, paths);
            let clash = documents
                .iter()
                .filter(|existing| document_id(existing) != candidate_id)
                .any(|existing| unique_tuple(existing, paths) == key);
            if clash {
                return Err(StoreError::Conflict {
                    partition_key: partition_key.to_string(),
                    key: paths.join(","),
                });
            }
        }
        Ok(())
    }

    fn matching(documents: &[Document], query: &Query) -> Vec<Document> {
        documents
            .iter()
            .filter(|document| {
                query
                    .conditions
                    .iter()
                    .all(|condition| evaluate(condition, document, query))
            })
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn create(
        &self,
        partition_key: &str,
        document: Document,
    ) -> Result<Document, StoreError> {
        self.ensure_online()?;
        let Some(id) = document_id(&document).map(str::to_string) else {
            return Err(StoreError::Backend("document has no id".into()));
        };
        let mut guard = self.partitions.write().await;
        let documents = guard.entry(partition_key.to_string()).or_default();
        if documents
            .iter()
            .any(|existing| document_id(existing) == Some(id.as_str()))
        {
            return Err(StoreError::Conflict {
                partition_key: partition_key.to_string(),
                key: "id".into(),
            });
        }
        self.check_unique_keys(partition_key, documents, &document)?;
        documents.push(document.clone());
        Ok(document)
    }

    async fn read(&self, partition_key: &str, id: &str) -> Result<Document, StoreError> {
        self.ensure_online()?;
        self.partitions
            .read()
            .await
            .get(partition_key)
            .and_then(|documents| {
                documents
                    .iter()
                    .find(|document| document_id(document) == Some(id))
                    .cloned()
            })
            .ok_or_else(|| StoreError::NotFound {
                partition_key: partition_key.to_string(),
                id: id.to_string(),
            })
    }

    async fn replace(
        &self,
        partition_key: &str,
        id: &str,
        document: Document,
    ) -> Result<Document, StoreError> {
        self.ensure_online()?;
        let mut guard = self.partitions.write().await;
        let not_found = || StoreError::NotFound {
            partition_key: partition_key.to_string(),
            id: id.to_string(),
        };
        let documents = guard.get_mut(partition_key).ok_or_else(not_found)?;
        let position = documents
            .iter()
            .position(|existing| document_id(existing) == Some(id))
            .ok_or_else(not_found)?;
        let mut document = document;
        document.insert("id".into(), Value::String(id.to_string()));
        self.check_unique_keys(partition_key, documents, &document)?;
        documents[position] = document.clone();
        Ok(document)
    }

    async fn delete(&self, partition_key: &str, id: &str) -> Result<(), StoreError> {
        self.ensure_online()?;
        let mut guard = self.partitions.write().await;
        let removed = guard.get_mut(partition_key).and_then(|documents| {
            let position = documents
                .iter()
                .position(|existing| document_id(existing) == Some(id))?;
            Some(documents.remove(position))
        });
        match removed {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound {
                partition_key: partition_key.to_string(),
                id: id.to_string(),
            }),
        }
    }

    async fn query(&self, partition_key: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        self.ensure_online()?;
        let guard = self.partitions.read().await;
        let documents = guard.get(partition_key).map(Vec::as_slice).unwrap_or_default();
        let mut items = Self::matching(documents, query);

        if let Some((field, order)) = &query.order_by {
            // Stable sort keeps insertion order among equal keys; documents without the
            // field sort last regardless of direction.
            items.sort_by(|left, right| match (left.get(field), right.get(field)) {
                (Some(a), Some(b)) if !a.is_null() && !b.is_null() => {
                    let ordering = compare(a, b).unwrap_or(Ordering::Equal);
                    match order {
                        Order::Asc => ordering,
                        Order::Desc => ordering.reverse(),
                    }
                }
                (Some(a), _) if !a.is_null() => Ordering::Less,
                (_, Some(b)) if !b.is_null() => Ordering::Greater,
                _ => Ordering::Equal,
            });
        }

        let offset = query.offset.unwrap_or(0).max(0) as usize;
        let limit = query.limit.map(|limit| limit.max(0) as usize);
        let items = items
            .into_iter()
            .skip(offset)
            .take(limit.unwrap_or(usize::MAX))
            .map(|document| project(document, &query.fields))
            .collect();
        Ok(items)
    }

    async fn count(&self, partition_key: &str, query: &Query) -> Result<u64, StoreError> {
        self.ensure_online()?;
        let guard = self.partitions.read().await;
        let documents = guard.get(partition_key).map(Vec::as_slice).unwrap_or_default();
        Ok(Self::matching(documents, query).len() as u64)
    }
}

fn document_id(document: &Document) -> Option<&str> {
    document.get("id").and_then(Value::as_str)
}

fn unique_tuple(document: &Document, paths: &[String]) -> Vec<Value> {
    paths
        .iter()
        .map(|path| document.get(path).cloned().unwrap_or(Value::Null))
        .collect()
}

fn project(document: Document, fields: &[String]) -> Document {
    if fields.is_empty() {
        return document;
    }
    document
        .into_iter()
        .filter(|(key, _)| fields.contains(key))
        .collect()
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => match (parse_datetime(a), parse_datetime(b)) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => Some(a.cmp(b)),
        },
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (a, b) if a == b => Some(Ordering::Equal),
        _ => None,
    }
}

fn equals(left: &Value, right: &Value) -> bool {
    compare(left, right) == Some(Ordering::Equal)
}

fn between(value: &Value, low: &Value, high: &Value) -> bool {
    matches!(compare(value, low), Some(Ordering::Greater | Ordering::Equal))
        && matches!(compare(value, high), Some(Ordering::Less | Ordering::Equal))
}

fn as_datetime(value: Option<&Value>) -> Option<DateTime<Utc>> {
    value.and_then(Value::as_str).and_then(parse_datetime)
}

fn evaluate(condition: &Condition, document: &Document, query: &Query) -> bool {
    let field_value = |field: &str| document.get(field);
    match condition {
        Condition::In { field, values } => field_value(field)
            .and_then(Value::as_str)
            .is_some_and(|value| values.iter().any(|candidate| candidate == value)),
        Condition::NotIn { field, values } => field_value(field)
            .and_then(Value::as_str)
            .is_some_and(|value| values.iter().all(|candidate| candidate != value)),
        Condition::Equals { field, parameter } => {
            match (field_value(field), query.parameter(parameter)) {
                (Some(value), Some(expected)) => equals(value, expected),
                _ => false,
            }
        }
        Condition::NotEquals { field, parameter } => {
            match (field_value(field), query.parameter(parameter)) {
                (Some(value), Some(expected)) => !equals(value, expected),
                _ => false,
            }
        }
        Condition::AtLeast { field, parameter } => {
            match (field_value(field), query.parameter(parameter)) {
                (Some(value), Some(bound)) => {
                    matches!(compare(value, bound), Some(Ordering::Greater | Ordering::Equal))
                }
                _ => false,
            }
        }
        Condition::Undefined { field } => field_value(field).is_none(),
        Condition::Missing { field } => field_value(field).is_none_or(Value::is_null),
        Condition::Present { field } => field_value(field).is_some_and(|value| !value.is_null()),
        Condition::AnyBetween { fields, low, high } => {
            let (Some(low), Some(high)) = (query.parameter(low), query.parameter(high)) else {
                return false;
            };
            fields.iter().any(|field| {
                field_value(field).is_some_and(|value| between(value, low, high))
            })
        }
        Condition::RangeOverlap {
            start_field,
            end_field,
            start,
            end,
            open_end,
        } => {
            let stored_start = as_datetime(field_value(start_field));
            let stored_end = as_datetime(field_value(end_field)).or_else(|| {
                open_end
                    .as_deref()
                    .and_then(|now| as_datetime(query.parameter(now)))
            });
            let candidate_start = as_datetime(query.parameter(start));
            let candidate_end = as_datetime(query.parameter(end));
            match (stored_start, stored_end, candidate_start, candidate_end) {
                (
                    Some(stored_start),
                    Some(stored_end),
                    Some(candidate_start),
                    Some(candidate_end),
                ) => {
                    let stored = Interval::closed(stored_start, stored_end);
                    let candidate = Interval::closed(candidate_start, candidate_end);
                    stored.overlaps(&candidate, candidate_end)
                }
                _ => false,
            }
        }
        Condition::AnyOf(conditions) => conditions
            .iter()
            .any(|condition| evaluate(condition, document, query)),
    }
}
