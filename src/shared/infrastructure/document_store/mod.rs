// Port for a partitioned document collection (one container of a document database).
//
// Purpose
// - Describe the five primitives the repository layer needs: create, point read,
//   conditional replace, delete and parameterised query execution.
//
// Boundaries
// - Every call is scoped by a partition key value. Nothing here knows about entities.
// - Uniqueness violations must be reported as `StoreError::Conflict` so callers can
//   tell them apart from transient failures.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub mod condition;
pub mod in_memory;

pub use condition::Condition;

pub type Document = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document {id} not found in partition {partition_key}")]
    NotFound { partition_key: String, id: String },

    #[error("unique key {key} violated in partition {partition_key}")]
    Conflict { partition_key: String, key: String },

    #[error("transient store error: {0}")]
    Transient(String),

    #[error("backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

/// Named bind parameter. Names carry the `@` prefix used in the query text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub value: Value,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A rendered query together with the clauses it was rendered from.
///
/// Drivers talking to a real database execute `text` with `parameters`; the
/// in-memory adapter evaluates the structured clauses directly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub text: String,
    pub parameters: Vec<Parameter>,
    pub fields: Vec<String>,
    pub count: bool,
    pub conditions: Vec<Condition>,
    pub order_by: Option<(String, Order)>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl Query {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters
            .iter()
            .find(|parameter| parameter.name == name)
            .map(|parameter| &parameter.value)
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create(&self, partition_key: &str, document: Document) -> Result<Document, StoreError>;

    async fn read(&self, partition_key: &str, id: &str) -> Result<Document, StoreError>;

    async fn replace(
        &self,
        partition_key: &str,
        id: &str,
        document: Document,
    ) -> Result<Document, StoreError>;

    async fn delete(&self, partition_key: &str, id: &str) -> Result<(), StoreError>;

    async fn query(&self, partition_key: &str, query: &Query) -> Result<Vec<Document>, StoreError>;

    async fn count(&self, partition_key: &str, query: &Query) -> Result<u64, StoreError>;
}
