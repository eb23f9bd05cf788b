// Fluent builder for filter, sort and paging queries against one partitioned container.
//
// Purpose
// - Assemble WHERE fragments and their bind parameters in call order, then render
//   them into a single query string with a fixed clause order:
//   SELECT, FROM, WHERE, ORDER BY, OFFSET, LIMIT.
//
// Rules
// - Every method is a no-op on empty or absent input and never fails.
// - Values reach the query through named parameters, except IN-list values which are
//   interpolated and must be sanitised by the caller.
// - `build` returns the `Query`, exposing text and parameters separately.

use crate::shared::infrastructure::document_store::{Condition, Order, Parameter, Query};
use serde_json::Value;

pub const CONTAINER_ALIAS: &str = "c";
pub const DELETED_FIELD: &str = "deleted";

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    inner: Query,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_fields<I, F>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        self.inner
            .fields
            .extend(fields.into_iter().map(Into::into).filter(|field: &String| !field.is_empty()));
        self
    }

    /// Renders `SELECT VALUE COUNT(1)`; paging still applies to the rendered text.
    pub fn select_count(mut self) -> Self {
        self.inner.count = true;
        self
    }

    pub fn where_in(self, field: &str, values: &[String]) -> Self {
        if field.is_empty() || values.is_empty() {
            return self;
        }
        self.with_condition(
            Condition::In {
                field: field.to_string(),
                values: values.to_vec(),
            },
            [],
        )
    }

    pub fn where_not_in(self, field: &str, values: &[String]) -> Self {
        if field.is_empty() || values.is_empty() {
            return self;
        }
        self.with_condition(
            Condition::NotIn {
                field: field.to_string(),
                values: values.to_vec(),
            },
            [],
        )
    }

    /// One `field = @field` fragment and one bind parameter per pair, in iteration order.
    pub fn where_equals<I, K>(mut self, conditions: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        for (field, value) in conditions {
            let field = field.into();
            let parameter = format!("@{field}");
            self = self.with_condition(
                Condition::Equals {
                    field,
                    parameter: parameter.clone(),
                },
                [Parameter::new(parameter, value)],
            );
        }
        self
    }

    /// Keeps only documents without the soft-delete sentinel. Checks absence, not null.
    pub fn where_visible_only(self, visible_only: bool) -> Self {
        if !visible_only {
            return self;
        }
        self.with_condition(
            Condition::Undefined {
                field: DELETED_FIELD.to_string(),
            },
            [],
        )
    }

    pub fn where_present(self, field: &str) -> Self {
        if field.is_empty() {
            return self;
        }
        self.with_condition(
            Condition::Present {
                field: field.to_string(),
            },
            [],
        )
    }

    /// Either endpoint of a stored interval inside `[start, end]`. Needs both bounds.
    pub fn where_date_range(self, start: Option<String>, end: Option<String>) -> Self {
        let (Some(start), Some(end)) = (start, end) else {
            return self;
        };
        self.with_condition(
            Condition::AnyBetween {
                fields: vec!["start_date".into(), "end_date".into()],
                low: "@start_date".into(),
                high: "@end_date".into(),
            },
            [
                Parameter::new("@start_date", start),
                Parameter::new("@end_date", end),
            ],
        )
    }

    /// Single ordering key; the last call wins.
    pub fn order_by(mut self, field: &str, order: Order) -> Self {
        if !field.is_empty() {
            self.inner.order_by = Some((field.to_string(), order));
        }
        self
    }

    pub fn limit(mut self, limit: Option<i64>) -> Self {
        if let Some(limit) = limit.filter(|limit| *limit > 0) {
            self.inner.limit = Some(limit);
        }
        self
    }

    pub fn offset(mut self, offset: Option<i64>) -> Self {
        if let Some(offset) = offset.filter(|offset| *offset > 0) {
            self.inner.offset = Some(offset);
        }
        self
    }

    /// Extension point for domain-specific fragments.
    pub fn with_condition<P>(mut self, condition: Condition, parameters: P) -> Self
    where
        P: IntoIterator<Item = Parameter>,
    {
        self.inner.conditions.push(condition);
        self.inner.parameters.extend(parameters);
        self
    }

    pub fn build(mut self) -> Query {
        let select = self.build_select();
        let filter = self.build_where();
        let order_by = self.build_order_by();
        let offset = self.build_offset();
        let limit = self.build_limit();
        let clauses = [
            format!("SELECT {select} FROM {CONTAINER_ALIAS}"),
            filter,
            order_by,
            offset,
            limit,
        ];
        self.inner.text = clauses
            .into_iter()
            .filter(|clause| !clause.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        self.inner
    }

    fn build_select(&self) -> String {
        if self.inner.count {
            return "VALUE COUNT(1)".to_string();
        }
        if self.inner.fields.is_empty() {
            return "*".to_string();
        }
        self.inner
            .fields
            .iter()
            .map(|field| format!("{CONTAINER_ALIAS}.{field}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn build_where(&self) -> String {
        if self.inner.conditions.is_empty() {
            return String::new();
        }
        let fragments: Vec<String> = self
            .inner
            .conditions
            .iter()
            .map(|condition| condition.render(CONTAINER_ALIAS))
            .collect();
        format!("WHERE {}", fragments.join(" AND "))
    }

    fn build_order_by(&self) -> String {
        match &self.inner.order_by {
            Some((field, order)) => {
                format!("ORDER BY {CONTAINER_ALIAS}.{field} {}", order.as_sql())
            }
            None => String::new(),
        }
    }

    fn build_offset(&mut self) -> String {
        match self.inner.offset {
            Some(offset) => {
                self.inner.parameters.push(Parameter::new("@offset", offset));
                "OFFSET @offset".to_string()
            }
            None => String::new(),
        }
    }

    fn build_limit(&mut self) -> String {
        match self.inner.limit {
            Some(limit) => {
                self.inner.parameters.push(Parameter::new("@limit", limit));
                "LIMIT @limit".to_string()
            }
            None => String::new(),
        }
    }
}
