// Time entry fragments on top of the generic QueryBuilder.
//
// Responsibilities
// - `interval_overlap`: collision predicate between stored intervals and a candidate.
// - `is_running`: entries without an end.
// - `ignore_id`: exclude the entry being validated from its own collision check.
// - `worked_since`: entries still running or ending at or after a given instant.

use crate::shared::core::time::datetime_str;
use crate::shared::infrastructure::document_store::{Condition, Parameter};
use crate::shared::infrastructure::query_builder::QueryBuilder;
use chrono::{DateTime, Utc};

pub const START_FIELD: &str = "start_date";
pub const END_FIELD: &str = "end_date";

pub trait TimeEntryQueryBuilder: Sized {
    /// `end_date: None` is a running candidate, tested as `[start_date, now]`.
    ///
    /// A closed candidate sees stored running entries as ending at `now`. A running
    /// candidate ignores stored running entries; the unique index on
    /// `(owner_id, end_date, deleted)` rejects those.
    fn interval_overlap(
        self,
        start_date: DateTime<Utc>,
        end_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self;
    fn is_running(self) -> Self;
    fn ignore_id(self, id: Option<&str>) -> Self;
    fn worked_since(self, since: DateTime<Utc>) -> Self;
}

impl TimeEntryQueryBuilder for QueryBuilder {
    fn interval_overlap(
        self,
        start_date: DateTime<Utc>,
        end_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut parameters = vec![
            Parameter::new("@start_date", datetime_str(start_date)),
            Parameter::new("@end_date", datetime_str(end_date.unwrap_or(now))),
        ];
        let open_end = match end_date {
            Some(_) => {
                parameters.push(Parameter::new("@now", datetime_str(now)));
                Some("@now".to_string())
            }
            None => None,
        };
        self.with_condition(
            Condition::RangeOverlap {
                start_field: START_FIELD.into(),
                end_field: END_FIELD.into(),
                start: "@start_date".into(),
                end: "@end_date".into(),
                open_end,
            },
            parameters,
        )
    }

    fn is_running(self) -> Self {
        self.with_condition(
            Condition::Missing {
                field: END_FIELD.into(),
            },
            [],
        )
    }

    fn ignore_id(self, id: Option<&str>) -> Self {
        let Some(id) = id.filter(|id| !id.is_empty()) else {
            return self;
        };
        self.with_condition(
            Condition::NotEquals {
                field: "id".into(),
                parameter: "@ignore_id".into(),
            },
            [Parameter::new("@ignore_id", id)],
        )
    }

    fn worked_since(self, since: DateTime<Utc>) -> Self {
        self.with_condition(
            Condition::AnyOf(vec![
                Condition::Missing {
                    field: END_FIELD.into(),
                },
                Condition::AtLeast {
                    field: END_FIELD.into(),
                    parameter: "@since".into(),
                },
            ]),
            [Parameter::new("@since", datetime_str(since))],
        )
    }
}
