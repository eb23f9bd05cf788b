// Validation run before a time entry is created or replaced.
//
// Purpose
// - Keep visible entries of one owner free of overlaps and keep every interval well formed.
//
// Responsibilities
// - Check, in this order, and stop at the first failure:
//   - the referenced project and activity exist
//   - `end_date` is after `start_date` and not in the future
//   - no other visible entry of the owner collides with the interval
// - Default a missing `start_date` to now on create.
// - Let soft deletes through without any check.

use crate::modules::time_entries::adapters::outbound::time_entry_query_builder::TimeEntryQueryBuilder;
use crate::modules::time_entries::core::ports::RelatedEntities;
use crate::modules::time_entries::core::time_entry::{NewTimeEntry, TimeEntry};
use crate::shared::core::event_context::EventContext;
use crate::shared::core::interval::Interval;
use crate::shared::core::time::Clock;
use crate::shared::infrastructure::document_store::DocumentStore;
use crate::shared::infrastructure::query_builder::QueryBuilder;
use crate::shared::infrastructure::repository::{RepositoryError, Validator};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;

/// The fields validation looks at, borrowed from either a draft or a stored entry.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub id: Option<&'a str>,
    pub owner_id: &'a str,
    pub project_id: Option<&'a str>,
    pub activity_id: Option<&'a str>,
    pub interval: Interval,
}

impl<'a> From<&'a TimeEntry> for Candidate<'a> {
    fn from(entry: &'a TimeEntry) -> Self {
        Self {
            id: Some(&entry.id),
            owner_id: &entry.owner_id,
            project_id: Some(&entry.project_id),
            activity_id: Some(&entry.activity_id),
            interval: entry.interval(),
        }
    }
}

impl<'a> Candidate<'a> {
    /// A draft without a start is checked as starting at `now`; the owner defaults to
    /// the acting user.
    pub fn from_draft(draft: &'a NewTimeEntry, actor_id: &'a str, now: DateTime<Utc>) -> Self {
        let start_date = draft.start_date.unwrap_or(now);
        Self {
            id: None,
            owner_id: draft.owner_id.as_deref().unwrap_or(actor_id),
            project_id: draft.project_id.as_deref(),
            activity_id: draft.activity_id.as_deref(),
            interval: Interval::new(start_date, draft.end_date),
        }
    }
}

pub struct TimeEntryValidator<S: DocumentStore> {
    store: Arc<S>,
    related: Arc<dyn RelatedEntities>,
    clock: Arc<dyn Clock>,
}

impl<S: DocumentStore> TimeEntryValidator<S> {
    pub fn new(store: Arc<S>, related: Arc<dyn RelatedEntities>, clock: Arc<dyn Clock>) -> Self {
        Self { store, related, clock }
    }

    /// Whether a visible entry of `owner_id` collides with `[start_date, end_date or now)`.
    pub async fn find_interception_with_date_range(
        &self,
        start_date: DateTime<Utc>,
        end_date: Option<DateTime<Utc>>,
        owner_id: &str,
        tenant_id: &str,
        ignore_id: Option<&str>,
    ) -> Result<bool, RepositoryError> {
        let query = QueryBuilder::new()
            .interval_overlap(start_date, end_date, self.clock.now())
            .where_equals([("owner_id", json!(owner_id)), ("tenant_id", json!(tenant_id))])
            .ignore_id(ignore_id)
            .where_visible_only(true)
            .limit(Some(1))
            .build();
        tracing::debug!(
            query = query.text(),
            parameters = ?query.parameters(),
            "looking for colliding entries"
        );
        let collisions = self.store.query(tenant_id, &query).await?;
        Ok(!collisions.is_empty())
    }

    pub async fn validate(
        &self,
        candidate: Candidate<'_>,
        context: &EventContext,
    ) -> Result<(), RepositoryError> {
        let result = self.check(candidate, context).await;
        log_rejection(candidate, context, result)
    }

    /// Runs every check except the collision query. Used before writes that must not
    /// happen for an entry that can never be valid.
    pub async fn validate_well_formed(
        &self,
        candidate: Candidate<'_>,
        context: &EventContext,
    ) -> Result<(), RepositoryError> {
        let result = async {
            self.check_related_entities(candidate, &context.tenant_id).await?;
            self.check_interval(candidate.interval)
        }
        .await;
        log_rejection(candidate, context, result)
    }

    async fn check(
        &self,
        candidate: Candidate<'_>,
        context: &EventContext,
    ) -> Result<(), RepositoryError> {
        self.check_related_entities(candidate, &context.tenant_id).await?;
        self.check_interval(candidate.interval)?;

        let Interval { start, end } = candidate.interval;
        let collides = self
            .find_interception_with_date_range(
                start,
                end,
                candidate.owner_id,
                &context.tenant_id,
                candidate.id,
            )
            .await?;
        if collides {
            return Err(RepositoryError::OverlapDetected);
        }
        Ok(())
    }

    async fn check_related_entities(
        &self,
        candidate: Candidate<'_>,
        tenant_id: &str,
    ) -> Result<(), RepositoryError> {
        let project_id = required(candidate.project_id, "project_id")?;
        if !self.related.project_exists(tenant_id, project_id).await? {
            return Err(RepositoryError::RelatedEntityMissing(format!(
                "project {project_id} not found"
            )));
        }
        let activity_id = required(candidate.activity_id, "activity_id")?;
        if !self.related.activity_exists(tenant_id, activity_id).await? {
            return Err(RepositoryError::RelatedEntityMissing(format!(
                "activity {activity_id} not found"
            )));
        }
        Ok(())
    }

    fn check_interval(&self, interval: Interval) -> Result<(), RepositoryError> {
        let Some(end) = interval.end else {
            return Ok(());
        };
        if end <= interval.start {
            return Err(RepositoryError::InvalidInterval(
                "You must end the time entry after it started".into(),
            ));
        }
        if end > self.clock.now() {
            return Err(RepositoryError::InvalidInterval(
                "You cannot end a time entry in the future".into(),
            ));
        }
        Ok(())
    }
}

fn log_rejection(
    candidate: Candidate<'_>,
    context: &EventContext,
    result: Result<(), RepositoryError>,
) -> Result<(), RepositoryError> {
    result.inspect_err(|error| {
        tracing::warn!(
            id = ?candidate.id,
            owner_id = candidate.owner_id,
            action = %context.action,
            %error,
            "time entry rejected"
        );
    })
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, RepositoryError> {
    value
        .filter(|value| !value.is_empty())
        .ok_or_else(|| RepositoryError::RelatedEntityMissing(format!("{field} is required")))
}

#[async_trait]
impl<S: DocumentStore> Validator<TimeEntry> for TimeEntryValidator<S> {
    async fn on_create(
        &self,
        draft: &mut NewTimeEntry,
        context: &EventContext,
    ) -> Result<(), RepositoryError> {
        let now = self.clock.now();
        draft.start_date.get_or_insert(now);
        let candidate = Candidate::from_draft(draft, &context.actor_id, now);
        self.validate(candidate, context).await
    }

    async fn on_update(
        &self,
        entity: &TimeEntry,
        context: &EventContext,
    ) -> Result<(), RepositoryError> {
        if entity.deleted.is_some() {
            return Ok(());
        }
        self.validate(Candidate::from(entity), context).await
    }
}
