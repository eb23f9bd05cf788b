// Time entry repository.
//
// Purpose
// - The generic repository specialised for time entries: validated writes, the running
//   entry lifecycle (stop, restart) and the queries the time entry endpoints need.
//
// Responsibilities
// - Owner defaults to the acting user on create.
// - Collision checks, running lookups and the "previous entry" lookup.
// - Optionally clamp the previous entry instead of rejecting a new one that overlaps it.
//   The clamp is written only for a well formed entry and is put back when the write
//   it was made for fails.
// - Worked time summary for the current day, week and month.
//
// Boundaries
// - Validation and the write are separate store calls, so two concurrent writers can both
//   pass the collision check. Only the unique key on `(owner_id, end_date, deleted)` is
//   enforced by the store, which rules out two running entries for one owner.

use crate::config::Settings;
use crate::modules::time_entries::adapters::outbound::time_entry_query_builder::{
    END_FIELD, START_FIELD, TimeEntryQueryBuilder,
};
use crate::modules::time_entries::adapters::outbound::time_entry_validator::{
    Candidate, TimeEntryValidator,
};
use crate::modules::time_entries::core::ports::RelatedEntities;
use crate::modules::time_entries::core::time_entry::{NewTimeEntry, TimeEntry, TimeEntryPatch};
use crate::modules::time_entries::core::worked_time::{
    self, Bucket, DEFAULT_TIMEZONE_OFFSET, WorkedTimeSummary,
};
use crate::shared::core::date_range::DateRange;
use crate::shared::core::event_context::EventContext;
use crate::shared::core::time::Clock;
use crate::shared::infrastructure::document_store::{DocumentStore, Order};
use crate::shared::infrastructure::query_builder::QueryBuilder;
use crate::shared::infrastructure::repository::{
    Entity, FindAllOptions, Repository, RepositoryError, Validator,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;

/// What to do when a new start overlaps the owner's previous entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverlapPolicy {
    #[default]
    Reject,
    /// Clamp the previous entry's end to the new start before the overlap check.
    AdjustPrevious,
}

pub struct TimeEntryRepository<S: DocumentStore + 'static> {
    repository: Repository<TimeEntry, S>,
    validator: Arc<TimeEntryValidator<S>>,
    clock: Arc<dyn Clock>,
    latest_entries_limit: i64,
}

impl<S: DocumentStore + 'static> TimeEntryRepository<S> {
    pub fn new(
        store: Arc<S>,
        related: Arc<dyn RelatedEntities>,
        clock: Arc<dyn Clock>,
        settings: &Settings,
    ) -> Self {
        let validator = Arc::new(TimeEntryValidator::new(store.clone(), related, clock.clone()));
        let hooks: Arc<dyn Validator<TimeEntry>> = validator.clone();
        Self {
            repository: Repository::new(store, hooks, settings)
                .with_default_order(START_FIELD, Order::Desc),
            validator,
            clock,
            latest_entries_limit: settings.latest_entries_limit,
        }
    }

    pub async fn create(
        &self,
        draft: NewTimeEntry,
        context: &EventContext,
        policy: OverlapPolicy,
    ) -> Result<TimeEntry, RepositoryError> {
        let mut draft = draft;
        let owner_id = draft
            .owner_id
            .get_or_insert_with(|| context.actor_id.clone())
            .clone();
        if policy == OverlapPolicy::Reject {
            return self.repository.create(draft, context).await;
        }

        let now = self.clock.now();
        let start_date = *draft.start_date.get_or_insert(now);
        let candidate = Candidate::from_draft(&draft, &context.actor_id, now);
        self.validator.validate_well_formed(candidate, context).await?;

        let adjusted = self.clamp_previous(&owner_id, start_date, None, context).await?;
        let created = self.repository.create(draft, context).await;
        if created.is_err() {
            self.restore_previous(adjusted, context).await;
        }
        created
    }

    pub async fn find(
        &self,
        id: &str,
        context: &EventContext,
        visible_only: bool,
    ) -> Result<TimeEntry, RepositoryError> {
        self.repository.find(id, context, visible_only).await
    }

    pub async fn find_all(
        &self,
        context: &EventContext,
        options: FindAllOptions,
    ) -> Result<Vec<TimeEntry>, RepositoryError> {
        self.repository.find_all(context, options).await
    }

    pub async fn count(
        &self,
        context: &EventContext,
        options: FindAllOptions,
    ) -> Result<u64, RepositoryError> {
        self.repository.count(context, options).await
    }

    pub async fn find_all_entries(
        &self,
        context: &EventContext,
        owner_id: &str,
        date_range: Option<DateRange>,
        max_count: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<TimeEntry>, RepositoryError> {
        let options = FindAllOptions {
            date_range,
            max_count,
            offset,
            ..FindAllOptions::default()
        }
        .with_condition("owner_id", owner_id);
        self.repository.find_all(context, options).await
    }

    /// Most recently started entries of the owner, regardless of date.
    pub async fn get_latest_entries(
        &self,
        context: &EventContext,
        owner_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<TimeEntry>, RepositoryError> {
        let options = FindAllOptions {
            max_count: Some(limit.unwrap_or(self.latest_entries_limit)),
            order_by: Some((START_FIELD.to_string(), Order::Desc)),
            ..FindAllOptions::default()
        }
        .with_condition("owner_id", owner_id);
        self.repository.find_all(context, options).await
    }

    pub async fn partial_update(
        &self,
        id: &str,
        patch: TimeEntryPatch,
        context: &EventContext,
    ) -> Result<TimeEntry, RepositoryError> {
        self.repository.partial_update(id, patch, context).await
    }

    pub async fn update(
        &self,
        id: &str,
        patch: TimeEntryPatch,
        context: &EventContext,
        policy: OverlapPolicy,
    ) -> Result<TimeEntry, RepositoryError> {
        if policy == OverlapPolicy::Reject {
            return self.repository.partial_update(id, patch, context).await;
        }

        let mut entry = self.repository.find(id, context, true).await?;
        entry.apply(patch);
        self.validator
            .validate_well_formed(Candidate::from(&entry), context)
            .await?;

        let adjusted = self
            .clamp_previous(&entry.owner_id, entry.start_date, Some(id), context)
            .await?;
        let updated = self.repository.update(entry, context).await;
        if updated.is_err() {
            self.restore_previous(adjusted, context).await;
        }
        updated
    }

    pub async fn stop(
        &self,
        id: &str,
        context: &EventContext,
    ) -> Result<TimeEntry, RepositoryError> {
        let entry = self.repository.find(id, context, true).await?;
        if !entry.is_running() {
            return Err(RepositoryError::UnprocessableState(
                "The specified time entry is already stopped".into(),
            ));
        }
        let context = context.for_action("update", "Stop time entry");
        self.repository
            .partial_update(id, TimeEntryPatch::stop_at(self.clock.now()), &context)
            .await
    }

    pub async fn restart(
        &self,
        id: &str,
        context: &EventContext,
    ) -> Result<TimeEntry, RepositoryError> {
        let entry = self.repository.find(id, context, true).await?;
        if entry.is_running() {
            return Err(RepositoryError::UnprocessableState(
                "The specified time entry is already running".into(),
            ));
        }
        let context = context.for_action("update", "Restart time entry");
        self.repository
            .partial_update(id, TimeEntryPatch::restart(), &context)
            .await
    }

    pub async fn delete(
        &self,
        id: &str,
        context: &EventContext,
    ) -> Result<TimeEntry, RepositoryError> {
        self.repository.delete(id, context).await
    }

    pub async fn delete_permanently(
        &self,
        id: &str,
        context: &EventContext,
    ) -> Result<(), RepositoryError> {
        self.repository.delete_permanently(id, context).await
    }

    pub async fn find_interception_with_date_range(
        &self,
        start_date: DateTime<Utc>,
        end_date: Option<DateTime<Utc>>,
        owner_id: &str,
        tenant_id: &str,
        ignore_id: Option<&str>,
    ) -> Result<bool, RepositoryError> {
        self.validator
            .find_interception_with_date_range(start_date, end_date, owner_id, tenant_id, ignore_id)
            .await
    }

    /// The owner's visible running entry. An empty result is `NoRunningEntry`.
    pub async fn find_running(
        &self,
        tenant_id: &str,
        owner_id: &str,
    ) -> Result<TimeEntry, RepositoryError> {
        let query = QueryBuilder::new()
            .is_running()
            .where_equals([("owner_id", json!(owner_id)), ("tenant_id", json!(tenant_id))])
            .where_visible_only(true)
            .limit(Some(1))
            .build();
        self.repository
            .execute(tenant_id, &query)
            .await?
            .into_iter()
            .next()
            .ok_or(RepositoryError::NoRunningEntry)
    }

    pub async fn validate(
        &self,
        entry: &TimeEntry,
        context: &EventContext,
    ) -> Result<(), RepositoryError> {
        self.validator.validate(Candidate::from(entry), context).await
    }

    /// Latest finished entry of the owner by `end_date`, skipping `id_to_exclude`.
    pub async fn get_last_entry(
        &self,
        owner_id: &str,
        id_to_exclude: Option<&str>,
        context: &EventContext,
    ) -> Result<Option<TimeEntry>, RepositoryError> {
        let query = QueryBuilder::new()
            .where_equals([("owner_id", json!(owner_id))])
            .where_present(END_FIELD)
            .ignore_id(id_to_exclude)
            .where_visible_only(true)
            .order_by(END_FIELD, Order::Desc)
            .limit(Some(1))
            .build();
        Ok(self
            .repository
            .execute(&context.tenant_id, &query)
            .await?
            .into_iter()
            .next())
    }

    /// Clamps the previous entry's end down to `new_start_date` when it ends later.
    /// Returns the adjusted entry, or `None` when nothing had to change.
    pub async fn update_last_entry(
        &self,
        owner_id: &str,
        new_start_date: DateTime<Utc>,
        id_running_entry: Option<&str>,
        context: &EventContext,
    ) -> Result<Option<TimeEntry>, RepositoryError> {
        let adjusted = self
            .clamp_previous(owner_id, new_start_date, id_running_entry, context)
            .await?;
        Ok(adjusted.map(|(_, clamped)| clamped))
    }

    /// Worked time of the owner for today, this week and this month, until now.
    pub async fn get_worked_time(
        &self,
        context: &EventContext,
        owner_id: &str,
        offset_minutes: Option<i32>,
    ) -> Result<WorkedTimeSummary, RepositoryError> {
        let now = self.clock.now();
        let offset = offset_minutes.unwrap_or(DEFAULT_TIMEZONE_OFFSET);
        let since = Bucket::Month
            .start(now, offset)
            .min(Bucket::Week.start(now, offset));
        let query = QueryBuilder::new()
            .where_equals([("owner_id", json!(owner_id))])
            .worked_since(since)
            .where_visible_only(true)
            .order_by(START_FIELD, Order::Desc)
            .build();
        let entries = self.repository.execute(&context.tenant_id, &query).await?;
        let intervals: Vec<_> = entries.iter().map(TimeEntry::interval).collect();
        Ok(worked_time::summary(&intervals, Some(offset), now))
    }

    /// Writes the clamp and returns the entry as it was before and after it.
    async fn clamp_previous(
        &self,
        owner_id: &str,
        new_start_date: DateTime<Utc>,
        id_to_exclude: Option<&str>,
        context: &EventContext,
    ) -> Result<Option<(TimeEntry, TimeEntry)>, RepositoryError> {
        let Some(previous) = self.get_last_entry(owner_id, id_to_exclude, context).await? else {
            return Ok(None);
        };
        if previous.end_date.is_none_or(|end_date| end_date <= new_start_date) {
            return Ok(None);
        }
        tracing::info!(id = %previous.id, %new_start_date, "clamping previous time entry");
        let clamped = TimeEntry {
            end_date: Some(new_start_date),
            ..previous.clone()
        };
        let context = context.for_action("update", "Adjust previous time entry");
        let clamped = self.repository.update(clamped, &context).await?;
        Ok(Some((previous, clamped)))
    }

    /// Puts a clamped entry back after the write it was made for failed.
    async fn restore_previous(
        &self,
        adjusted: Option<(TimeEntry, TimeEntry)>,
        context: &EventContext,
    ) {
        let Some((previous, _)) = adjusted else {
            return;
        };
        let context = context.for_action("update", "Restore previous time entry");
        let id = previous.id.clone();
        if let Err(error) = self.repository.update(previous, &context).await {
            tracing::warn!(%id, %error, "previous time entry left clamped");
        }
    }
}
