// Shared test fixtures for time entries.
// Compiled into the crate only during tests (see `src/lib.rs`).

use crate::modules::time_entries::core::time_entry::{NewTimeEntry, TimeEntry};
use crate::shared::infrastructure::document_store::DocumentStore;
use crate::shared::infrastructure::document_store::in_memory::InMemoryDocumentStore;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use std::fs;
use std::sync::Arc;

pub const TENANT_ID: &str = "tenant-fixed-0001";
pub const OWNER_ID: &str = "user-fixed-0001";
pub const PROJECT_ID: &str = "project-fixed-0001";
pub const ACTIVITY_ID: &str = "activity-fixed-0001";

/// 2024-03-01 (a Friday) at the given UTC time.
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, hour, minute, 0).unwrap()
}

/// Project and activity containers holding the fixture's references for `tenant_id`.
pub async fn seed_related_entities(
    tenant_id: &str,
) -> (Arc<InMemoryDocumentStore>, Arc<InMemoryDocumentStore>) {
    let project = json!({"id": PROJECT_ID, "name": "Fixture project"});
    let projects = InMemoryDocumentStore::new("project");
    projects
        .create(tenant_id, project.as_object().cloned().unwrap())
        .await
        .unwrap();
    let activity = json!({"id": ACTIVITY_ID, "name": "Development"});
    let activities = InMemoryDocumentStore::new("activity");
    activities
        .create(tenant_id, activity.as_object().cloned().unwrap())
        .await
        .unwrap();
    (Arc::new(projects), Arc::new(activities))
}

pub struct TimeEntryBuilder {
    inner: NewTimeEntry,
}

impl Default for TimeEntryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl TimeEntryBuilder {
    pub fn new() -> Self {
        let json_str = fs::read_to_string("./src/tests/fixtures/json/new_time_entry.json").unwrap();
        let inner: NewTimeEntry = serde_json::from_str(&json_str).unwrap();
        Self { inner }
    }

    pub fn owner_id(mut self, v: impl Into<String>) -> Self {
        self.inner.owner_id = Some(v.into());
        self
    }

    pub fn project_id(mut self, v: Option<String>) -> Self {
        self.inner.project_id = v;
        self
    }

    pub fn activity_id(mut self, v: Option<String>) -> Self {
        self.inner.activity_id = v;
        self
    }

    pub fn start_date(mut self, v: Option<DateTime<Utc>>) -> Self {
        self.inner.start_date = v;
        self
    }

    pub fn end_date(mut self, v: Option<DateTime<Utc>>) -> Self {
        self.inner.end_date = v;
        self
    }

    pub fn between(self, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Self {
        self.start_date(Some(start)).end_date(end)
    }

    pub fn description(mut self, v: impl Into<String>) -> Self {
        self.inner.description = Some(v.into());
        self
    }

    pub fn build(self) -> NewTimeEntry {
        self.inner
    }

    /// The entry as the store would hold it after a create in the fixture tenant.
    pub fn stored(self, id: &str, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> TimeEntry {
        let draft = self.inner;
        TimeEntry {
            id: id.to_string(),
            tenant_id: TENANT_ID.to_string(),
            owner_id: draft.owner_id.unwrap_or_else(|| OWNER_ID.to_string()),
            project_id: draft.project_id.unwrap_or_default(),
            activity_id: draft.activity_id.unwrap_or_default(),
            start_date: start,
            end_date: end,
            description: draft.description,
            technologies: draft.technologies,
            uri: draft.uri,
            timezone_offset: draft.timezone_offset,
            deleted: None,
        }
    }
}

#[cfg(test)]
mod time_entry_builder_tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn default_delegates_to_new_and_parses_json() {
        let built = TimeEntryBuilder::default().build();
        assert_eq!(built.id, None);
        assert_eq!(built.owner_id.as_deref(), Some(OWNER_ID));
        assert_eq!(built.project_id.as_deref(), Some(PROJECT_ID));
        assert_eq!(built.activity_id.as_deref(), Some(ACTIVITY_ID));
        assert_eq!(built.start_date, Some(at(9, 0)));
        assert_eq!(built.end_date, Some(at(10, 0)));
        assert_eq!(built.technologies, vec!["rust", "tokio"]);
        assert_eq!(built.timezone_offset, Some(300));
    }

    #[rstest]
    fn setters_override_fields_and_stored_fills_the_rest() {
        let stored = TimeEntryBuilder::new()
            .owner_id("user-2")
            .description("desc")
            .stored("te-1", at(11, 0), None);
        assert_eq!(stored.id, "te-1");
        assert_eq!(stored.tenant_id, TENANT_ID);
        assert_eq!(stored.owner_id, "user-2");
        assert_eq!(stored.description.as_deref(), Some("desc"));
        assert!(stored.is_running());
    }
}
