// Time entry documents as stored in the `time_entry` container.
//
// Purpose
// - Typed shape of a stored entry, of a create request and of a partial update.
//
// Rules
// - `end_date` absent means running.
// - `deleted` absent means visible. Once set it is never cleared.
// - Timestamps are persisted in the fixed-width UTC form from `shared::core::time`.

use crate::shared::core::interval::Interval;
use crate::shared::core::time::iso8601;
use crate::shared::infrastructure::repository::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: String,
    pub tenant_id: String,
    pub owner_id: String,
    pub project_id: String,
    pub activity_id: String,
    #[serde(with = "iso8601")]
    pub start_date: DateTime<Utc>,
    #[serde(default, with = "iso8601::option", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub timezone_offset: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<String>,
}

impl TimeEntry {
    pub fn is_running(&self) -> bool {
        self.end_date.is_none()
    }

    pub fn interval(&self) -> Interval {
        Interval::new(self.start_date, self.end_date)
    }
}

/// Create request. The store assigns the id, so a client supplied one is never written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTimeEntry {
    #[serde(default, skip_serializing)]
    pub id: Option<String>,
    pub owner_id: Option<String>,
    pub project_id: Option<String>,
    pub activity_id: Option<String>,
    #[serde(default, with = "iso8601::option")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, with = "iso8601::option", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub timezone_offset: Option<i32>,
}

/// Field-by-field partial update. `None` leaves a field untouched; `end_date: Some(None)`
/// reopens the entry. Empty strings are persisted as null.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeEntryPatch {
    pub project_id: Option<String>,
    pub activity_id: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<Option<DateTime<Utc>>>,
    pub description: Option<String>,
    pub technologies: Option<Vec<String>>,
    pub uri: Option<String>,
    pub timezone_offset: Option<i32>,
}

impl TimeEntryPatch {
    pub fn stop_at(end_date: DateTime<Utc>) -> Self {
        Self {
            end_date: Some(Some(end_date)),
            ..Self::default()
        }
    }

    pub fn restart() -> Self {
        Self {
            end_date: Some(None),
            ..Self::default()
        }
    }
}

impl Entity for TimeEntry {
    type Draft = NewTimeEntry;
    type Patch = TimeEntryPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn deleted(&self) -> Option<&str> {
        self.deleted.as_deref()
    }

    fn mark_deleted(&mut self, sentinel: String) {
        self.deleted = Some(sentinel);
    }

    fn apply(&mut self, patch: TimeEntryPatch) {
        if let Some(project_id) = patch.project_id {
            self.project_id = project_id;
        }
        if let Some(activity_id) = patch.activity_id {
            self.activity_id = activity_id;
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = end_date;
        }
        if let Some(description) = patch.description {
            self.description = Some(description).filter(|value| !value.is_empty());
        }
        if let Some(technologies) = patch.technologies {
            self.technologies = technologies;
        }
        if let Some(uri) = patch.uri {
            self.uri = Some(uri).filter(|value| !value.is_empty());
        }
        if let Some(timezone_offset) = patch.timezone_offset {
            self.timezone_offset = Some(timezone_offset);
        }
    }
}

#[cfg(test)]
mod time_entry_tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};
    use serde_json::json;

    #[fixture]
    fn stored() -> serde_json::Value {
        json!({
            "id": "te-1",
            "tenant_id": "tenant-1",
            "owner_id": "user-1",
            "project_id": "project-1",
            "activity_id": "activity-1",
            "start_date": "2024-03-01T04:00:00-05:00",
            "end_date": null,
            "description": "Pairing",
            "technologies": ["rust"],
            "_last_event_ctx": {"user_id": "user-1"}
        })
    }

    #[rstest]
    fn it_should_read_a_running_entry(stored: serde_json::Value) {
        let entry: TimeEntry = serde_json::from_value(stored).expect("deserialize failed");
        assert!(entry.is_running());
        assert_eq!(entry.start_date, Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap());
        assert_eq!(entry.deleted, None);
        assert_eq!(entry.uri, None);
    }

    #[rstest]
    fn it_should_omit_the_end_and_sentinel_while_unset(stored: serde_json::Value) {
        let entry: TimeEntry = serde_json::from_value(stored).unwrap();
        let written = serde_json::to_value(&entry).unwrap();
        assert!(written.get("end_date").is_none());
        assert!(written.get("deleted").is_none());
        assert_eq!(written["start_date"], "2024-03-01T09:00:00.000000Z");
    }

    #[rstest]
    fn it_should_never_write_a_client_id() {
        let draft = NewTimeEntry {
            id: Some("chosen-by-client".into()),
            ..NewTimeEntry::default()
        };
        let written = serde_json::to_value(&draft).unwrap();
        assert!(written.get("id").is_none());
    }

    #[rstest]
    fn it_should_apply_only_the_patched_fields(stored: serde_json::Value) {
        let mut entry: TimeEntry = serde_json::from_value(stored).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        entry.apply(TimeEntryPatch {
            description: Some(String::new()),
            ..TimeEntryPatch::stop_at(end)
        });
        assert_eq!(entry.end_date, Some(end));
        assert_eq!(entry.description, None);
        assert_eq!(entry.technologies, vec!["rust"]);

        entry.apply(TimeEntryPatch::restart());
        assert!(entry.is_running());
        assert_eq!(entry.interval(), Interval::new(entry.start_date, None));
    }
}
