use crate::modules::time_entries::core::time_entry::TimeEntry;
use crate::modules::time_entries::core::worked_time::{WorkedTime, summary};
use crate::tests::fixtures::time_entry::at;
use chrono::{TimeZone, Utc};
use std::fs;

fn fixture_entries() -> Vec<TimeEntry> {
    let json_str = fs::read_to_string("./src/tests/fixtures/json/entries.json").unwrap();
    serde_json::from_str(&json_str).unwrap()
}

#[tokio::test]
async fn summarises_fixture_entries_per_bucket() {
    let entries = fixture_entries();
    let intervals: Vec<_> = entries.iter().map(TimeEntry::interval).collect();

    let same_day = summary(&intervals, Some(0), at(15, 0));
    let two_hours = WorkedTime { hours: 2, minutes: 0, seconds: 0.0 };
    assert_eq!(same_day.day, two_hours);
    assert_eq!(same_day.week, two_hours);
    assert_eq!(same_day.month, two_hours);

    let next_day = summary(&intervals, Some(0), Utc.with_ymd_and_hms(2024, 3, 2, 8, 0, 0).unwrap());
    assert_eq!(next_day.day, WorkedTime { hours: 0, minutes: 0, seconds: 0.0 });
    assert_eq!(next_day.week, two_hours);
    assert_eq!(next_day.month, two_hours);
}

#[tokio::test]
async fn serialises_the_summary_for_clients() {
    let intervals: Vec<_> = fixture_entries().iter().map(TimeEntry::interval).collect();
    let json = serde_json::to_value(summary(&intervals, None, at(15, 0))).unwrap();
    assert_eq!(json["day"]["hours"], 2);
    assert_eq!(json["day"]["minutes"], 0);
    assert_eq!(json["day"]["seconds"], 0.0);
    assert!(json.get("week").is_some());
    assert!(json.get("month").is_some());
}
