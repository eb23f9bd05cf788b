// Worked time summary over already fetched intervals.
//
// Purpose
// - Report how long someone worked today, this week and this month, in their own timezone.
//
// Rules
// - Pure. Nothing here touches storage or reads the clock; "now" is an argument.
// - Offsets are minutes, UTC minus local time (300 is UTC-5). `None` means 300.
// - Each bucket runs from its local start (midnight, Monday midnight, first of the month)
//   up to now. Intervals are clipped to the bucket before they are summed, so one
//   interval can count towards several buckets.
// - Running intervals are counted up to now.

use crate::shared::core::date_range::DateRange;
use crate::shared::core::interval::Interval;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;

pub const DEFAULT_TIMEZONE_OFFSET: i32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Day,
    Week,
    Month,
}

impl Bucket {
    pub fn start(&self, now: DateTime<Utc>, offset_minutes: i32) -> DateTime<Utc> {
        let shift = Duration::minutes(offset_minutes.into());
        let today = (now - shift).date_naive();
        let first_day = match self {
            Bucket::Day => today,
            Bucket::Week => today - Duration::days(today.weekday().num_days_from_monday().into()),
            Bucket::Month => {
                NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today)
            }
        };
        Utc.from_utc_datetime(&first_day.and_time(NaiveTime::MIN)) + shift
    }

    pub fn end(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now
    }

    pub fn range(&self, now: DateTime<Utc>, offset_minutes: i32) -> DateRange {
        DateRange::new(self.start(now, offset_minutes), self.end(now))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WorkedTime {
    pub hours: i64,
    pub minutes: i64,
    pub seconds: f64,
}

impl From<Duration> for WorkedTime {
    fn from(total: Duration) -> Self {
        let whole_seconds = total.num_seconds();
        let fraction = (total - Duration::seconds(whole_seconds))
            .num_microseconds()
            .unwrap_or(0) as f64
            / 1_000_000.0;
        let residual = (whole_seconds % 60) as f64 + fraction;
        Self {
            hours: whole_seconds / 3600,
            minutes: (whole_seconds % 3600) / 60,
            seconds: (residual * 100.0).round() / 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WorkedTimeSummary {
    pub day: WorkedTime,
    pub week: WorkedTime,
    pub month: WorkedTime,
}

pub fn filter_to_range(
    intervals: &[Interval],
    range: &DateRange,
    now: DateTime<Utc>,
) -> Vec<Interval> {
    intervals
        .iter()
        .filter(|interval| interval.intersects(range.start, range.end, now))
        .copied()
        .collect()
}

pub fn clip_to_range(
    intervals: &[Interval],
    range: &DateRange,
    now: DateTime<Utc>,
) -> Vec<Interval> {
    intervals
        .iter()
        .map(|interval| interval.clip(range.start, range.end, now))
        .collect()
}

/// Closes running intervals at `now` for aggregation only.
pub fn stop_running_entries(intervals: &[Interval], now: DateTime<Utc>) -> Vec<Interval> {
    intervals
        .iter()
        .map(|interval| Interval::closed(interval.start, interval.end_or(now)))
        .collect()
}

pub fn total_duration(intervals: &[Interval], now: DateTime<Utc>) -> Duration {
    intervals
        .iter()
        .fold(Duration::zero(), |total, interval| total + interval.duration(now))
}

pub fn sum_duration(intervals: &[Interval], now: DateTime<Utc>) -> WorkedTime {
    total_duration(intervals, now).into()
}

fn worked_in(
    bucket: Bucket,
    intervals: &[Interval],
    offset_minutes: i32,
    now: DateTime<Utc>,
) -> WorkedTime {
    let range = bucket.range(now, offset_minutes);
    let in_range = filter_to_range(intervals, &range, now);
    sum_duration(&clip_to_range(&in_range, &range, now), now)
}

pub fn summary(
    intervals: &[Interval],
    offset_minutes: Option<i32>,
    now: DateTime<Utc>,
) -> WorkedTimeSummary {
    let offset_minutes = offset_minutes.unwrap_or(DEFAULT_TIMEZONE_OFFSET);
    let stopped = stop_running_entries(intervals, now);
    WorkedTimeSummary {
        day: worked_in(Bucket::Day, &stopped, offset_minutes, now),
        week: worked_in(Bucket::Week, &stopped, offset_minutes, now),
        month: worked_in(Bucket::Month, &stopped, offset_minutes, now),
    }
}
