// Interval arithmetic over possibly open-ended time ranges.
//
// Purpose
// - One definition of overlap, intersection and clipping used by both the store
//   adapters (collision queries) and the worked time summary (bucketing).
//
// Rules
// - Overlap is half-open: `[a, b)` and `[b, c)` touch but do not overlap.
// - An open interval (no end) ends at the supplied "now".

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl Interval {
    pub fn new(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    pub fn closed(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    pub fn end_or(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.end.unwrap_or(now)
    }

    pub fn overlaps(&self, other: &Interval, now: DateTime<Utc>) -> bool {
        self.start < other.end_or(now) && other.start < self.end_or(now)
    }

    /// Inclusive test against a closed range, so entries touching a bucket edge are kept
    /// (they contribute zero once clipped).
    pub fn intersects(&self, from: DateTime<Utc>, to: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.start <= to && self.end_or(now) >= from
    }

    /// Clamps both ends into `[from, to]`. The result is always closed.
    pub fn clip(&self, from: DateTime<Utc>, to: DateTime<Utc>, now: DateTime<Utc>) -> Interval {
        let start = self.start.clamp(from, to);
        let end = self.end_or(now).clamp(from, to);
        Interval::closed(start, end.max(start))
    }

    pub fn duration(&self, now: DateTime<Utc>) -> Duration {
        let elapsed = self.end_or(now) - self.start;
        if elapsed < Duration::zero() {
            Duration::zero()
        } else {
            elapsed
        }
    }
}
