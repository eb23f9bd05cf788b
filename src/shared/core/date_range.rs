// Closed date ranges used to filter listings, shifted into the caller's timezone.
//
// Offsets follow the browser convention: minutes to add to local time to get UTC
// (300 means UTC-5). Ranges are computed in UTC and then shifted by the offset.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>, offset_minutes: i32) -> Self {
        let shift = Duration::minutes(offset_minutes.into());
        Self::new(start + shift, end + shift)
    }

    /// First instant of the month to its last microsecond, shifted by the offset.
    /// `None` when `month` is not a calendar month.
    pub fn of_month(year: i32, month: u32, offset_minutes: i32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        let start = Utc.from_utc_datetime(&first.and_hms_opt(0, 0, 0)?);
        let end = Utc.from_utc_datetime(&next.and_hms_opt(0, 0, 0)?) - Duration::microseconds(1);
        Some(Self::between(start, end, offset_minutes))
    }

    pub fn of_current_month(now: DateTime<Utc>, offset_minutes: i32) -> Option<Self> {
        Self::of_month(now.year(), now.month(), offset_minutes)
    }
}

#[cfg(test)]
mod date_range_tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn it_should_span_the_whole_month_shifted_by_the_offset() {
        let range = DateRange::of_month(2024, 2, 300).unwrap();
        assert_eq!(range.start, Utc.with_ymd_and_hms(2024, 2, 1, 5, 0, 0).unwrap());
        assert_eq!(
            range.end,
            Utc.with_ymd_and_hms(2024, 3, 1, 4, 59, 59).unwrap() + Duration::microseconds(999_999)
        );
    }

    #[rstest]
    fn it_should_roll_december_into_the_next_year() {
        let range = DateRange::of_month(2023, 12, 0).unwrap();
        assert_eq!(range.start, Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap());
        assert!(range.end < Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[rstest]
    #[case(0)]
    #[case(13)]
    fn it_should_reject_invalid_months(#[case] month: u32) {
        assert_eq!(DateRange::of_month(2024, month, 0), None);
    }

    #[rstest]
    fn it_should_shift_explicit_ranges() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
        let range = DateRange::between(start, end, -60);
        assert_eq!(range.start, Utc.with_ymd_and_hms(2024, 2, 29, 23, 0, 0).unwrap());
        assert_eq!(range.end, Utc.with_ymd_and_hms(2024, 3, 1, 23, 0, 0).unwrap());
    }
}
