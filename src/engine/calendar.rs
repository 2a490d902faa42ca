//! Business-day arithmetic and the engine's time source.
//!
//! A business day is Monday to Friday. Public holidays are not modelled.

use chrono::{Datelike, Days, Duration, Local, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Source of "today" for default windows.
///
/// Injected so that default periods are deterministic under test.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Reads the local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always returns the same day.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// An inclusive date interval.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The calendar month containing `date`.
    pub fn month_of(date: NaiveDate) -> Self {
        Self::new(first_day_of_month(date), last_day_of_month(date))
    }

    /// From the first day of `date`'s month to the last day of the following month.
    pub fn month_and_next(date: NaiveDate) -> Self {
        let next_month = last_day_of_month(date) + Duration::days(1);
        Self::new(first_day_of_month(date), last_day_of_month(next_month))
    }
}

pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Business days in `[start, end]`, in order. Empty if `end < start`.
pub fn business_days(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start
        .iter_days()
        .take_while(move |d| *d <= end)
        .filter(|d| is_business_day(*d))
}

/// Number of business days in `[start, end]`.
pub fn count_business_days(start: NaiveDate, end: NaiveDate) -> u32 {
    business_days(start, end).count() as u32
}

/// Last day of a span of `days` business days beginning on `start`.
///
/// `start` counts as the first day when it is a business day, so one day
/// from a Monday ends that same Monday and three days end on Wednesday.
/// A weekend start rolls forward to the following Monday before counting.
/// Returns `None` when the span runs past the last representable date.
pub fn add_business_days(start: NaiveDate, days: u32) -> Option<NaiveDate> {
    if days == 0 {
        return Some(start);
    }

    let mut end = next_business_day(start)?;
    let remaining = days - 1;

    // Whole weeks keep the weekday, so they can be added in one step.
    end = end.checked_add_days(Days::new(u64::from(remaining / 5) * 7))?;
    for _ in 0..remaining % 5 {
        end = next_business_day(end.succ_opt()?)?;
    }

    Some(end)
}

/// `date` itself, or the first business day after it.
fn next_business_day(mut date: NaiveDate) -> Option<NaiveDate> {
    while !is_business_day(date) {
        date = date.succ_opt()?;
    }
    Some(date)
}

pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let into_next = first_day_of_month(date) + Duration::days(32);
    first_day_of_month(into_next) - Duration::days(1)
}

/// The first Monday strictly after `date`.
pub fn next_monday(date: NaiveDate) -> NaiveDate {
    let ahead = 7 - i64::from(date.weekday().num_days_from_monday());
    date + Duration::days(ahead)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn weekends_are_not_business_days() {
        assert!(is_business_day(date(2025, 1, 3))); // Friday
        assert!(!is_business_day(date(2025, 1, 4)));
        assert!(!is_business_day(date(2025, 1, 5)));
        assert!(is_business_day(date(2025, 1, 6)));
    }

    #[test]
    fn counts_business_days_inclusively() {
        assert_eq!(count_business_days(date(2025, 1, 6), date(2025, 1, 10)), 5);
        assert_eq!(count_business_days(date(2025, 1, 6), date(2025, 1, 12)), 5);
        assert_eq!(count_business_days(date(2025, 1, 1), date(2025, 1, 31)), 23);
        assert_eq!(count_business_days(date(2025, 1, 4), date(2025, 1, 5)), 0);
        assert_eq!(count_business_days(date(2025, 1, 10), date(2025, 1, 6)), 0);
    }

    #[test]
    fn adds_business_days_from_monday() {
        let monday = date(2025, 1, 6);
        assert_eq!(add_business_days(monday, 1), Some(monday));
        assert_eq!(add_business_days(monday, 3), Some(date(2025, 1, 8)));
        assert_eq!(add_business_days(monday, 5), Some(date(2025, 1, 10)));
        assert_eq!(add_business_days(monday, 6), Some(date(2025, 1, 13)));
        assert_eq!(add_business_days(monday, 23), Some(date(2025, 2, 5)));
    }

    #[test]
    fn adding_business_days_skips_weekends() {
        let thursday = date(2025, 1, 9);
        assert_eq!(add_business_days(thursday, 3), Some(date(2025, 1, 13)));
        assert_eq!(add_business_days(thursday, 8), Some(date(2025, 1, 20)));

        let saturday = date(2025, 1, 11);
        assert_eq!(add_business_days(saturday, 0), Some(saturday));
        assert_eq!(add_business_days(saturday, 1), Some(date(2025, 1, 13)));
        assert_eq!(add_business_days(saturday, 2), Some(date(2025, 1, 14)));
    }

    #[test]
    fn adding_business_days_past_the_calendar_returns_none() {
        assert_eq!(add_business_days(date(2025, 1, 6), u32::MAX), None);
        assert_eq!(add_business_days(NaiveDate::MAX, 2), None);
    }

    #[test]
    fn month_boundaries() {
        assert_eq!(first_day_of_month(date(2024, 2, 17)), date(2024, 2, 1));
        assert_eq!(last_day_of_month(date(2024, 2, 17)), date(2024, 2, 29));
        assert_eq!(last_day_of_month(date(2025, 12, 31)), date(2025, 12, 31));
        assert_eq!(last_day_of_month(date(2025, 1, 31)), date(2025, 1, 31));
    }

    #[test]
    fn month_and_next_spans_two_months() {
        let range = DateRange::month_and_next(date(2025, 12, 15));
        assert_eq!(range.start, date(2025, 12, 1));
        assert_eq!(range.end, date(2026, 1, 31));
    }

    #[test]
    fn next_monday_is_strictly_after() {
        assert_eq!(next_monday(date(2025, 1, 8)), date(2025, 1, 13));
        assert_eq!(next_monday(date(2025, 1, 6)), date(2025, 1, 13));
        assert_eq!(next_monday(date(2025, 1, 12)), date(2025, 1, 13));
    }
}
