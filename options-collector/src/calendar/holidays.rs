//! US equity-market holiday table.
//!
//! Rule-based, recomputed per year:
//! - New Year's Day (Jan 1), Juneteenth (Jun 19), Independence Day (Jul 4),
//!   Christmas (Dec 25)
//! - MLK Day and Presidents' Day (3rd Monday of Jan / Feb)
//! - Memorial Day (last Monday of May), Labor Day (1st Monday of Sep)
//! - Thanksgiving (4th Thursday of Nov)
//! - Good Friday, pinned to a fixed reference date (no Easter computation)
//!
//! A holiday on Saturday is observed the Friday before, on Sunday the
//! Monday after.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Fixed (month, day) used for Good Friday every year.
pub const GOOD_FRIDAY_REFERENCE: (u32, u32) = (4, 18);

/// A market holiday and the weekday it is observed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Holiday {
    pub name: &'static str,
    /// Nominal calendar date.
    pub date: NaiveDate,
    /// Date the market is actually closed.
    pub observed: NaiveDate,
}

impl Holiday {
    fn new(name: &'static str, date: NaiveDate) -> Self {
        Self {
            name,
            date,
            observed: observed_date(date),
        }
    }
}

/// Shift a weekend holiday onto the adjacent weekday.
pub fn observed_date(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date - Duration::days(1),
        Weekday::Sun => date + Duration::days(1),
        _ => date,
    }
}

/// All holidays for a year, in calendar order.
pub fn holidays(year: i32) -> Vec<Holiday> {
    let (gf_month, gf_day) = GOOD_FRIDAY_REFERENCE;

    let rules: [(&'static str, Option<NaiveDate>); 10] = [
        ("New Year's Day", NaiveDate::from_ymd_opt(year, 1, 1)),
        (
            "Martin Luther King Jr. Day",
            NaiveDate::from_weekday_of_month_opt(year, 1, Weekday::Mon, 3),
        ),
        (
            "Presidents' Day",
            NaiveDate::from_weekday_of_month_opt(year, 2, Weekday::Mon, 3),
        ),
        ("Good Friday", NaiveDate::from_ymd_opt(year, gf_month, gf_day)),
        ("Memorial Day", last_weekday_of_month(year, 5, Weekday::Mon)),
        ("Juneteenth", NaiveDate::from_ymd_opt(year, 6, 19)),
        ("Independence Day", NaiveDate::from_ymd_opt(year, 7, 4)),
        (
            "Labor Day",
            NaiveDate::from_weekday_of_month_opt(year, 9, Weekday::Mon, 1),
        ),
        (
            "Thanksgiving Day",
            NaiveDate::from_weekday_of_month_opt(year, 11, Weekday::Thu, 4),
        ),
        ("Christmas Day", NaiveDate::from_ymd_opt(year, 12, 25)),
    ];

    rules
        .into_iter()
        .filter_map(|(name, date)| date.map(|d| Holiday::new(name, d)))
        .collect()
}

/// The holiday observed on `date`, if any.
///
/// Only the holiday set of `date`'s own year is consulted, so a New Year's
/// Day falling on Saturday does not close the preceding December 31.
pub fn observed_holiday(date: NaiveDate) -> Option<Holiday> {
    holidays(date.year())
        .into_iter()
        .find(|h| h.observed == date)
}

fn last_weekday_of_month(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let mut day = NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()?;
    while day.weekday() != weekday {
        day = day.pred_opt()?;
    }
    Some(day)
}
