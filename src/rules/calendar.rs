//! Calendar arithmetic shared by the rule evaluators.
//!
//! Month differences use whole calendar-month buckets and ignore the day of
//! month: an employee whose raise date is the 31st is treated exactly like
//! one whose raise date is the 1st of the same month.

use chrono::{Datelike, Months, NaiveDate};

/// Signed whole calendar months from `from` to `to`, ignoring day-of-month.
///
/// # Examples
///
/// ```
/// use hr_lifecycle_engine::rules::months_between;
/// use chrono::NaiveDate;
///
/// let from = NaiveDate::from_ymd_opt(2021, 3, 31).unwrap();
/// let to = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
/// assert_eq!(months_between(from, to), 36);
/// assert_eq!(months_between(to, from), -36);
/// ```
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    (to.year() - from.year()) * 12 + (to.month() as i32 - from.month() as i32)
}

/// Signed exact number of calendar days from `from` to `to`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    to.signed_duration_since(from).num_days()
}

/// Shifts `date` by `months`, clamping to the last day of the target month.
///
/// Returns `None` if the result is outside chrono's supported range.
pub fn add_months(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let magnitude = Months::new(months.unsigned_abs());
    if months >= 0 {
        date.checked_add_months(magnitude)
    } else {
        date.checked_sub_months(magnitude)
    }
}

/// Shifts `date` by whole `years`, preserving month and day.
///
/// A leap-day date lands on February 28 when the target year is not a leap year.
///
/// # Examples
///
/// ```
/// use hr_lifecycle_engine::rules::add_years;
/// use chrono::NaiveDate;
///
/// let leap_day = NaiveDate::from_ymd_opt(1964, 2, 29).unwrap();
/// assert_eq!(add_years(leap_day, 62), NaiveDate::from_ymd_opt(2026, 2, 28));
/// assert_eq!(add_years(leap_day, 60), NaiveDate::from_ymd_opt(2024, 2, 29));
/// ```
pub fn add_years(date: NaiveDate, years: i32) -> Option<NaiveDate> {
    add_months(date, years.checked_mul(12)?)
}
