//! Proleptic Gregorian calendar arithmetic relative to 1970-01-01.

use feedloom_types::{ExpandedTime, Timestamp};

const SECONDS_PER_DAY: i64 = 86_400;

/// Days before the first of each month in a common year; index 12 is the
/// whole year.
const DAYS_BEFORE_MONTH: [i64; 13] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334, 365];

/// Gregorian leap year test.
#[inline]
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Leap years in `1..=year`, extended to zero and negative years.
#[inline]
fn leap_years_through(year: i64) -> i64 {
    year.div_euclid(4) - year.div_euclid(100) + year.div_euclid(400)
}

/// Days from 1970-01-01 to January 1st of `year`.
pub(crate) fn days_before_year(year: i32) -> i64 {
    let year = i64::from(year);
    365 * (year - 1970) + leap_years_through(year - 1) - leap_years_through(1969)
}

/// Days from January 1st to the first of `month` (zero-based).
///
/// Months past December count as the whole year.
pub(crate) fn days_before_month(year: i32, month: u32) -> i64 {
    let month = month.min(12) as usize;
    let leap_day = i64::from(month >= 2 && is_leap_year(year));
    DAYS_BEFORE_MONTH[month] + leap_day
}

/// Seconds since the epoch for wall-clock `t` in a zone `offset_seconds`
/// east of UTC. Negative results mean the instant predates the epoch.
pub(crate) fn epoch_seconds(t: &ExpandedTime, offset_seconds: i32) -> i64 {
    let days =
        days_before_year(t.year) + days_before_month(t.year, t.month) + i64::from(t.day) - 1;
    let time = i64::from(t.hour) * 3600 + i64::from(t.minute) * 60 + i64::from(t.second);
    days * SECONDS_PER_DAY + time - i64::from(offset_seconds)
}

pub(crate) fn timestamp(expanded: ExpandedTime, offset_seconds: i32) -> Timestamp {
    let seconds = epoch_seconds(&expanded, offset_seconds);
    Timestamp {
        expanded,
        offset_seconds,
        unix_seconds: u64::try_from(seconds).unwrap_or(0),
    }
}
