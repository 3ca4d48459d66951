//! Date-Time Normalizer
//!
//! Feeds write publication dates in one of two grammars:
//!
//! | Grammar  | Shape                                   | Seen in |
//! |----------|-----------------------------------------|---------|
//! | RFC 822  | `[Day, ] DD Mon YYYY HH:MM[:SS] ZONE`   | RSS     |
//! | RFC 3339 | `YYYY-MM-DDTHH:MM:SS[.fraction]ZONE`    | Atom    |
//!
//! [`parse_date_time`] tries both and converts the result to seconds since
//! the Unix epoch, corrected for the zone. Parsing is pure: no allocation,
//! no I/O.

mod calendar;
mod cursor;
mod rfc3339;
mod rfc822;
mod zone;

pub use calendar::is_leap_year;

use feedloom_types::{DateErrorKind, DateGrammar, DateTimeError, Timestamp};

/// Parses an RFC 822 or RFC 3339 date-time.
///
/// Surrounding whitespace is ignored. RFC 822 is tried first; when both
/// grammars reject the input, the error of the one that scanned further is
/// returned (RFC 822 on a tie).
///
/// Zone-corrected values that fall before the epoch are not errors; their
/// `unix_seconds` is 0.
///
/// # Example
///
/// ```
/// use feedloom_core::datetime::parse_date_time;
///
/// let rss = parse_date_time("Sun, 14 May 2023 19:32:11 GMT").unwrap();
/// let atom = parse_date_time("2023-05-14T19:32:11Z").unwrap();
/// assert_eq!(rss.unix_seconds, atom.unix_seconds);
/// ```
pub fn parse_date_time(input: &str) -> Result<Timestamp, DateTimeError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(DateTimeError {
            grammar: DateGrammar::Rfc822,
            kind: DateErrorKind::Empty,
            position: 0,
            progress: 0,
        });
    }

    let first = match rfc822::parse(input) {
        Ok(ts) => return Ok(ts),
        Err(e) => e,
    };
    match rfc3339::parse(input) {
        Ok(ts) => Ok(ts),
        Err(second) if second.progress > first.progress => Err(second),
        Err(_) => Err(first),
    }
}
