//! `YYYY-MM-DDTHH:MM:SS[.fraction]ZONE`

use feedloom_types::{DateErrorKind, DateGrammar, DateTimeError, ExpandedTime, Timestamp};

use super::cursor::Cursor;
use super::zone;

pub(crate) fn parse(input: &str) -> Result<Timestamp, DateTimeError> {
    let mut c = Cursor::new(input, DateGrammar::Rfc3339);

    let Some(year) = c.number_until(b"-", "year") else {
        return Err(c.abort());
    };
    let Some(month) = c.number_until(b"-", "month") else {
        return Err(c.abort());
    };
    let Some(day) = c.number_until(b"Tt", "day") else {
        return Err(c.abort());
    };
    let Some(hour) = c.number_until(b":", "hour") else {
        return Err(c.abort());
    };
    let Some(minute) = c.number_until(b":", "minute") else {
        return Err(c.abort());
    };
    let second = c.digits("second");

    // Fractional seconds are accepted and dropped.
    if c.peek() == Some(b'.') {
        c.bump();
        c.digits("fraction");
    }

    let zone_start = c.pos();
    let offset = match zone::resolve(c.rest()) {
        Some(offset) => offset,
        None => {
            c.fail_at(DateErrorKind::UnknownZone, zone_start);
            0
        }
    };

    let expanded = ExpandedTime {
        year: i32::try_from(year).unwrap_or(i32::MAX),
        month: month.saturating_sub(1),
        day,
        hour,
        minute,
        second,
    };
    c.finish(expanded, offset)
}
