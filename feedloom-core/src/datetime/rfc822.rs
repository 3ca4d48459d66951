//! `[Day, ] DD Mon YYYY HH:MM[:SS] ZONE`

use feedloom_types::{DateErrorKind, DateGrammar, DateTimeError, ExpandedTime, Timestamp};

use super::cursor::Cursor;
use super::zone;

const WEEKDAYS: [&[u8]; 7] = [b"Sun", b"Mon", b"Tue", b"Wed", b"Thu", b"Fri", b"Sat"];
const MONTHS: [&[u8]; 12] = [
    b"Jan", b"Feb", b"Mar", b"Apr", b"May", b"Jun", b"Jul", b"Aug", b"Sep", b"Oct", b"Nov",
    b"Dec",
];

pub(crate) fn parse(input: &str) -> Result<Timestamp, DateTimeError> {
    let mut c = Cursor::new(input, DateGrammar::Rfc822);

    if c.peek().is_some_and(|b| b.is_ascii_alphabetic()) {
        let start = c.pos();
        let Some(weekday) = c.until(b",", "weekday") else {
            return Err(c.abort());
        };
        if !WEEKDAYS.iter().any(|d| *d == weekday) {
            c.fail_at(DateErrorKind::UnknownWeekday, start);
        }
        c.skip_spaces();
    }

    let Some(day) = c.number_until(b" ", "day") else {
        return Err(c.abort());
    };

    let month_start = c.pos();
    let Some(name) = c.until(b" ", "month") else {
        return Err(c.abort());
    };
    let month = match MONTHS.iter().position(|m| *m == name) {
        Some(index) => index as u32,
        None => {
            c.fail_at(DateErrorKind::UnknownMonth, month_start);
            0
        }
    };

    let Some(year) = c.number_until(b" ", "year") else {
        return Err(c.abort());
    };
    let Some(hour) = c.number_until(b":", "hour") else {
        return Err(c.abort());
    };
    let Some(minute) = c.number_until(b": ", "minute") else {
        return Err(c.abort());
    };
    // Minutes ended by `:` means seconds follow.
    let second = if input.as_bytes()[..c.pos()].ends_with(b":") {
        let Some(second) = c.number_until(b" ", "second") else {
            return Err(c.abort());
        };
        second
    } else {
        0
    };

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
        month,
        day,
        hour,
        minute,
        second,
    };
    c.finish(expanded, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_form() {
        let ts = parse("Sun, 14 May 2023 19:32:11 GMT").expect("valid");
        assert_eq!(ts.unix_seconds, 1_684_092_731);
        assert_eq!(
            ts.expanded,
            ExpandedTime {
                year: 2023,
                month: 4,
                day: 14,
                hour: 19,
                minute: 32,
                second: 11,
            }
        );
        assert_eq!(ts.offset_seconds, 0);
    }

    #[test]
    fn without_weekday_or_seconds() {
        let ts = parse("14 May 2023 19:32 +0000").expect("valid");
        assert_eq!(ts.unix_seconds, 1_684_092_731 - 11);
        assert_eq!(ts.expanded.second, 0);
    }

    #[test]
    fn named_zone_shifts_to_utc() {
        let ts = parse("Sun, 14 May 2023 15:32:11 EDT").expect("valid");
        assert_eq!(ts.unix_seconds, 1_684_092_731);
        assert_eq!(ts.expanded.hour, 15);
        assert_eq!(ts.offset_seconds, -4 * 3600);
    }

    #[test]
    fn single_digit_day() {
        let ts = parse("Mon, 1 Jan 2024 00:00:00 +0100").expect("valid");
        assert_eq!(ts.unix_seconds, 1_704_063_600);
    }

    #[test]
    fn unknown_month_keeps_scanning() {
        let err = parse("14 Foo 2023 00:00:00 XXX").unwrap_err();
        assert_eq!(err.kind, DateErrorKind::UnknownMonth);
        assert_eq!(err.position, 3);
        assert_eq!(err.progress, 24);
    }

    #[test]
    fn names_are_case_sensitive() {
        let err = parse("sun, 14 May 2023 19:32:11 GMT").unwrap_err();
        assert_eq!(err.kind, DateErrorKind::UnknownWeekday);
        let err = parse("14 MAY 2023 19:32:11 GMT").unwrap_err();
        assert_eq!(err.kind, DateErrorKind::UnknownMonth);
    }

    #[test]
    fn digits_required() {
        let err = parse("1x May 2023 19:32:11 GMT").unwrap_err();
        assert_eq!(err.kind, DateErrorKind::ExpectedDigit { field: "day" });
        assert_eq!(err.position, 1);
    }

    #[test]
    fn missing_space_stops_early() {
        let err = parse("2023-05-14T19:32:11Z").unwrap_err();
        assert!(matches!(
            err.kind,
            DateErrorKind::MissingDelimiter { field: "day", .. }
        ));
        assert_eq!(err.progress, 0);
    }
}
